//! # Event subscribers.
//!
//! Observers plug into the runtime through [`Subscribe`]. The [`SubscriberSet`]
//! gives each one its own bounded queue and worker, so a slow or panicking
//! subscriber never stalls the listeners or its siblings.
//!
//! ```text
//!   Listener ── publish(Event) ──► Bus ──► Supervisor listener ──► SubscriberSet::emit
//!                                                            ┌─────────┼─────────┐
//!                                                            ▼         ▼         ▼
//!                                                        LogWriter  metrics   custom
//! ```
//!
//! [`LogWriter`] turns events into `tracing` records and is installed by default.

mod log;
mod subscribe;
mod subscriber_set;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
