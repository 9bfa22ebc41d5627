//! Runtime core: listeners, orchestration and lifecycle.
//!
//! The public API from this module is [`Supervisor`] (built with
//! [`SupervisorBuilder`]), its runtime [`Config`], the per-channel
//! [`ListenerTask`] and the [`ListenerState`] it reports.
//!
//! Internal modules:
//! - [`dispatch`]: decodes and writes one message, publishing its outcome;
//! - [`listener`]: owns one subscription and loops over its messages;
//! - [`supervisor`]: spawns listeners, aggregates faults, handles shutdown;
//! - [`tracker`]: follows listener states from the event stream;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod dispatch;
mod listener;
mod shutdown;
mod supervisor;
mod tracker;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use dispatch::dispatch_once;
pub use listener::ListenerTask;
pub use supervisor::Supervisor;
pub use tracker::{ListenerState, StateTracker};
