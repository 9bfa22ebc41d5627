//! # Log records and the channel bindings that route them.
//!
//! - [`Category`] severity category selecting a destination
//! - [`LogRecord`] one decoded log event
//! - [`decode`] payload → record
//! - [`ChannelBinding`] channel name → category, validated by [`validate_bindings`]

mod binding;
mod decode;
mod record;

pub use binding::{ChannelBinding, validate_bindings};
pub use decode::decode;
pub use record::{Category, LogRecord};
