//! Error types used by the relay runtime, its listeners and collaborators.
//!
//! Per-message errors never leave a listener:
//! - [`DecodeError`] a payload could not be parsed into a [`LogRecord`](crate::LogRecord);
//! - [`WriteFault`] the sink rejected a record.
//!
//! [`SinkSetupError`] is raised when a sink cannot be built at startup.
//!
//! Task-level and startup errors surface from [`Supervisor::run`](crate::Supervisor::run):
//! - [`SubscriptionFault`] one channel's subscription could not be established;
//! - [`ConfigurationFault`] the binding set is unusable, nothing was started;
//! - [`AggregatedFault`] every subscription fault of one run, in termination order;
//! - [`RelayError`] the combined outcome returned to the host process.
//!
//! All types provide `as_label` for logs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::records::Category;

/// # Payload could not be decoded into a log record.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not a JSON object with the expected string fields.
    #[error("malformed payload {payload:?}: {source}")]
    Malformed {
        /// Offending payload (lossy UTF-8).
        payload: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Malformed { .. } => "decode_malformed",
        }
    }

    /// Returns the payload that failed to decode.
    pub fn payload(&self) -> &str {
        match self {
            DecodeError::Malformed { payload, .. } => payload,
        }
    }
}

/// # Sink rejected a record.
///
/// Non-fatal to the listener: logged and skipped, never retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WriteFault {
    /// Record reached the sink without a category tag.
    #[error("record {id:?} has no category tag")]
    Untagged {
        /// Record identifier.
        id: String,
    },

    /// No destination is configured for the category.
    #[error("no index configured for category {category}")]
    UnknownIndex {
        /// Category without a destination.
        category: Category,
    },

    /// The request never produced a response (connect, timeout, I/O).
    #[error("transport error: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The store answered with a non-success status.
    #[error("store rejected record with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the store.
        body: String,
    },

    /// The write was abandoned because the run was cancelled.
    #[error("write cancelled")]
    Canceled,
}

impl WriteFault {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WriteFault::Untagged { .. } => "write_untagged",
            WriteFault::UnknownIndex { .. } => "write_unknown_index",
            WriteFault::Transport { .. } => "write_transport",
            WriteFault::Rejected { .. } => "write_rejected",
            WriteFault::Canceled => "write_canceled",
        }
    }
}

/// # A sink could not be built from its settings.
///
/// Raised at startup, before any listener runs.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkSetupError {
    /// The configured host and port do not form a usable base URL.
    #[error("invalid store url {url:?}: {error}")]
    InvalidUrl {
        /// The URL as assembled from settings.
        url: String,
        /// The underlying parse error message.
        error: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {error}")]
    Client {
        /// The underlying error message.
        error: String,
    },
}

impl SinkSetupError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkSetupError::InvalidUrl { .. } => "sink_invalid_url",
            SinkSetupError::Client { .. } => "sink_client",
        }
    }
}

/// # Any failure while handling one message.
///
/// Published as an event by the listener; never propagated further.
#[derive(Error, Debug)]
pub enum MessageError {
    /// Decoding failed; nothing was dispatched.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Dispatch reached the sink and the sink failed.
    #[error(transparent)]
    Write(#[from] WriteFault),
}

/// # A channel's subscription failed unrecoverably.
///
/// Fatal to the one listener bound to that channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum SubscriptionFault {
    /// The source refused or failed the subscribe call.
    #[error("channel {channel:?}: subscribe failed: {error}")]
    Subscribe {
        /// Channel that could not be subscribed.
        channel: Arc<str>,
        /// The underlying error message.
        error: String,
    },

    /// The listener panicked outside of message processing.
    #[error("channel {channel:?}: listener panicked: {info}")]
    Panicked {
        /// Channel of the listener.
        channel: Arc<str>,
        /// Panic payload rendered as text.
        info: String,
    },
}

impl SubscriptionFault {
    /// Returns the channel that produced this fault.
    pub fn channel(&self) -> &str {
        match self {
            SubscriptionFault::Subscribe { channel, .. } => channel,
            SubscriptionFault::Panicked { channel, .. } => channel,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscriptionFault::Subscribe { .. } => "subscription_failed",
            SubscriptionFault::Panicked { .. } => "subscription_panicked",
        }
    }
}

/// # The binding set cannot be used.
///
/// Raised before any listener is spawned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationFault {
    /// No bindings at all.
    #[error("no channel bindings configured")]
    Empty,

    /// A category has no channel configured.
    #[error("no channel configured for category {category}")]
    MissingChannel {
        /// Category without a channel.
        category: Category,
    },

    /// A binding has an empty (or blank) channel name.
    #[error("channel name for category {category} is empty")]
    EmptyChannel {
        /// Category of the offending binding.
        category: Category,
    },

    /// Two bindings share a category.
    #[error("category {category} is bound more than once")]
    DuplicateCategory {
        /// Repeated category.
        category: Category,
    },

    /// Two categories are bound to the same channel.
    #[error("channel {channel:?} is bound to both {first} and {second}")]
    DuplicateChannel {
        /// Shared channel name.
        channel: String,
        /// Category bound first.
        first: Category,
        /// Category bound second.
        second: Category,
    },

    /// The settings source could not be read or parsed.
    #[error("invalid settings: {error}")]
    Settings {
        /// The underlying error message.
        error: String,
    },
}

impl ConfigurationFault {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigurationFault::Empty => "config_empty",
            ConfigurationFault::MissingChannel { .. } => "config_missing_channel",
            ConfigurationFault::EmptyChannel { .. } => "config_empty_channel",
            ConfigurationFault::DuplicateCategory { .. } => "config_duplicate_category",
            ConfigurationFault::DuplicateChannel { .. } => "config_duplicate_channel",
            ConfigurationFault::Settings { .. } => "config_settings",
        }
    }
}

impl From<figment::Error> for ConfigurationFault {
    fn from(err: figment::Error) -> Self {
        ConfigurationFault::Settings {
            error: err.to_string(),
        }
    }
}

/// Ordered collection of subscription faults from one run.
///
/// Faults are kept in the order their listeners terminated. Combining two
/// aggregates appends, so grouping never changes the result.
#[derive(Debug, Clone, Default)]
pub struct AggregatedFault {
    faults: Vec<SubscriptionFault>,
}

impl AggregatedFault {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one fault.
    pub fn push(&mut self, fault: SubscriptionFault) {
        self.faults.push(fault);
    }

    /// Appends all faults of `other`, preserving their order.
    pub fn extend(&mut self, other: AggregatedFault) {
        self.faults.extend(other.faults);
    }

    /// True when no fault was recorded.
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// Number of recorded faults.
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    /// Recorded faults in termination order.
    pub fn faults(&self) -> &[SubscriptionFault] {
        &self.faults
    }

    /// Channels that faulted, in termination order.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.faults.iter().map(SubscriptionFault::channel)
    }

    /// `Ok(())` when empty, otherwise the aggregate as [`RelayError::Listeners`].
    pub fn into_result(self) -> Result<(), RelayError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RelayError::Listeners(self))
        }
    }
}

impl fmt::Display for AggregatedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fault) in self.faults.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{fault}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedFault {}

impl FromIterator<SubscriptionFault> for AggregatedFault {
    fn from_iter<I: IntoIterator<Item = SubscriptionFault>>(iter: I) -> Self {
        Self {
            faults: iter.into_iter().collect(),
        }
    }
}

/// # Errors returned by [`Supervisor::run`](crate::Supervisor::run).
///
/// Any error here means at least one category is no longer being forwarded;
/// the host should restart or alert.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// The binding set was rejected before any listener started.
    #[error("configuration fault: {0}")]
    Configuration(#[from] ConfigurationFault),

    /// One or more listeners faulted.
    #[error("{count} listener(s) faulted: {0}", count = .0.len())]
    Listeners(AggregatedFault),

    /// Listeners did not stop within the grace period after cancellation.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Channels whose listeners had not reached a terminal state.
        stuck: Vec<String>,
        /// Faults collected before the timeout.
        faults: AggregatedFault,
    },
}

impl RelayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayError::Configuration(_) => "relay_configuration",
            RelayError::Listeners(_) => "relay_listeners_faulted",
            RelayError::GraceExceeded { .. } => "relay_grace_exceeded",
        }
    }

    /// Subscription faults carried by this error, if any.
    pub fn faults(&self) -> &[SubscriptionFault] {
        match self {
            RelayError::Configuration(_) => &[],
            RelayError::Listeners(agg) => agg.faults(),
            RelayError::GraceExceeded { faults, .. } => faults.faults(),
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribe_fault(channel: &str) -> SubscriptionFault {
        SubscriptionFault::Subscribe {
            channel: channel.into(),
            error: "refused".into(),
        }
    }

    #[test]
    fn aggregate_keeps_termination_order() {
        let mut agg = AggregatedFault::new();
        agg.push(subscribe_fault("logs:error"));
        agg.push(subscribe_fault("logs:info"));

        let channels: Vec<_> = agg.channels().collect();
        assert_eq!(channels, vec!["logs:error", "logs:info"]);
    }

    #[test]
    fn aggregate_extend_is_associative() {
        let a = || AggregatedFault::from_iter([subscribe_fault("a")]);
        let b = || AggregatedFault::from_iter([subscribe_fault("b")]);
        let c = || AggregatedFault::from_iter([subscribe_fault("c")]);

        let mut left = a();
        left.extend(b());
        left.extend(c());

        let mut bc = b();
        bc.extend(c());
        let mut right = a();
        right.extend(bc);

        assert_eq!(left.to_string(), right.to_string());
        assert_eq!(left.channels().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn aggregate_display_names_every_channel() {
        let agg = AggregatedFault::from_iter([subscribe_fault("x"), subscribe_fault("y")]);
        let text = RelayError::Listeners(agg).to_string();
        assert!(text.starts_with("2 listener(s) faulted"));
        assert!(text.contains("\"x\""));
        assert!(text.contains("\"y\""));
    }

    #[test]
    fn empty_aggregate_is_success() {
        assert!(AggregatedFault::new().into_result().is_ok());
    }

    #[test]
    fn panic_message_downcasts() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
