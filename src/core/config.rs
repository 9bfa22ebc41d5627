//! # Runtime configuration.
//!
//! Provides [`Config`], the supervisor's runtime settings. Usually built from
//! [`Settings`](crate::Settings) via [`Settings::runtime`](crate::Settings::runtime).
//!
//! ## Sentinel values
//! - `grace = 0s` → abort listeners right after cancellation
//! - `bus_capacity`, `inbox_capacity` → clamped to a minimum of 1

use std::time::Duration;

/// Runtime configuration for the supervisor.
///
/// ## Field semantics
/// - `grace`: maximum wait for listeners to close after the run is cancelled
/// - `bus_capacity`: event bus ring buffer size
/// - `inbox_capacity`: per-subscription buffer for pumping sources
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum time to wait for listeners after cancellation.
    ///
    /// Listeners still running afterwards are aborted and reported as stuck in
    /// [`RelayError::GraceExceeded`](crate::RelayError::GraceExceeded).
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Payloads buffered per subscription before the source waits.
    pub inbox_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns an inbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn inbox_capacity_clamped(&self) -> usize {
        self.inbox_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `inbox_capacity = 256`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            inbox_capacity: 256,
        }
    }
}
