//! # Channel bindings.
//!
//! A [`ChannelBinding`] pairs a subscription channel with the [`Category`] its
//! records are written under. The set is fixed before the supervisor starts.
//!
//! ## Rules
//! - at least one binding;
//! - every channel name non-blank;
//! - one binding per category;
//! - one category per channel.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigurationFault;
use crate::records::Category;

/// Static association between a channel name and a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    channel: Arc<str>,
    category: Category,
}

impl ChannelBinding {
    /// Creates a binding; validity is checked by [`validate_bindings`].
    pub fn new(channel: impl Into<Arc<str>>, category: Category) -> Self {
        Self {
            channel: channel.into(),
            category,
        }
    }

    /// Subscription channel name.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Shared handle to the channel name.
    pub fn channel_arc(&self) -> Arc<str> {
        Arc::clone(&self.channel)
    }

    /// Category written for records from this channel.
    pub fn category(&self) -> Category {
        self.category
    }
}

/// Checks the binding set against the rules above.
pub fn validate_bindings(bindings: &[ChannelBinding]) -> Result<(), ConfigurationFault> {
    if bindings.is_empty() {
        return Err(ConfigurationFault::Empty);
    }

    let mut categories = Vec::with_capacity(bindings.len());
    let mut channels: HashMap<&str, Category> = HashMap::with_capacity(bindings.len());

    for b in bindings {
        if b.channel.trim().is_empty() {
            return Err(ConfigurationFault::EmptyChannel {
                category: b.category,
            });
        }
        if categories.contains(&b.category) {
            return Err(ConfigurationFault::DuplicateCategory {
                category: b.category,
            });
        }
        categories.push(b.category);

        if let Some(first) = channels.insert(b.channel(), b.category) {
            return Err(ConfigurationFault::DuplicateChannel {
                channel: b.channel().to_string(),
                first,
                second: b.category,
            });
        }
    }
    Ok(())
}
