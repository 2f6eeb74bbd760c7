#![forbid(unsafe_code)]

//! Store configuration.

/// When a new subscriber hears about the store for the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscribePolicy {
    /// Only on the next write.
    #[default]
    OnNextWrite,
    /// Immediately inside `subscribe`, with `(current, current)`, and then on
    /// every write.
    Immediate,
}

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Whether `subscribe` calls the new callback right away.
    pub subscribe_policy: SubscribePolicy,
    /// Name attached to log events from this store.
    pub label: Option<String>,
}

impl StoreConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subscribe_policy(mut self, policy: SubscribePolicy) -> Self {
        self.subscribe_policy = policy;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for log output, `"store"` when unset.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("store")
    }
}
