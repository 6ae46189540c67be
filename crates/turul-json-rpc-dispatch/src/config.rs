//! Configuration types for the dispatcher

use serde::{Deserialize, Serialize};

/// When a request counts as a notification (no response is produced)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPolicy {
    /// Suppress the response only when the request has no `id` member
    #[default]
    Presence,
    /// Also suppress when `id` is falsy (`null`, `0`, `""`, `false`, ...)
    ///
    /// Only suppression follows the truthiness rule. A truthy `id` that is not
    /// a string or integer (`1.5`, `[1]`, `{"a": 1}`) still fails envelope
    /// validation and is answered with `"id": null`; the raw value is never
    /// echoed.
    Truthy,
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Response suppression rule
    pub notification_policy: NotificationPolicy,

    /// Largest accepted batch; `None` means unbounded
    pub max_batch_size: Option<usize>,

    /// Turn handler panics into `Internal error` responses
    pub catch_panics: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            notification_policy: NotificationPolicy::Presence,
            max_batch_size: None,
            catch_panics: true,
        }
    }
}
