use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::config::GroupConfig;
use super::group::Group;
use crate::error::MatchMode;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Group`] with optional settings.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use opgroup::{Group, MatchMode};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let parent = CancellationToken::new();
/// let group = Group::builder()
///     .abort_on_error(false)
///     .match_mode(MatchMode::Any)
///     .build(&parent);
///
/// assert!(!group.config().abort_on_error);
/// assert!(group.wait().await.is_ok());
/// # }
/// ```
#[derive(Default)]
pub struct GroupBuilder {
    cfg: GroupConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl GroupBuilder {
    /// Creates a new builder starting from the given configuration.
    pub fn new(cfg: GroupConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Whether the first collected error cancels the group's context.
    ///
    /// Default: `true`.
    pub fn abort_on_error(mut self, abort: bool) -> Self {
        self.cfg.abort_on_error = abort;
        self
    }

    /// Matching policy of the [`GroupErrors`](crate::GroupErrors) returned by `wait`.
    ///
    /// Default: [`MatchMode::First`].
    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.cfg.match_mode = mode;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive group events through dedicated workers with bounded
    /// queues. Every event has been delivered when `wait` returns.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the group as a child of `parent`.
    ///
    /// Must be called inside a Tokio runtime: the error collector and the
    /// subscriber workers are spawned here.
    pub fn build(self, parent: &CancellationToken) -> Group {
        let events = if self.subscribers.is_empty() {
            SubscriberSet::empty()
        } else {
            SubscriberSet::new(self.subscribers)
        };
        Group::new_internal(parent, self.cfg, events)
    }
}
