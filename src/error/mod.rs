//! Error types produced by groups and their operations.
//!
//! - [`OpError`] - one failed operation, tagged with the operation's name.
//! - [`GroupErrors`] - every [`OpError`] a [`Group`](crate::Group) collected, in arrival order.
//! - [`MatchMode`] - how a [`GroupErrors`] answers cause-matching queries.
//! - [`Canceled`] - returned by operations that stop because their context was cancelled.
//!
//! Cause matching ([`has_cause`], [`any_cause`], [`find_cause`], [`ErrorChain`]) walks `std::error::Error::source` links and
//! lets every [`GroupErrors`] on the way decide which of its causes are visible.

pub(crate) mod chain;
mod group;
mod op;

use thiserror::Error;

pub use chain::{ErrorChain, any_cause, find_cause, has_cause};
pub use group::{GroupErrors, MatchMode};
pub use op::OpError;

/// Type-erased error returned by operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Context cancellation error.
///
/// Operations return this when they observe that their
/// [`CancellationToken`](tokio_util::sync::CancellationToken) was cancelled.
///
/// # Example
/// ```
/// use opgroup::Canceled;
///
/// assert_eq!(Canceled.to_string(), "context canceled");
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("context canceled")]
pub struct Canceled;

impl Canceled {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "context_canceled"
    }
}
