//! # Operation trait.
//!
//! An [`Operation`] is a named unit of async work that receives the group's
//! derived [`CancellationToken`] and returns `Ok(())` or an error.
//! The common handle type is [`OpRef`], an `Arc<dyn Operation>` that can be
//! launched into any number of groups.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// Name given to operations launched without one.
pub const DEFAULT_OP_NAME: &str = "[ROUTINE]";

/// Boxed future returned by an operation.
pub type BoxOpFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'static>>;

/// Shared handle to an operation.
pub type OpRef = Arc<dyn Operation>;

/// # Asynchronous, cancelable operation.
///
/// Implementors should watch `ctx` and return promptly (usually with
/// [`Canceled`](crate::Canceled)) once it is cancelled.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use opgroup::{BoxError, Canceled, Operation};
///
/// struct Poll;
///
/// #[async_trait]
/// impl Operation for Poll {
///     fn name(&self) -> &str { "poll" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), BoxError> {
///         if ctx.is_cancelled() {
///             return Err(Canceled.into());
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Name recorded in [`OpError`](crate::OpError) when the operation fails.
    fn name(&self) -> &str {
        DEFAULT_OP_NAME
    }

    /// Runs the operation to completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), BoxError>;
}
