//! # Run a single launched operation.
//!
//! Awaits one operation future under panic isolation and reports the outcome.
//!
//! ## Outcome flow
//!
//! ```text
//! Success:
//!   fut → Ok(())     → publish OpSucceeded
//!
//! Failure:
//!   fut → Err(cause) → OpError{name, cause} → publish OpFailed → intake
//!
//! Panic:
//!   fut → unwind     → publish OpPanicked → intake (payload kept for Group::wait)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event
//! - Sends at most one message to the intake channel
//! - Completion is signalled by the surrounding tracker when this future ends,
//!   whatever the outcome

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use super::collector::Intake;
use crate::{
    error::OpError,
    events::{Event, EventKind},
    guard,
    ops::BoxOpFuture,
    subscribers::SubscriberSet,
};

/// Runs `fut` to completion and forwards its error or panic to the collector.
pub(crate) async fn run_op(
    name: Arc<str>,
    fut: BoxOpFuture,
    intake: mpsc::UnboundedSender<Intake>,
    events: Arc<SubscriberSet>,
) {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {
            tracing::trace!(op = %name, "operation succeeded");
            publish_succeeded(&events, &name);
        }
        Ok(Err(cause)) => {
            let err = OpError::new(name, cause);
            tracing::debug!(op = %err.name(), error = %err.cause(), "operation failed");
            publish_failed(&events, &err);
            let _ = intake.send(Intake::Failed(err));
        }
        Err(payload) => {
            let info = guard::describe(&*payload);
            tracing::error!(op = %name, panic = %info, "operation panicked");
            publish_panicked(&events, &name, info);
            let _ = intake.send(Intake::Panicked { name, payload });
        }
    }
}

/// Publishes `OpSucceeded`.
fn publish_succeeded(events: &SubscriberSet, name: &Arc<str>) {
    events.emit(Event::new(EventKind::OpSucceeded).with_op(Arc::clone(name)));
}

/// Publishes `OpFailed` with the error message.
fn publish_failed(events: &SubscriberSet, err: &OpError) {
    events.emit(
        Event::new(EventKind::OpFailed)
            .with_op(err.name())
            .with_reason(err.cause().to_string()),
    );
}

/// Publishes `OpPanicked` with the panic message.
fn publish_panicked(events: &SubscriberSet, name: &Arc<str>, info: String) {
    events.emit(
        Event::new(EventKind::OpPanicked)
            .with_op(Arc::clone(name))
            .with_reason(info),
    );
}
