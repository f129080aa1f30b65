//! # Error collection for one group.
//!
//! Spawned when the group is built, before any operation is launched.
//!
//! ```text
//! collector task
//!   ├─► spawn drain task: intake ─► causes.push(err) ─► token.cancel() (abort_on_error)
//!   ├─► tracker.wait()     resolves once Group::wait closed the tracker
//!   │                      and every launched operation finished
//!   ├─► intake is closed   (the group's sender went away in Group::wait,
//!   │                      operation senders went away with the operations)
//!   └─► drain.await ─► Collected { causes, panic } ─► Group::wait
//! ```
//!
//! ## Rules
//! - The drain task is the only writer of the cause list; it hands the list
//!   over by value when the intake closes.
//! - Causes keep arrival order.
//! - A panicking operation always cancels the group; the first panic is kept.

use std::any::Any;
use std::panic;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::{
    error::OpError,
    events::{Event, EventKind},
    subscribers::SubscriberSet,
};

/// Message sent by a finished operation.
pub(crate) enum Intake {
    /// Operation returned an error.
    Failed(OpError),
    /// Operation panicked.
    Panicked {
        name: Arc<str>,
        payload: Box<dyn Any + Send + 'static>,
    },
}

/// Everything the drain gathered.
#[derive(Default)]
pub(crate) struct Collected {
    /// Operation errors in arrival order.
    pub causes: Vec<OpError>,
    /// First panic raised by an operation.
    pub panic: Option<(Arc<str>, Box<dyn Any + Send + 'static>)>,
}

/// Spawns the collector task.
pub(crate) fn spawn(
    intake: mpsc::UnboundedReceiver<Intake>,
    tracker: TaskTracker,
    token: CancellationToken,
    abort_on_error: bool,
    events: Arc<SubscriberSet>,
) -> JoinHandle<Collected> {
    tokio::spawn(async move {
        let drain = tokio::spawn(drain(intake, token, abort_on_error, events));

        tracker.wait().await;

        match drain.await {
            Ok(collected) => collected,
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(err) => {
                tracing::warn!(error = %err, "error drain cancelled by runtime shutdown");
                Collected::default()
            }
        }
    })
}

/// Receives operation outcomes until every sender is gone.
async fn drain(
    mut intake: mpsc::UnboundedReceiver<Intake>,
    token: CancellationToken,
    abort_on_error: bool,
    events: Arc<SubscriberSet>,
) -> Collected {
    let mut collected = Collected::default();

    while let Some(msg) = intake.recv().await {
        match msg {
            Intake::Failed(err) => {
                if abort_on_error {
                    if !token.is_cancelled() {
                        tracing::debug!(op = %err.name(), "error collected; cancelling group");
                        events.emit(
                            Event::new(EventKind::AbortRequested)
                                .with_op(err.name())
                                .with_reason(err.cause().to_string()),
                        );
                    }
                    token.cancel();
                }
                collected.causes.push(err);
            }
            Intake::Panicked { name, payload } => {
                token.cancel();
                if collected.panic.is_none() {
                    collected.panic = Some((name, payload));
                }
            }
        }
    }

    collected
}
