//! # LogWriter: event logger
//!
//! A minimal subscriber that forwards incoming [`Event`]s to `tracing`.
//! Use it for tests or demos; install any `tracing` subscriber to see the output.
//!
//! ## Example output
//! ```text
//! INFO opgroup: [launched] op="fetch" pending=3
//! WARN opgroup: [failed] op="fetch" err="connection refused"
//! WARN opgroup: [abort-requested] op="fetch" err="connection refused"
//! INFO opgroup: [wait-requested] pending=2
//! INFO opgroup: [closed] errors=3
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let label = e.kind.as_label();
        let op = e.op.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let count = e.count.unwrap_or(0);

        match e.kind {
            EventKind::OpLaunched => {
                tracing::info!(target: "opgroup", "[{label}] op={op:?} pending={count}");
            }
            EventKind::OpSucceeded => {
                tracing::info!(target: "opgroup", "[{label}] op={op:?}");
            }
            EventKind::OpFailed | EventKind::AbortRequested => {
                tracing::warn!(target: "opgroup", "[{label}] op={op:?} err={reason:?}");
            }
            EventKind::OpPanicked => {
                tracing::error!(target: "opgroup", "[{label}] op={op:?} panic={reason:?}");
            }
            EventKind::WaitRequested => {
                tracing::info!(target: "opgroup", "[{label}] pending={count}");
            }
            EventKind::GroupClosed => {
                tracing::info!(target: "opgroup", "[{label}] errors={count}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
