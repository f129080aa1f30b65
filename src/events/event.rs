//! # Lifecycle events emitted by a group.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Operation events**: one operation's flow (launched, succeeded, failed, panicked)
//! - **Group events**: the group as a whole (abort requested, wait requested, closed)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! operation name, a reason, and counters.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use opgroup::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::OpFailed)
//!     .with_op("fetch")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::OpFailed);
//! assert_eq!(ev.op.as_deref(), Some("fetch"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of group events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Operation events ===
    /// Operation was handed to the group.
    ///
    /// Sets:
    /// - `op`: operation name
    /// - `count`: operations pending after this launch
    OpLaunched,

    /// Operation returned `Ok(())`.
    ///
    /// Sets:
    /// - `op`: operation name
    OpSucceeded,

    /// Operation returned an error (it will be collected).
    ///
    /// Sets:
    /// - `op`: operation name
    /// - `reason`: error message
    OpFailed,

    /// Operation panicked; the panic is re-raised by `Group::wait`.
    ///
    /// Sets:
    /// - `op`: operation name
    /// - `reason`: panic message
    OpPanicked,

    // === Group events ===
    /// A collected error cancelled the group's context.
    ///
    /// Sets:
    /// - `op`: operation whose error triggered the abort
    /// - `reason`: error message
    AbortRequested,

    /// `Group::wait` was called; no further launches are accepted.
    ///
    /// Sets:
    /// - `count`: operations still pending
    WaitRequested,

    /// All operations finished and their errors were collected.
    ///
    /// Sets:
    /// - `count`: number of collected errors
    GroupClosed,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::OpLaunched => "launched",
            EventKind::OpSucceeded => "succeeded",
            EventKind::OpFailed => "failed",
            EventKind::OpPanicked => "panicked",
            EventKind::AbortRequested => "abort-requested",
            EventKind::WaitRequested => "wait-requested",
            EventKind::GroupClosed => "closed",
        }
    }
}

/// Group event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the operation, if applicable.
    pub op: Option<Arc<str>>,
    /// Human-readable reason (error or panic message).
    pub reason: Option<Arc<str>>,
    /// Counter whose meaning depends on `kind`.
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            op: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches an operation name.
    #[inline]
    pub fn with_op(mut self, op: impl Into<Arc<str>>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a counter (saturates at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    #[inline]
    pub fn is_op_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::OpLaunched
                | EventKind::OpSucceeded
                | EventKind::OpFailed
                | EventKind::OpPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::OpLaunched);
        let b = Event::new(EventKind::OpLaunched);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_count_saturates() {
        let ev = Event::new(EventKind::GroupClosed).with_count(usize::MAX);
        assert_eq!(ev.count, Some(u32::MAX));
        assert!(!ev.is_op_event());
    }
}
