//! Group events: data model.
//!
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: `Group::go*`/`Group::spawn` (launched), the per-operation
//!   runner (succeeded/failed/panicked), the error drain (abort requested) and
//!   `Group::wait` (wait requested, closed).
//! - **Consumers**: [`SubscriberSet`](crate::SubscriberSet) workers, one per
//!   [`Subscribe`](crate::Subscribe) implementation.

mod event;

pub use event::{Event, EventKind};
