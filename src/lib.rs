//! # opgroup
//!
//! **opgroup** runs a set of fallible async operations concurrently, waits for
//! all of them and returns their errors as one structured aggregate.
//!
//! Each group derives a cancellable context from the caller's
//! [`CancellationToken`](tokio_util::sync::CancellationToken). By default the
//! first collected error cancels that context so siblings can stop early.
//! The returned [`GroupErrors`] keeps every cause, labelled with the name of
//! the operation that produced it, and supports "is this error / does it
//! contain an error of this type" queries through nested groups.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        caller token
//!             │ child_token()
//!             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Group                                                            │
//! │  - token       (derived context, cancelled on abort / wait / drop)│
//! │  - TaskTracker (wait-group)                                       │
//! │  - collector   (intake channel + drain task)                      │
//! │  - SubscriberSet (fans out events to user subscribers)            │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ run_op   │       │ run_op   │       │ run_op   │
//!   │ "fetch"  │       │"[ROUTINE]│       │ "store"  │
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ Err(cause)       │ Ok               │ Err(cause)
//!        ▼                  │                  ▼
//!   OpError{name, cause} ───┴──► intake ◄── OpError{name, cause}
//!                                  │
//!                                  ▼
//!                     drain: causes.push(err)
//!                            token.cancel()  (abort_on_error)
//!                                  │
//!                                  ▼
//!               wait() ──► Err(GroupErrors { match_mode, causes })
//! ```
//!
//! ### Cause matching
//! ```text
//! GroupErrors (MatchMode::First) ──► causes[0]
//! GroupErrors (MatchMode::Any)   ──► causes[0], causes[1], ...
//! GroupErrors (MatchMode::None)  ──► opaque for value queries
//! OpError{name, cause}           ──► cause ──► cause.source() ──► ...
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Groups**        | Launch operations, wait for them, aggregate errors.              | [`Group`], [`GroupBuilder`], [`GroupConfig`] |
//! | **Errors**        | Named operation errors, aggregates, cause-chain queries.         | [`OpError`], [`GroupErrors`], [`ErrorChain`] |
//! | **Panic guard**   | Turn a panic into an ordinary error value.                       | [`catch_panic`], [`PanicError`]             |
//! | **Operations**    | Reusable named operations.                                       | [`Operation`], [`OpFn`], [`OpRef`]          |
//! | **Subscriber API**| Hook into group lifecycle events (logging, metrics, custom).     | [`Subscribe`], [`Event`]                    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::io;
//! use tokio_util::sync::CancellationToken;
//! use opgroup::{Canceled, ErrorChain, Group};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let parent = CancellationToken::new();
//!     let group = Group::new(&parent);
//!
//!     // Long-running workers that stop on cancellation.
//!     for _ in 0..4 {
//!         group.go(|ctx| async move {
//!             ctx.cancelled().await;
//!             Err(Canceled)
//!         });
//!     }
//!
//!     // The failure that aborts the group.
//!     group.go_named("failOp", |_ctx| async {
//!         Err(io::Error::from(io::ErrorKind::UnexpectedEof))
//!     });
//!
//!     let err = group.wait().await.unwrap_err();
//!     assert_eq!(err.len(), 5);
//!     assert_eq!(err.causes()[0].name(), "failOp");
//!     // MatchMode::First: only the error that started the abort is matched.
//!     assert!(!err.has_cause(&Canceled));
//!     assert!(err.find_cause::<io::Error>().is_some());
//! }
//! ```
mod core;
mod error;
mod events;
mod guard;
mod ops;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Group, GroupBuilder, GroupConfig, GroupState};
pub use error::{
    BoxError, Canceled, ErrorChain, GroupErrors, MatchMode, OpError, any_cause, find_cause,
    has_cause,
};
pub use events::{Event, EventKind};
pub use guard::{PanicError, PanicMessage, catch_panic, catch_panic_async};
pub use ops::{BoxOpFuture, DEFAULT_OP_NAME, OpFn, OpRef, Operation};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
