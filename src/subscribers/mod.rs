//! # Event subscribers for groups.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! used by every group, and (feature `logging`) the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Group / runner / drain ── emit(Event) ──► SubscriberSet
//!                                              │
//!                                   ┌──────────┼──────────┐
//!                                   ▼          ▼          ▼
//!                               LogWriter   Metrics    Custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
