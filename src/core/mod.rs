//! Runtime core: groups and their lifecycle.
//!
//! The public API from this module is [`Group`] with its configuration and
//! builder.
//!
//! Internal modules:
//! - [`runner`]: runs one operation under panic isolation and publishes its outcome;
//! - [`collector`]: drains operation errors and cancels the group on the first one;
//! - [`group`]: launch, wait-group and finalization;
//! - [`config`] / [`builder`]: group settings.

mod builder;
mod collector;
mod config;
mod group;
mod runner;

pub use builder::GroupBuilder;
pub use config::GroupConfig;
pub use group::{Group, GroupState};
