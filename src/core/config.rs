//! # Group configuration.
//!
//! Provides [`GroupConfig`], the settings a [`Group`](crate::Group) is built with.
//!
//! Config is used in two ways:
//! 1. **Direct**: `Group::with_config(&parent, config)`
//! 2. **Builder**: `Group::builder().abort_on_error(false).build(&parent)`

use crate::error::MatchMode;

/// Settings for one group.
///
/// ## Field semantics
/// - `abort_on_error`: cancel the group's context as soon as the first error is collected
/// - `match_mode`: matching policy of the [`GroupErrors`](crate::GroupErrors) returned by `wait`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupConfig {
    /// Cancel sibling operations on the first collected error.
    ///
    /// With `false`, operations run to natural completion regardless of
    /// their siblings' failures.
    pub abort_on_error: bool,

    /// Cause-matching policy of the returned aggregate.
    pub match_mode: MatchMode,
}

impl Default for GroupConfig {
    /// Default configuration:
    ///
    /// - `abort_on_error = true`
    /// - `match_mode = MatchMode::First` (matches the error that started an abort cascade)
    fn default() -> Self {
        Self {
            abort_on_error: true,
            match_mode: MatchMode::First,
        }
    }
}
