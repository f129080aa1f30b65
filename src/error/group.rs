//! # Collected errors of a group.
//!
//! [`GroupErrors`] holds every [`OpError`] a group collected, in the order the
//! errors arrived (completion order, not launch order). Its [`MatchMode`]
//! decides which causes are visible to cause matching:
//!
//! | mode    | Is-style (`has_cause`)  | As-style (`find_cause`)                    | `unwrap_cause` |
//! |---------|-------------------------|--------------------------------------------|----------------|
//! | `None`  | never                   | `GroupErrors` itself or `causes[0]` only   | `None`         |
//! | `First` | `causes[0]` chain       | `causes[0]` chain                          | `causes[0]`    |
//! | `Any`   | any cause chain         | first cause chain that matches             | `causes[0]`    |

use std::error::Error as StdError;
use std::fmt;

use super::chain::{self, Probe};
use super::OpError;

/// Policy for matching causes through a [`GroupErrors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Causes are hidden: Is-style matching always fails and As-style
    /// matching only sees the aggregate and its representative [`OpError`].
    None,
    /// Any collected cause can satisfy a match.
    Any,
    /// Only the first collected cause (the one that usually triggered the
    /// abort cascade) can satisfy a match.
    #[default]
    First,
}

impl MatchMode {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            MatchMode::None => "match_none",
            MatchMode::Any => "match_any",
            MatchMode::First => "match_first",
        }
    }
}

/// # Every error returned by the operations of one group.
///
/// A group only builds this when at least one operation failed. Building one
/// by hand with no causes is allowed, but [`unwrap_cause`](Self::unwrap_cause)
/// panics on it.
///
/// # Example
/// ```
/// use opgroup::{Canceled, ErrorChain, GroupErrors, MatchMode, OpError};
///
/// let errs = GroupErrors::new(
///     MatchMode::First,
///     vec![OpError::new("fetch", Canceled), OpError::new("parse", Canceled)],
/// );
/// assert_eq!(
///     errs.to_string(),
///     "2 errors returned. first: error during 'fetch': context canceled"
/// );
/// assert!(errs.has_cause(&Canceled));
/// assert_eq!(errs.find_cause::<OpError>().map(OpError::name), Some("fetch"));
/// ```
#[derive(Debug)]
pub struct GroupErrors {
    match_mode: MatchMode,
    causes: Vec<OpError>,
}

impl GroupErrors {
    /// Creates a new aggregate from collected causes.
    pub fn new(match_mode: MatchMode, causes: Vec<OpError>) -> Self {
        Self { match_mode, causes }
    }

    /// Matching policy this aggregate was built with.
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// All causes, in arrival order.
    pub fn causes(&self) -> &[OpError] {
        &self.causes
    }

    /// Number of collected causes.
    pub fn len(&self) -> usize {
        self.causes.len()
    }

    /// `true` if no cause was collected.
    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    /// Iterates over the causes in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, OpError> {
        self.causes.iter()
    }

    /// Consumes the aggregate and returns its causes.
    pub fn into_causes(self) -> Vec<OpError> {
        self.causes
    }

    /// Returns the representative cause.
    ///
    /// `None` under [`MatchMode::None`], `causes[0]` otherwise.
    ///
    /// # Panics
    /// Panics if the aggregate holds no causes.
    pub fn unwrap_cause(&self) -> Option<&OpError> {
        let Some(first) = self.causes.first() else {
            panic!("unwrap_cause called on GroupErrors with no causes");
        };
        match self.match_mode {
            MatchMode::None => None,
            MatchMode::Any | MatchMode::First => Some(first),
        }
    }

    /// Continues a chain walk that reached this aggregate.
    pub(crate) fn walk_causes<'a>(
        &'a self,
        probe: Probe,
        visit: &mut dyn FnMut(&'a (dyn StdError + 'static)) -> bool,
    ) -> Option<&'a (dyn StdError + 'static)> {
        match self.match_mode {
            MatchMode::None => match probe {
                Probe::Value => None,
                Probe::Shape => {
                    let first: &'a (dyn StdError + 'static) = self.causes.first()?;
                    visit(first).then_some(first)
                }
            },
            MatchMode::First => chain::walk(self.causes.first()?, probe, visit),
            MatchMode::Any => {
                for cause in &self.causes {
                    if let Some(hit) = chain::walk(cause, probe, &mut *visit) {
                        return Some(hit);
                    }
                }
                None
            }
        }
    }
}

impl<'a> IntoIterator for &'a GroupErrors {
    type Item = &'a OpError;
    type IntoIter = std::slice::Iter<'a, OpError>;

    fn into_iter(self) -> Self::IntoIter {
        self.causes.iter()
    }
}

impl fmt::Display for GroupErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.causes.first() {
            Some(first) => write!(f, "{} errors returned. first: {first}", self.causes.len()),
            None => f.write_str("0 errors returned"),
        }
    }
}

impl StdError for GroupErrors {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.match_mode {
            MatchMode::None => None,
            MatchMode::Any | MatchMode::First => {
                self.causes.first().map(|c| c as &(dyn StdError + 'static))
            }
        }
    }
}
