//! # Cause-chain matching.
//!
//! Errors form a singly linked chain through [`std::error::Error::source`].
//! The helpers here walk that chain looking for a target:
//!
//! - [`has_cause`] - some link equals a target value (Is-style).
//! - [`any_cause`] - some link satisfies a predicate (Is-style).
//! - [`find_cause`] - first link of a given concrete type (As-style).
//!
//! A [`GroupErrors`] link does not simply forward to its `source()`: it fans
//! out according to its [`MatchMode`](crate::MatchMode).
//!
//! ```text
//! walk(err):
//!   visit(err)?            ─► hit, stop
//!   err is GroupErrors     ─► None  : Is = miss; As = causes[0] only (no descent)
//!                             First : walk(causes[0])
//!                             Any   : walk(causes[0]) || walk(causes[1]) || ...
//!   otherwise              ─► walk(err.source())
//! ```

use std::error::Error as StdError;

use super::GroupErrors;

/// Which kind of query drives a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// Value / predicate matching (Is-style).
    Value,
    /// Shape matching (As-style).
    Shape,
}

/// Visits `err` and its causes until `visit` returns `true`.
///
/// Returns the link that matched.
pub(crate) fn walk<'a>(
    err: &'a (dyn StdError + 'static),
    probe: Probe,
    visit: &mut dyn FnMut(&'a (dyn StdError + 'static)) -> bool,
) -> Option<&'a (dyn StdError + 'static)> {
    let mut current = Some(err);
    while let Some(link) = current {
        if visit(link) {
            return Some(link);
        }
        if let Some(group) = link.downcast_ref::<GroupErrors>() {
            return group.walk_causes(probe, visit);
        }
        current = link.source();
    }
    None
}

/// Reports whether `err`, or any cause visible from it, equals `target`.
///
/// # Example
/// ```
/// use opgroup::{has_cause, Canceled, OpError};
///
/// let err = OpError::new("op", Canceled);
/// assert!(has_cause(&err, &Canceled));
/// ```
pub fn has_cause<E>(err: &(dyn StdError + 'static), target: &E) -> bool
where
    E: StdError + PartialEq + 'static,
{
    walk(err, Probe::Value, &mut |link| {
        link.downcast_ref::<E>().is_some_and(|e| e == target)
    })
    .is_some()
}

/// Reports whether any cause visible from `err` satisfies `pred`.
pub fn any_cause<F>(err: &(dyn StdError + 'static), mut pred: F) -> bool
where
    F: FnMut(&(dyn StdError + 'static)) -> bool,
{
    walk(err, Probe::Value, &mut |link| pred(link)).is_some()
}

/// Returns the first cause visible from `err` whose concrete type is `E`.
pub fn find_cause<'a, E>(err: &'a (dyn StdError + 'static)) -> Option<&'a E>
where
    E: StdError + 'static,
{
    walk(err, Probe::Shape, &mut |link| link.is::<E>()).and_then(|link| link.downcast_ref::<E>())
}

/// Cause matching as methods on any concrete error type.
///
/// For trait objects (`&dyn Error`, `BoxError`) use the free functions
/// [`has_cause`], [`any_cause`] and [`find_cause`].
pub trait ErrorChain {
    /// See [`has_cause`].
    fn has_cause<E>(&self, target: &E) -> bool
    where
        E: StdError + PartialEq + 'static;

    /// See [`any_cause`].
    fn any_cause<F>(&self, pred: F) -> bool
    where
        F: FnMut(&(dyn StdError + 'static)) -> bool;

    /// See [`find_cause`].
    fn find_cause<E>(&self) -> Option<&E>
    where
        E: StdError + 'static;
}

impl<T: StdError + 'static> ErrorChain for T {
    fn has_cause<E>(&self, target: &E) -> bool
    where
        E: StdError + PartialEq + 'static,
    {
        has_cause(self, target)
    }

    fn any_cause<F>(&self, pred: F) -> bool
    where
        F: FnMut(&(dyn StdError + 'static)) -> bool,
    {
        any_cause(self, pred)
    }

    fn find_cause<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        find_cause(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, Canceled, MatchMode, OpError};
    use thiserror::Error;

    #[derive(Error, Debug, PartialEq)]
    enum Io {
        #[error("EOF")]
        Eof,
        #[error("io: read/write on closed pipe")]
        ClosedPipe,
    }

    #[derive(Error, Debug)]
    #[error("wrapping: {inner}")]
    struct Wrapper {
        #[source]
        inner: BoxError,
    }

    #[test]
    fn test_walks_plain_source_chain() {
        let err = Wrapper {
            inner: Box::new(OpError::new("op", Io::Eof)),
        };
        assert!(has_cause(&err, &Io::Eof));
        assert!(!has_cause(&err, &Io::ClosedPipe));
        assert_eq!(find_cause::<OpError>(&err).map(OpError::name), Some("op"));
    }

    fn eof_of(err: &OpError) -> Option<&Io> {
        find_cause::<Io>(err)
    }

    #[test]
    fn test_found_cause_borrows_from_input() {
        let err = OpError::new("op", Io::Eof);
        let found = eof_of(&err);
        assert_eq!(found, Some(&Io::Eof));
    }

    #[test]
    fn test_any_cause_predicate() {
        let err = OpError::new("op", Canceled);
        assert!(any_cause(&err, |e| e.to_string() == "context canceled"));
        assert!(!any_cause(&err, |e| e.is::<Io>()));
    }

    #[test]
    fn test_extension_trait_matches_free_functions() {
        let err = OpError::new("op", Io::ClosedPipe);
        assert!(err.has_cause(&Io::ClosedPipe));
        assert!(err.find_cause::<Io>().is_some());
        assert!(err.any_cause(|e| e.is::<OpError>()));
    }

    #[test]
    fn test_descends_into_nested_groups() {
        let inner = GroupErrors::new(
            MatchMode::Any,
            vec![OpError::new("a", Io::ClosedPipe), OpError::new("b", Io::Eof)],
        );
        let outer = GroupErrors::new(MatchMode::First, vec![OpError::new("nested", inner)]);

        assert!(outer.has_cause(&Io::Eof));
        assert!(outer.has_cause(&Io::ClosedPipe));
        assert_eq!(outer.find_cause::<OpError>().map(OpError::name), Some("nested"));
    }

    #[test]
    fn test_sealed_nested_group_stops_value_matching() {
        let inner = GroupErrors::new(MatchMode::None, vec![OpError::new("a", Io::Eof)]);
        let outer = GroupErrors::new(MatchMode::Any, vec![OpError::new("nested", inner)]);

        assert!(!outer.has_cause(&Io::Eof));
        assert!(outer.find_cause::<GroupErrors>().is_some());
    }
}
