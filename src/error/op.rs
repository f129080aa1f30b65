use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use super::BoxError;

/// # A single failed operation.
///
/// Created by the group runner as soon as an operation returns `Err`.
/// The cause is always present and is exposed as the error's `source()`.
///
/// # Example
/// ```
/// use std::io;
/// use opgroup::OpError;
///
/// let err = OpError::new("read file", io::Error::new(io::ErrorKind::UnexpectedEof, "EOF"));
/// assert_eq!(err.to_string(), "error during 'read file': EOF");
/// assert_eq!(err.name(), "read file");
/// ```
#[derive(Error, Debug)]
#[error("error during '{name}': {cause}")]
pub struct OpError {
    name: Arc<str>,
    #[source]
    cause: BoxError,
}

impl OpError {
    /// Wraps `cause` as the failure of the operation called `name`.
    pub fn new(name: impl Into<Arc<str>>, cause: impl Into<BoxError>) -> Self {
        Self {
            name: name.into(),
            cause: cause.into(),
        }
    }

    /// Name the operation was launched with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error the operation returned.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.cause
    }

    /// Consumes the wrapper and returns the operation's error.
    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::chain::{find_cause, has_cause};
    use crate::error::Canceled;

    #[test]
    fn test_display_names_operation() {
        let err = OpError::new("read file", Canceled);
        assert_eq!(err.to_string(), "error during 'read file': context canceled");
    }

    #[test]
    fn test_source_is_cause() {
        let err = OpError::new("read file", Canceled);
        let source = err.source().expect("source");
        assert!(source.is::<Canceled>());
        assert!(has_cause(&err, &Canceled));
        assert!(find_cause::<Canceled>(&err).is_some());
    }

    #[test]
    fn test_into_cause_returns_original() {
        let err = OpError::new("op", Canceled);
        let cause = err.into_cause();
        assert!(cause.downcast_ref::<Canceled>().is_some());
    }
}
