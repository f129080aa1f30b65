//! # Panic guard: convert a panic into an ordinary error.
//!
//! [`catch_panic`] runs a fallible closure, [`catch_panic_async`] a fallible
//! future. A normal `Ok`/`Err` result passes through untouched; a panic is
//! intercepted and returned as a [`PanicError`].
//!
//! ## Payload conversion
//! ```text
//! payload is BoxError / Arc<dyn Error> / io::Error / OpError / GroupErrors / Canceled
//!     └─► becomes the recovered cause as-is
//! payload is &str / String / integer / float / bool / char
//!     └─► PanicMessage("<value>"), raw payload kept
//! anything else
//!     └─► PanicMessage("Box<dyn Any>"), raw payload kept
//! ```
//!
//! The guard captures a backtrace at the interception point. The process-wide
//! panic hook is left alone, so the default hook still reports the panic.
//!
//! ## Example
//! ```
//! use opgroup::{catch_panic, BoxError, PanicError};
//!
//! let res: Result<(), BoxError> = catch_panic(|| panic!("boom"));
//! let err = res.unwrap_err();
//! assert_eq!(err.to_string(), "panic recovered: boom");
//! assert!(err.downcast_ref::<PanicError>().is_some());
//! ```

use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use thiserror::Error;

use crate::error::{BoxError, Canceled, GroupErrors, OpError};

type Payload = Box<dyn Any + Send + 'static>;

/// Error built from a panic payload that was not itself an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PanicMessage(String);

impl PanicMessage {
    /// Stringified payload.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// # A recovered panic.
///
/// Displays as `panic recovered: <cause>` and exposes the recovered cause as
/// its `source()`, so cause matching still reaches an error that was passed
/// to `panic_any`.
pub struct PanicError {
    cause: BoxError,
    payload: Mutex<Option<Payload>>,
    stack_trace: String,
}

impl PanicError {
    fn from_payload(payload: Payload, stack_trace: String) -> Self {
        let (cause, payload) = match into_error(payload) {
            Ok(cause) => (cause, None),
            Err(payload) => {
                let message = PanicMessage(describe(&*payload));
                (Box::new(message) as BoxError, Some(payload))
            }
        };
        Self {
            cause,
            payload: Mutex::new(payload),
            stack_trace,
        }
    }

    /// The panic payload as an error: the payload itself when it was an
    /// error value, a [`PanicMessage`] otherwise.
    pub fn recovered_cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.cause
    }

    /// `true` when the payload was an error value and became the cause directly.
    pub fn recovered_error(&self) -> bool {
        self.cause.downcast_ref::<PanicMessage>().is_none()
    }

    /// Reports whether the retained raw payload has type `T`.
    ///
    /// Always `false` once the payload was taken, or when it was an error
    /// value (those live in [`recovered_cause`](Self::recovered_cause)).
    pub fn recovered_is<T: Any>(&self) -> bool {
        self.with_payload(|p| p.is::<T>()).unwrap_or(false)
    }

    /// Clones the retained raw payload out if it has type `T`.
    pub fn downcast_recovered<T: Any + Clone>(&self) -> Option<T> {
        self.with_payload(|p| p.downcast_ref::<T>().cloned()).flatten()
    }

    /// Takes the retained raw payload, e.g. to re-raise it with
    /// [`std::panic::resume_unwind`].
    pub fn take_recovered(&self) -> Option<Box<dyn Any + Send>> {
        match self.payload.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Backtrace captured where the panic was intercepted.
    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    fn with_payload<R>(&self, f: impl FnOnce(&(dyn Any + Send + 'static)) -> R) -> Option<R> {
        let guard = match self.payload.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_deref().map(f)
    }
}

impl fmt::Debug for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicError")
            .field("cause", &self.cause)
            .field("stack_trace", &self.stack_trace)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic recovered: {}", self.cause)
    }
}

impl StdError for PanicError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.cause)
    }
}

/// Runs `op`, converting a panic into a [`PanicError`].
///
/// `Ok` and `Err` results of `op` are returned unchanged.
///
/// # Error payloads
/// A panic payload is only recognised as an error when its concrete type is
/// one of [`BoxError`], `Arc<dyn Error + Send + Sync>`, [`std::io::Error`],
/// [`OpError`], [`GroupErrors`] or [`Canceled`]: `Any` cannot be probed for
/// an arbitrary `dyn Error`. Any other error type passed to `panic_any` is
/// reported as `Box<dyn Any>` and stays reachable through
/// [`PanicError::recovered_is`] / [`PanicError::take_recovered`]. Box or
/// share it before panicking to keep it matchable.
pub fn catch_panic<T, E, F>(op: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<PanicError>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(res) => res,
        Err(payload) => Err(E::from(recovered(payload))),
    }
}

/// Awaits `fut`, converting a panic raised while polling it into a [`PanicError`].
///
/// # Example
/// ```
/// use opgroup::{catch_panic_async, BoxError};
///
/// async fn flaky() -> Result<(), BoxError> {
///     panic!("async boom")
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let res: Result<(), BoxError> = catch_panic_async(flaky()).await;
/// assert_eq!(res.unwrap_err().to_string(), "panic recovered: async boom");
/// # }
/// ```
pub async fn catch_panic_async<T, E, F>(fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<PanicError>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(E::from(recovered(payload))),
    }
}

fn recovered(payload: Payload) -> PanicError {
    let trace = Backtrace::force_capture().to_string();
    let err = PanicError::from_payload(payload, trace);
    tracing::debug!(cause = %err.cause, "panic recovered");
    err
}

/// Shared error payload; delegates to the error it wraps.
struct SharedCause(Arc<dyn StdError + Send + Sync + 'static>);

impl fmt::Debug for SharedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for SharedCause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.0)
    }
}

/// Moves an error-typed payload into a [`BoxError`].
fn into_error(payload: Payload) -> Result<BoxError, Payload> {
    macro_rules! take_error {
        ($payload:ident, $($ty:ty),+ $(,)?) => {{
            let $payload = match $payload.downcast::<BoxError>() {
                Ok(err) => return Ok(*err),
                Err(other) => other,
            };
            let $payload = match $payload.downcast::<Arc<dyn StdError + Send + Sync + 'static>>() {
                Ok(shared) => return Ok(Box::new(SharedCause(*shared)) as BoxError),
                Err(other) => other,
            };
            $(
                let $payload = match $payload.downcast::<$ty>() {
                    Ok(err) => return Ok(err as BoxError),
                    Err(other) => other,
                };
            )+
            Err($payload)
        }};
    }

    take_error!(payload, std::io::Error, OpError, GroupErrors, Canceled)
}

/// Renders a non-error payload the way `panic!` would print it.
pub(crate) fn describe(payload: &(dyn Any + Send + 'static)) -> String {
    macro_rules! display_as {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let Some(v) = payload.downcast_ref::<$ty>() {
                    return v.to_string();
                }
            )+
        };
    }

    display_as!(
        &'static str,
        String,
        i8,
        i16,
        i32,
        i64,
        i128,
        isize,
        u8,
        u16,
        u32,
        u64,
        u128,
        usize,
        f32,
        f64,
        bool,
        char,
    );
    "Box<dyn Any>".to_string()
}
