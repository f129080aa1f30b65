//! # Group: launch operations, wait for all of them, aggregate their errors.
//!
//! A [`Group`] owns a cancellation token derived from the caller's, a task
//! tracker acting as the wait-group, and the error collector.
//!
//! ## Lifecycle
//! ```text
//! Group::new(&parent)
//!   ├─► token = parent.child_token()
//!   └─► spawn collector (intake channel + drain task)
//!
//! go / go_named / spawn                      (state: Open)
//!   ├─► tracker.spawn(run_op(name, op(token.clone())))
//!   └─► error → intake → drain → token.cancel() if abort_on_error
//!
//! wait()                                     (state: Open → Finalizing → Closed)
//!   ├─► drop group's intake sender, tracker.close()
//!   ├─► collector: tracker.wait() → drain finished → Collected
//!   ├─► token.cancel()                       (always, also on panic/drop)
//!   ├─► flush subscribers
//!   └─► Ok(()) | Err(GroupErrors { match_mode, causes })
//! ```
//!
//! ## Rules
//! - Launching after `wait` has been entered panics.
//! - `wait` may only be called once; a second call panics.
//! - The derived token is cancelled when `wait` returns, whatever the outcome.
//! - A panic inside an operation cancels its siblings and is re-raised from `wait`.
//! - Dropping a group that was never waited cancels its token.

use std::fmt;
use std::future::Future;
use std::panic;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::builder::GroupBuilder;
use super::collector::{self, Collected, Intake};
use super::config::GroupConfig;
use super::runner;
use crate::{
    error::{BoxError, GroupErrors},
    events::{Event, EventKind},
    ops::{BoxOpFuture, DEFAULT_OP_NAME, OpRef},
    subscribers::SubscriberSet,
};

/// Observable lifecycle state of a [`Group`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupState {
    /// Accepting operations.
    Open,
    /// `wait` has been entered and is waiting for operations to finish.
    Finalizing,
    /// `wait` returned.
    Closed,
}

enum Phase {
    Open {
        intake: mpsc::UnboundedSender<Intake>,
        collector: JoinHandle<Collected>,
        events: Arc<SubscriberSet>,
    },
    Finalizing,
    Closed,
}

impl Phase {
    fn state(&self) -> GroupState {
        match self {
            Phase::Open { .. } => GroupState::Open,
            Phase::Finalizing => GroupState::Finalizing,
            Phase::Closed => GroupState::Closed,
        }
    }
}

/// Runs a set of fallible operations concurrently and aggregates their errors.
///
/// Every operation receives a clone of the group's token. With
/// [`GroupConfig::abort_on_error`] (the default) the first collected error
/// cancels that token so the remaining operations can stop early.
///
/// ## Example
/// ```rust
/// use std::io;
/// use tokio_util::sync::CancellationToken;
/// use opgroup::{Canceled, ErrorChain, Group, OpError};
///
/// # #[tokio::main]
/// # async fn main() {
/// let parent = CancellationToken::new();
/// let group = Group::new(&parent);
///
/// for _ in 0..3 {
///     group.go(|ctx| async move {
///         ctx.cancelled().await;
///         Err(Canceled)
///     });
/// }
/// group.go_named("fetch", |_ctx| async {
///     Err(io::Error::other("connection reset"))
/// });
///
/// let err = group.wait().await.unwrap_err();
/// assert_eq!(err.len(), 4);
/// assert_eq!(err.causes()[0].name(), "fetch");
/// assert!(err.find_cause::<OpError>().is_some());
/// # }
/// ```
pub struct Group {
    token: CancellationToken,
    cfg: GroupConfig,
    tracker: TaskTracker,
    phase: Mutex<Phase>,
}

impl Group {
    /// Creates a group with the default configuration.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(parent: &CancellationToken) -> Self {
        Self::with_config(parent, GroupConfig::default())
    }

    /// Creates a group with an explicit configuration.
    pub fn with_config(parent: &CancellationToken, cfg: GroupConfig) -> Self {
        Self::new_internal(parent, cfg, SubscriberSet::empty())
    }

    /// Returns a builder for a group with subscribers or custom settings.
    pub fn builder() -> GroupBuilder {
        GroupBuilder::default()
    }

    pub(crate) fn new_internal(
        parent: &CancellationToken,
        cfg: GroupConfig,
        events: SubscriberSet,
    ) -> Self {
        let token = parent.child_token();
        let tracker = TaskTracker::new();
        let events = Arc::new(events);
        let (intake, rx) = mpsc::unbounded_channel();

        let collector = collector::spawn(
            rx,
            tracker.clone(),
            token.clone(),
            cfg.abort_on_error,
            Arc::clone(&events),
        );

        Self {
            token,
            cfg,
            tracker,
            phase: Mutex::new(Phase::Open {
                intake,
                collector,
                events,
            }),
        }
    }

    /// Launches an unnamed operation.
    ///
    /// Errors it returns are labelled with [`DEFAULT_OP_NAME`].
    ///
    /// # Panics
    /// If [`wait`](Self::wait) has already been entered.
    pub fn go<F, Fut, E>(&self, op: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.go_named(DEFAULT_OP_NAME, op);
    }

    /// Launches a named operation.
    ///
    /// # Panics
    /// If [`wait`](Self::wait) has already been entered.
    pub fn go_named<F, Fut, E>(&self, name: impl Into<Arc<str>>, op: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let ctx = self.token.clone();
        self.launch(
            name.into(),
            Box::pin(async move { op(ctx).await.map_err(Into::<BoxError>::into) }),
        );
    }

    /// Launches a shared [`Operation`](crate::Operation) under its own name.
    ///
    /// # Panics
    /// If [`wait`](Self::wait) has already been entered.
    pub fn spawn(&self, op: OpRef) {
        let ctx = self.token.clone();
        let name: Arc<str> = Arc::from(op.name());
        self.launch(name, Box::pin(async move { op.run(ctx).await }));
    }

    fn launch(&self, name: Arc<str>, fut: BoxOpFuture) {
        let launched = {
            let phase = self.lock_phase();
            match &*phase {
                Phase::Open { intake, events, .. } => {
                    events.emit(
                        Event::new(EventKind::OpLaunched)
                            .with_op(Arc::clone(&name))
                            .with_count(self.tracker.len() + 1),
                    );
                    tracing::trace!(op = %name, "operation launched");

                    // Spawned under the lock so `wait` cannot close the tracker in between.
                    self.tracker.spawn(runner::run_op(
                        name,
                        fut,
                        intake.clone(),
                        Arc::clone(events),
                    ));
                    true
                }
                Phase::Finalizing | Phase::Closed => false,
            }
        };

        if !launched {
            panic!("Group::go called after Group::wait");
        }
    }

    /// Waits for every launched operation and returns the aggregated errors.
    ///
    /// Returns `Ok(())` when no operation failed. Otherwise returns
    /// [`GroupErrors`] with the causes in arrival order and the configured
    /// match mode. The group's token is cancelled before this returns.
    ///
    /// # Panics
    /// - If called more than once.
    /// - If an operation panicked: the first panic is re-raised here after
    ///   every operation finished.
    ///
    /// # Cancel safety
    /// Not cancel safe. Dropping the returned future before it completes
    /// (e.g. under `tokio::time::timeout`) cancels the group's token and moves
    /// the group to [`GroupState::Closed`]; the operations still finish in the
    /// background but their errors are discarded.
    pub async fn wait(&self) -> Result<(), GroupErrors> {
        let _release = self.token.clone().drop_guard();

        let Some((collector, events)) = self.begin_wait() else {
            panic!("Group::wait called more than once");
        };
        let _close = CloseOnExit(self);
        events.emit(Event::new(EventKind::WaitRequested).with_count(self.tracker.len()));
        self.tracker.close();

        let collected = match collector.await {
            Ok(collected) => collected,
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(err) => {
                tracing::warn!(error = %err, "collector cancelled by runtime shutdown; errors lost");
                Collected::default()
            }
        };
        *self.lock_phase() = Phase::Closed;
        self.token.cancel();

        if let Some((name, payload)) = collected.panic {
            tracing::error!(op = %name, "re-raising operation panic");
            flush(events).await;
            panic::resume_unwind(payload);
        }

        let causes = collected.causes;
        tracing::debug!(errors = causes.len(), "group closed");
        events.emit(Event::new(EventKind::GroupClosed).with_count(causes.len()));
        flush(events).await;

        if causes.is_empty() {
            Ok(())
        } else {
            Err(GroupErrors::new(self.cfg.match_mode, causes))
        }
    }

    fn begin_wait(&self) -> Option<(JoinHandle<Collected>, Arc<SubscriberSet>)> {
        let mut phase = self.lock_phase();
        match std::mem::replace(&mut *phase, Phase::Finalizing) {
            Phase::Open {
                intake,
                collector,
                events,
            } => {
                drop(intake);
                Some((collector, events))
            }
            other => {
                *phase = other;
                None
            }
        }
    }

    /// The group's derived token, handed to every operation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of launched operations that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GroupState {
        self.lock_phase().state()
    }

    /// Configuration the group was built with.
    pub fn config(&self) -> &GroupConfig {
        &self.cfg
    }

    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Seals the group when `wait` exits, including when its future is dropped.
struct CloseOnExit<'a>(&'a Group);

impl Drop for CloseOnExit<'_> {
    fn drop(&mut self) {
        *self.0.lock_phase() = Phase::Closed;
    }
}

async fn flush(events: Arc<SubscriberSet>) {
    if let Ok(set) = Arc::try_unwrap(events) {
        set.shutdown().await;
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("config", &self.cfg)
            .finish()
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        let phase = self.phase.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Phase::Open { .. } = phase {
            tracing::debug!(pending = self.tracker.len(), "group dropped without wait");
            *phase = Phase::Closed;
            self.tracker.close();
            self.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Canceled, ErrorChain, MatchMode, OpError, OpFn, PanicError, Subscribe, catch_panic_async,
        error::has_cause,
    };
    use async_trait::async_trait;
    use futures::FutureExt;
    use std::io;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn eof() -> io::Error {
        io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected EOF")
    }

    fn is_eof(err: &(dyn std::error::Error + 'static)) -> bool {
        err.downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof)
    }

    async fn wait_bounded(group: &Group) -> Result<(), GroupErrors> {
        tokio::time::timeout(Duration::from_secs(5), group.wait())
            .await
            .expect("group did not finish in time")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_errors() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            group.go(move |_ctx| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            });
        }

        assert!(wait_bounded(&group).await.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(group.state(), GroupState::Closed);
        assert_eq!(group.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_all_fail() {
        let parent = CancellationToken::new();
        let group = Group::with_config(
            &parent,
            GroupConfig {
                abort_on_error: false,
                ..GroupConfig::default()
            },
        );

        for _ in 0..10 {
            group.go(|_ctx| async { Err(eof()) });
        }

        let err = wait_bounded(&group).await.unwrap_err();
        assert_eq!(err.len(), 10);
        for cause in &err {
            assert_eq!(cause.name(), DEFAULT_OP_NAME);
            assert!(is_eof(cause.cause()));
            assert_eq!(cause.to_string(), "error during '[ROUTINE]': unexpected EOF");
        }
        assert!(err.any_cause(is_eof));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_all_fail_with_abort() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);

        for _ in 0..50 {
            group.go(|_ctx| async { Err(eof()) });
        }

        let err = wait_bounded(&group).await.unwrap_err();
        assert_eq!(err.len(), 50);
        for cause in &err {
            assert_eq!(cause.name(), DEFAULT_OP_NAME);
            assert!(is_eof(cause.cause()));
        }
        assert!(err.any_cause(is_eof));
        assert!(group.token().is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_abort_cascade() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);

        for _ in 0..10 {
            group.go(|ctx| async move {
                ctx.cancelled().await;
                Err(Canceled)
            });
        }
        group.go_named("failOp", |_ctx| async { Err(eof()) });

        let err = wait_bounded(&group).await.unwrap_err();
        assert_eq!(err.len(), 11);
        assert!(err.any_cause(is_eof));
        assert!(!err.has_cause(&Canceled));
        assert_eq!(err.find_cause::<OpError>().unwrap().name(), "failOp");
        assert!(is_eof(err.causes()[0].cause()));
        assert_eq!(err.causes()[1].cause().downcast_ref::<Canceled>(), Some(&Canceled));
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_abort_isolation() {
        let parent = CancellationToken::new();
        let group = Group::builder().abort_on_error(false).build(&parent);
        let counter = Arc::new(AtomicUsize::new(0));
        let canceled = Arc::new(AtomicBool::new(false));
        let bad_returned = CancellationToken::new();

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            let canceled = Arc::clone(&canceled);
            let bad_returned = bad_returned.clone();
            group.go(move |ctx| async move {
                bad_returned.cancelled().await;
                tokio::select! {
                    _ = ctx.cancelled() => {
                        canceled.store(true, Ordering::SeqCst);
                        return Err(Canceled);
                    }
                    _ = tokio::time::sleep(Duration::from_millis(50)) => {}
                }
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        let signal = bad_returned.clone();
        group.go_named("failOp", move |_ctx| async move {
            signal.cancel();
            Err(eof())
        });

        let err = wait_bounded(&group).await.unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.any_cause(is_eof));
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert!(!canceled.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[should_panic(expected = "Group::wait called more than once")]
    async fn test_double_wait_panics() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);
        let _ = group.wait().await;
        let _ = group.wait().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    #[should_panic(expected = "Group::go called after Group::wait")]
    async fn test_go_after_wait_panics() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);
        let _ = group.wait().await;
        group.go(|_ctx| async { Ok::<(), BoxError>(()) });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_token_released_after_wait() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);
        assert!(!group.token().is_cancelled());
        assert_eq!(group.state(), GroupState::Open);

        assert!(group.wait().await.is_ok());
        assert!(group.token().is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parent_cancellation_reaches_operations() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);

        for _ in 0..3 {
            group.go(|ctx| async move {
                ctx.cancelled().await;
                Err(Canceled)
            });
        }
        parent.cancel();

        let err = wait_bounded(&group).await.unwrap_err();
        assert_eq!(err.len(), 3);
        assert!(err.has_cause(&Canceled));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_any_mode_matches_every_cause() {
        let parent = CancellationToken::new();
        let group = Group::builder()
            .abort_on_error(false)
            .match_mode(MatchMode::Any)
            .build(&parent);

        group.go_named("read", |_ctx| async { Err(eof()) });
        group.go_named("cancel", |_ctx| async { Err(Canceled) });

        let err = wait_bounded(&group).await.unwrap_err();
        assert_eq!(err.match_mode(), MatchMode::Any);
        assert!(err.has_cause(&Canceled));
        assert!(err.any_cause(is_eof));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_nested_groups() {
        let parent = CancellationToken::new();
        let outer = Group::new(&parent);

        outer.go_named("inner", |ctx| async move {
            let inner = Group::builder().match_mode(MatchMode::Any).build(&ctx);
            inner.go(|_ctx| async { Err(Canceled) });
            inner.go(|_ctx| async { Err(eof()) });
            inner.wait().await
        });

        let err = wait_bounded(&outer).await.unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.causes()[0].name(), "inner");
        assert!(err.find_cause::<GroupErrors>().is_some());
        assert!(err.any_cause(is_eof));
        assert!(has_cause(&err, &Canceled));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spawn_operation_uses_its_name() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);

        group.spawn(OpFn::arc("loader", |_ctx: CancellationToken| async {
            Err::<(), _>(eof())
        }));

        let err = wait_bounded(&group).await.unwrap_err();
        assert_eq!(err.unwrap_cause().unwrap().name(), "loader");
    }

    async fn explode() -> Result<(), BoxError> {
        panic!("kaboom")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_guarded_panic_becomes_cause() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);

        group.go_named("guarded", |_ctx| catch_panic_async(explode()));

        let err = wait_bounded(&group).await.unwrap_err();
        let recovered = err.find_cause::<PanicError>().unwrap();
        assert_eq!(recovered.to_string(), "panic recovered: kaboom");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unguarded_panic_resurfaces_from_wait() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);
        let sibling_canceled = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&sibling_canceled);
        group.go(move |ctx| async move {
            ctx.cancelled().await;
            flag.store(true, Ordering::SeqCst);
            Err(Canceled)
        });
        group.go(|_ctx| explode());

        let payload = AssertUnwindSafe(wait_bounded(&group))
            .catch_unwind()
            .await
            .unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"kaboom"));
        assert!(sibling_canceled.load(Ordering::SeqCst));
        assert_eq!(group.state(), GroupState::Closed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dropped_wait_closes_group() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);
        let release = CancellationToken::new();

        let gate = release.clone();
        group.go(move |_ctx| async move {
            gate.cancelled().await;
            Err(Canceled)
        });

        let timed_out = tokio::time::timeout(Duration::from_millis(20), group.wait())
            .await
            .is_err();
        assert!(timed_out);
        assert_eq!(group.state(), GroupState::Closed);
        assert!(group.token().is_cancelled());

        release.cancel();
    }

    #[test]
    fn test_wait_after_runtime_shutdown_completes() {
        let parent = CancellationToken::new();
        let first = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let group = first.block_on(async {
            let group = Group::new(&parent);
            group.go(|ctx| async move {
                ctx.cancelled().await;
                Err(Canceled)
            });
            group
        });
        drop(first);

        let second = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let res = second.block_on(group.wait());
        assert!(res.is_ok());
        assert_eq!(group.state(), GroupState::Closed);
        assert!(group.token().is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_without_wait_cancels() {
        let parent = CancellationToken::new();
        let group = Group::new(&parent);
        let token = group.token().clone();
        group.go(|ctx| async move {
            ctx.cancelled().await;
            Ok::<(), BoxError>(())
        });

        drop(group);
        assert!(token.is_cancelled());
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscribers_see_lifecycle() {
        let parent = CancellationToken::new();
        let rec = Arc::new(Recorder::default());
        let group = Group::builder()
            .with_subscribers(vec![rec.clone()])
            .build(&parent);

        group.go_named("ok", |_ctx| async { Ok::<(), BoxError>(()) });
        group.go_named("bad", |_ctx| async { Err(eof()) });
        let _ = wait_bounded(&group).await;

        let seen = rec.seen.lock().unwrap().clone();
        let count = |kind: EventKind| seen.iter().filter(|k| **k == kind).count();
        assert_eq!(count(EventKind::OpLaunched), 2);
        assert_eq!(count(EventKind::OpSucceeded), 1);
        assert_eq!(count(EventKind::OpFailed), 1);
        assert_eq!(count(EventKind::AbortRequested), 1);
        assert_eq!(count(EventKind::WaitRequested), 1);
        assert_eq!(seen.last(), Some(&EventKind::GroupClosed));
    }
}
