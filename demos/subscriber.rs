//! # Example: subscriber
//!
//! Renders group events through the built-in [`LogWriter`] and counts them
//! with a custom subscriber.
//!
//! ## Run
//! ```bash
//! RUST_LOG=opgroup=info cargo run --example subscriber --features logging
//! ```

use std::{
    io,
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use opgroup::{Canceled, Event, EventKind, Group, LogWriter, Subscribe};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Metrics {
    launched: AtomicU64,
    failed: AtomicU64,
    succeeded: AtomicU64,
}

impl Metrics {
    fn print_stats(&self) {
        println!();
        println!("Metrics:");
        println!(" ├─► Launched:  {}", self.launched.load(Ordering::Relaxed));
        println!(" ├─► Failed:    {}", self.failed.load(Ordering::Relaxed));
        println!(" └─► Succeeded: {}", self.succeeded.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for Metrics {
    async fn on_event(&self, ev: &Event) {
        let counter = match ev.kind {
            EventKind::OpLaunched => &self.launched,
            EventKind::OpFailed => &self.failed,
            EventKind::OpSucceeded => &self.succeeded,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("opgroup=info")),
        )
        .init();

    let metrics = Arc::new(Metrics::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), metrics.clone()];

    let parent = CancellationToken::new();
    let group = Group::builder().with_subscribers(subs).build(&parent);

    group.go_named("fast", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<(), Canceled>(())
    });
    group.go_named("slow", |ctx| async move {
        tokio::select! {
            _ = ctx.cancelled() => Err(Canceled),
            _ = tokio::time::sleep(Duration::from_secs(5)) => Ok(()),
        }
    });
    group.go_named("fetch", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err(io::Error::other("connection refused"))
    });

    if let Err(err) = group.wait().await {
        println!("{err}");
    }
    metrics.print_stats();
}
