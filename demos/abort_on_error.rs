//! # Example: abort_on_error
//!
//! Ten workers wait for cancellation while one operation fails. The failure
//! cancels the group's context, every worker stops with [`Canceled`], and the
//! aggregate still matches only the error that started the abort.
//!
//! ## Flow
//! ```text
//! Group::new(&parent)
//!     ├─► go(worker) x10        waits on ctx.cancelled()
//!     ├─► go_named("failOp")    returns UnexpectedEof
//!     │     └─► drain ─► token.cancel()
//!     ├─► workers return Canceled
//!     └─► wait() ─► GroupErrors { First, 11 causes }
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example abort_on_error
//! ```

use std::io;
use std::time::Duration;

use opgroup::{Canceled, ErrorChain, Group, OpError};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let parent = CancellationToken::new();
    let group = Group::new(&parent);

    for i in 0..10 {
        group.go(move |ctx| async move {
            ctx.cancelled().await;
            println!("[worker {i}] cancelled");
            Err(Canceled)
        });
    }

    group.go_named("failOp", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!("[failOp] giving up");
        Err(io::Error::from(io::ErrorKind::UnexpectedEof))
    });

    let Err(err) = group.wait().await else {
        println!("no errors");
        return;
    };

    println!();
    println!("{err}");
    println!(" ├─► causes:            {}", err.len());
    println!(" ├─► has Canceled:      {}", err.has_cause(&Canceled));
    println!(
        " ├─► has EOF:           {}",
        err.any_cause(|e| e
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof))
    );
    if let Some(op) = err.find_cause::<OpError>() {
        println!(" └─► failed operation:  {}", op.name());
    }
}
