//! # Example: panic_guard
//!
//! Shows the two ways a panic inside a group can surface:
//! - guarded with [`catch_panic_async`]: the panic becomes a [`PanicError`] cause;
//! - unguarded: siblings are cancelled and `wait` re-raises the panic.
//!
//! ## Run
//! ```bash
//! cargo run --example panic_guard
//! ```

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use opgroup::{BoxError, Canceled, ErrorChain, Group, PanicError, catch_panic_async};
use tokio_util::sync::CancellationToken;

async fn parse_config() -> Result<(), BoxError> {
    let raw: Option<&str> = None;
    let _value = raw.map(str::len).unwrap_or_else(|| panic!("config value missing"));
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let parent = CancellationToken::new();

    // 1. Guarded: the panic turns into an ordinary error.
    let guarded = Group::new(&parent);
    guarded.go_named("parse", |_ctx| catch_panic_async(parse_config()));

    if let Err(err) = guarded.wait().await {
        if let Some(panic) = err.find_cause::<PanicError>() {
            println!("[guarded] {panic}");
            println!("[guarded] message: {:?}", panic.downcast_recovered::<&str>());
        }
    }

    // 2. Unguarded: the sibling is cancelled, then `wait` re-raises.
    let unguarded = Group::new(&parent);
    unguarded.go_named("sibling", |ctx| async move {
        ctx.cancelled().await;
        println!("[unguarded] sibling cancelled");
        Err(Canceled)
    });
    unguarded.go_named("parse", |_ctx| parse_config());

    match AssertUnwindSafe(unguarded.wait()).catch_unwind().await {
        Ok(_) => println!("[unguarded] finished without panic"),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| payload.downcast_ref::<&str>().copied())
                .unwrap_or("<non-string panic>");
            println!("[unguarded] wait re-raised: {msg}");
        }
    }
}
