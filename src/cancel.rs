//! Cooperative cancellation.
//!
//! The first Ctrl+C cancels a [`tokio_util::sync::CancellationToken`]
//! that the sync loops poll at page and target boundaries, so in-flight
//! writes and renames always finish. A second Ctrl+C force-exits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Install the Ctrl+C handler and return the token the sync loops poll.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let count = Arc::new(AtomicU32::new(0));

    let handler_token = token.clone();
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("Unable to listen for Ctrl+C, cancellation disabled");
                return;
            }

            let prev = count.fetch_add(1, Ordering::SeqCst);
            if prev == 0 {
                tracing::info!("Interrupt received, finishing the current item...");
                tracing::info!("Press Ctrl+C again to force exit");
                handler_token.cancel();
            } else {
                tracing::warn!("Force exit requested");
                std::process::exit(130);
            }
        }
    });

    token
}
