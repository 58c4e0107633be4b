//! Watch command handler
//!
//! Keeps the subscription open and re-renders the list on every
//! snapshot until interrupted. The subscription is cancelled on exit so
//! nothing fires after teardown.

use anyhow::Result;
use tracing::debug;

use ordo_core::{ListManager, Subscription};

use crate::output::Output;

/// Render live updates until Ctrl-C
pub async fn watch(
    manager: &mut ListManager,
    sub: &mut Subscription,
    output: &Output,
) -> Result<()> {
    output.message("Watching for changes (Ctrl-C to stop)...");
    render(manager, output);

    loop {
        tokio::select! {
            snapshot = sub.recv() => {
                match snapshot {
                    Some(items) => {
                        manager.ingest_snapshot(items);
                        render(manager, output);
                    }
                    None => {
                        debug!("snapshot feed closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                sub.cancel();
                output.message("Stopped.");
                break;
            }
        }
    }

    Ok(())
}

fn render(manager: &ListManager, output: &Output) {
    if !output.is_quiet() {
        println!();
    }
    output.print_items(manager.items());
}
