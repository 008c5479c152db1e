//! Alert background task

use std::{
    io::{self, Write},
    sync::Arc,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::{AppState, RunnerEvent};

/// Background task that turns runner events into audible cues
///
/// Subscribes to the runner event broadcast and emits one cue per event, in
/// order: a short bell when an entry finishes and a double bell when the
/// whole sequence is done. This is the stand-in for the original widget's
/// beep; the runner itself stays free of any audio concern.
pub async fn alert_task(state: Arc<AppState>) {
    info!("Starting alert task");

    let mut events = state.event_tx.subscribe();

    loop {
        match events.recv().await {
            Ok(RunnerEvent::EntryFinished(index)) => {
                info!("Timer {} finished", index);
                ring_bell(1);
            }
            Ok(RunnerEvent::SequenceFinished) => {
                info!("All timers finished");
                ring_bell(2);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Alert task lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Event channel closed, stopping alert task");
                return;
            }
        }
    }
}

/// Write `count` terminal bells to stdout
fn ring_bell(count: usize) {
    let mut stdout = io::stdout();
    for _ in 0..count {
        let _ = stdout.write_all(b"\x07");
    }
    let _ = stdout.flush();
}
