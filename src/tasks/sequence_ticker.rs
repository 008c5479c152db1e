//! Sequence ticker background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::{AppState, TickOutcome};

/// Background task that drives one tick per second while a run is live
///
/// The outer loop sleeps on the run-epoch watch channel; every start and
/// reset publishes a new epoch. While the epoch's run is live the inner loop
/// ticks once per second, handing each tick to `AppState::apply_tick`
/// stamped with the epoch it was scheduled for. A stale stamp means a reset
/// or restart won the race and the tick applies nothing.
pub async fn sequence_ticker_task(state: Arc<AppState>) {
    info!("Starting sequence ticker task");

    let mut epoch_rx = state.epoch_tx.subscribe();

    loop {
        let epoch = *epoch_rx.borrow_and_update();

        let live = match state.run_is_live_at(epoch) {
            Ok(live) => live,
            Err(e) => {
                error!("Failed to inspect run state: {}", e);
                false
            }
        };
        if !live {
            if epoch_rx.changed().await.is_err() {
                info!("Epoch channel closed, stopping ticker task");
                return;
            }
            continue;
        }

        debug!("Ticking for run epoch {}", epoch);
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval fire is immediate; discard it so the run's
        // first real tick lands one second after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match state.apply_tick(epoch) {
                        Ok(TickOutcome::Applied) | Ok(TickOutcome::Inert) => {}
                        Ok(TickOutcome::Stale) => {
                            debug!("Tick for epoch {} was stale", epoch);
                            break;
                        }
                        Ok(TickOutcome::Finished) => {
                            debug!("Run epoch {} finished", epoch);
                            break;
                        }
                        Err(e) => {
                            error!("Failed to apply tick: {}", e);
                            break;
                        }
                    }
                }

                // Epoch moved on (reset or restart); drop this schedule.
                changed = epoch_rx.changed() => {
                    if changed.is_err() {
                        info!("Epoch channel closed, stopping ticker task");
                        return;
                    }
                    if *epoch_rx.borrow_and_update() != epoch {
                        debug!("Run epoch changed, rescheduling");
                        break;
                    }
                }
            }
        }
    }
}
