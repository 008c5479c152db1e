//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::{
    share,
    validate::{self, ValidationReport},
};
use super::{DisplayState, Phase, RowSeed, RowSet, RunState, RunnerEvent, StartError, TimerRow};

/// Outcome of a start request, for the API layer to map to a response
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A run was captured and is ticking
    Started,
    /// The snapshot failed validation; nothing started
    Invalid(ValidationReport),
    /// Validation passed but no row compiled into a spec; non-fatal no-op
    NothingToRun,
    /// A run is already live
    Busy,
}

/// Outcome of applying one scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick decremented the current entry (and possibly advanced)
    Applied,
    /// The runner is paused; the tick was inert
    Inert,
    /// The tick belonged to an earlier run; nothing was touched
    Stale,
    /// The sequence is exhausted; ticking should stop
    Finished,
}

/// Main application state: the editable row set and the single run
#[derive(Debug)]
pub struct AppState {
    /// Live editable rows
    pub row_set: Arc<Mutex<RowSet>>,
    /// The one sequential run (idle when nothing is ticking)
    pub run_state: Arc<Mutex<RunState>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Runner events for the alert collaborator
    pub event_tx: broadcast::Sender<RunnerEvent>,
    /// Run epoch notifications that wake the ticker task
    pub epoch_tx: watch::Sender<u64>,
    /// Display projection for status consumers
    pub display_tx: watch::Sender<DisplayState>,
    /// Keep the receivers alive to prevent channel closure
    pub _epoch_rx: watch::Receiver<u64>,
    pub _display_rx: watch::Receiver<DisplayState>,
}

impl AppState {
    /// Create a new AppState around an initial row set
    pub fn new(port: u16, host: String, rows: RowSet) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (epoch_tx, epoch_rx) = watch::channel(0);
        let (display_tx, display_rx) = watch::channel(DisplayState::idle());

        Self {
            row_set: Arc::new(Mutex::new(rows)),
            run_state: Arc::new(Mutex::new(RunState::new())),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            event_tx,
            epoch_tx,
            display_tx,
            _epoch_rx: epoch_rx,
            _display_rx: display_rx,
        }
    }

    /// Mutate the row set and record the action
    fn with_rows<T, F>(&self, action: &str, mutator: F) -> Result<T, String>
    where
        F: FnOnce(&mut RowSet) -> T,
    {
        let mut rows = self.row_set.lock()
            .map_err(|e| format!("Failed to lock row set: {}", e))?;
        let result = mutator(&mut rows);
        drop(rows);

        self.record_action(action);
        Ok(result)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    fn publish_display(&self, display: DisplayState) {
        if let Err(e) = self.display_tx.send(display) {
            warn!("Failed to send display update: {}", e);
        }
    }

    /// Append a row at the end, returning its index
    pub fn append_row(&self, seed: RowSeed) -> Result<usize, String> {
        self.with_rows("append-row", |rows| rows.append(seed))
    }

    /// Insert a row after `index`; None on out-of-bounds no-op
    pub fn insert_row_after(&self, index: usize, seed: RowSeed) -> Result<Option<usize>, String> {
        self.with_rows("insert-row", |rows| rows.insert_after(index, seed))
    }

    /// Remove the row at `index`; false when the no-op rules applied
    pub fn remove_row(&self, index: usize) -> Result<bool, String> {
        self.with_rows("remove-row", |rows| rows.remove_at(index))
    }

    /// Overwrite the fields of the row at `index`
    pub fn update_row(&self, index: usize, seed: RowSeed) -> Result<bool, String> {
        self.with_rows("update-row", |rows| rows.update(index, seed))
    }

    /// Decode a share query and replace the rows on success
    ///
    /// A malformed query is absorbed silently: the current rows stay
    /// untouched and the result is false.
    pub fn load_share_query(&self, query: &str) -> Result<bool, String> {
        match share::decode(query) {
            Some(seeds) => {
                info!("Loading {} rows from share query", seeds.len());
                self.with_rows("load-share", |rows| rows.replace_all(seeds))?;
                Ok(true)
            }
            None => {
                info!("Share query did not decode; keeping current rows");
                Ok(false)
            }
        }
    }

    /// Current rows with their ids
    pub fn rows(&self) -> Result<Vec<TimerRow>, String> {
        self.row_set.lock()
            .map(|rows| rows.rows().to_vec())
            .map_err(|e| format!("Failed to lock row set: {}", e))
    }

    /// The shareable query string for the current rows
    pub fn share_query(&self) -> Result<String, String> {
        self.row_set.lock()
            .map(|rows| share::encode(&rows.snapshot()))
            .map_err(|e| format!("Failed to lock row set: {}", e))
    }

    /// Total configured seconds across parseable rows (the idle aggregate)
    pub fn total_seconds(&self) -> Result<u64, String> {
        self.row_set.lock()
            .map(|rows| rows.total_seconds())
            .map_err(|e| format!("Failed to lock row set: {}", e))
    }

    /// Validate the current rows and start a run from them
    pub fn start_run(&self) -> Result<StartOutcome, String> {
        let snapshot = self.row_set.lock()
            .map(|rows| rows.snapshot())
            .map_err(|e| format!("Failed to lock row set: {}", e))?;

        let report = validate::validate(&snapshot);
        if !report.is_valid() {
            info!("Start refused: {} rows failed validation",
                  report.rows.iter().filter(|r| !r.is_valid()).count());
            return Ok(StartOutcome::Invalid(report));
        }

        let specs = validate::compile(&snapshot);

        let mut run = self.run_state.lock()
            .map_err(|e| format!("Failed to lock run state: {}", e))?;
        match run.start(specs) {
            Ok(()) => {
                let epoch = run.epoch();
                let display = run.display();
                drop(run);

                self.record_action("start");
                self.publish_display(display);
                if let Err(e) = self.epoch_tx.send(epoch) {
                    warn!("Failed to notify ticker of new run: {}", e);
                }
                info!("Run started (epoch {})", epoch);
                Ok(StartOutcome::Started)
            }
            Err(StartError::EmptySequence) => {
                info!("Start was a no-op: nothing to run");
                Ok(StartOutcome::NothingToRun)
            }
            Err(StartError::RunActive) => Ok(StartOutcome::Busy),
        }
    }

    /// Pause the run; false when not running
    pub fn pause_run(&self) -> Result<bool, String> {
        let mut run = self.run_state.lock()
            .map_err(|e| format!("Failed to lock run state: {}", e))?;
        let paused = run.pause();
        let display = run.display();
        drop(run);

        if paused {
            self.record_action("pause");
            self.publish_display(display);
            info!("Run paused");
        }
        Ok(paused)
    }

    /// Resume the run; false when not paused
    pub fn resume_run(&self) -> Result<bool, String> {
        let mut run = self.run_state.lock()
            .map_err(|e| format!("Failed to lock run state: {}", e))?;
        let resumed = run.resume();
        let display = run.display();
        drop(run);

        if resumed {
            self.record_action("resume");
            self.publish_display(display);
            info!("Run resumed");
        }
        Ok(resumed)
    }

    /// Discard the run and return to idle, from any phase
    pub fn reset_run(&self) -> Result<(), String> {
        let mut run = self.run_state.lock()
            .map_err(|e| format!("Failed to lock run state: {}", e))?;
        run.reset();
        let epoch = run.epoch();
        drop(run);

        self.record_action("reset");
        self.publish_display(DisplayState::idle());
        if let Err(e) = self.epoch_tx.send(epoch) {
            warn!("Failed to notify ticker of reset: {}", e);
        }
        info!("Run reset (epoch {})", epoch);
        Ok(())
    }

    /// Apply one scheduled tick, guarding against stale schedules
    ///
    /// The tick only lands when `epoch` still matches the live run; a reset
    /// or restart in between makes it stale and nothing is touched. Events
    /// are broadcast after the lock is released.
    pub fn apply_tick(&self, epoch: u64) -> Result<TickOutcome, String> {
        let mut run = self.run_state.lock()
            .map_err(|e| format!("Failed to lock run state: {}", e))?;
        if run.epoch() != epoch {
            return Ok(TickOutcome::Stale);
        }
        match run.phase() {
            Phase::Paused => Ok(TickOutcome::Inert),
            Phase::Running => {
                let events = run.tick();
                let display = run.display();
                let finished = run.phase() == Phase::Finished;
                drop(run);

                self.publish_display(display);
                for event in events {
                    if let Err(e) = self.event_tx.send(event) {
                        warn!("Failed to broadcast runner event: {}", e);
                    }
                }
                if finished {
                    info!("Sequence finished");
                    Ok(TickOutcome::Finished)
                } else {
                    Ok(TickOutcome::Applied)
                }
            }
            // Idle or Finished under an unchanged epoch: the run is over.
            _ => Ok(TickOutcome::Finished),
        }
    }

    /// Current display projection
    pub fn display(&self) -> Result<DisplayState, String> {
        self.run_state.lock()
            .map(|run| run.display())
            .map_err(|e| format!("Failed to lock run state: {}", e))
    }

    /// Whether the run at `epoch` is still live (running or paused)
    pub fn run_is_live_at(&self, epoch: u64) -> Result<bool, String> {
        self.run_state.lock()
            .map(|run| run.epoch() == epoch && run.is_live())
            .map_err(|e| format!("Failed to lock run state: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(rows: &[(&str, &str)]) -> AppState {
        let seeds = rows
            .iter()
            .map(|(name, duration)| RowSeed {
                name: name.to_string(),
                duration: duration.to_string(),
            })
            .collect();
        AppState::new(0, "127.0.0.1".to_string(), RowSet::from_seeds(seeds))
    }

    fn current_epoch(state: &AppState) -> u64 {
        state.run_state.lock().unwrap().epoch()
    }

    fn drive_to_finish(state: &AppState, epoch: u64, max_ticks: usize) -> usize {
        for n in 1..=max_ticks {
            if state.apply_tick(epoch).unwrap() == TickOutcome::Finished {
                return n;
            }
        }
        panic!("run did not finish within {} ticks", max_ticks);
    }

    #[test]
    fn start_is_gated_by_validation() {
        let state = state_with(&[("Tea", "180"), ("", "-5")]);
        match state.start_run().unwrap() {
            StartOutcome::Invalid(report) => {
                assert!(report.rows[1].name_invalid);
                assert!(report.rows[1].duration_invalid);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
        assert_eq!(state.display().unwrap().phase, Phase::Idle);
    }

    #[test]
    fn start_while_live_reports_busy() {
        let state = state_with(&[("Tea", "5")]);
        assert!(matches!(state.start_run().unwrap(), StartOutcome::Started));
        assert!(matches!(state.start_run().unwrap(), StartOutcome::Busy));
    }

    #[test]
    fn ticks_drive_the_run_to_finished() {
        let state = state_with(&[("A", "0"), ("B", "2")]);
        let mut events = state.event_tx.subscribe();
        assert!(matches!(state.start_run().unwrap(), StartOutcome::Started));
        let epoch = current_epoch(&state);

        assert_eq!(drive_to_finish(&state, epoch, 10), 3);

        assert_eq!(events.try_recv().unwrap(), RunnerEvent::EntryFinished(0));
        assert_eq!(events.try_recv().unwrap(), RunnerEvent::EntryFinished(1));
        assert_eq!(events.try_recv().unwrap(), RunnerEvent::SequenceFinished);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn stale_ticks_apply_nothing_after_reset() {
        let state = state_with(&[("Tea", "10")]);
        state.start_run().unwrap();
        let epoch = current_epoch(&state);
        state.apply_tick(epoch).unwrap();
        assert_eq!(state.display().unwrap().remaining_seconds, Some(9));

        state.reset_run().unwrap();
        assert_eq!(state.apply_tick(epoch).unwrap(), TickOutcome::Stale);
        assert_eq!(state.display().unwrap(), DisplayState::idle());
    }

    #[test]
    fn paused_ticks_are_inert() {
        let state = state_with(&[("Tea", "5")]);
        state.start_run().unwrap();
        let epoch = current_epoch(&state);
        state.apply_tick(epoch).unwrap();
        assert!(state.pause_run().unwrap());

        for _ in 0..5 {
            assert_eq!(state.apply_tick(epoch).unwrap(), TickOutcome::Inert);
        }
        assert_eq!(state.display().unwrap().remaining_seconds, Some(4));

        assert!(state.resume_run().unwrap());
        assert_eq!(state.apply_tick(epoch).unwrap(), TickOutcome::Applied);
        assert_eq!(state.display().unwrap().remaining_seconds, Some(3));
    }

    #[test]
    fn pause_and_resume_refuse_wrong_phases() {
        let state = state_with(&[("Tea", "5")]);
        assert!(!state.pause_run().unwrap());
        assert!(!state.resume_run().unwrap());
        state.start_run().unwrap();
        assert!(!state.resume_run().unwrap());
    }

    #[test]
    fn load_share_query_replaces_rows_only_on_success() {
        let state = state_with(&[("Tea", "180")]);
        assert!(!state.load_share_query("name=Tea").unwrap());
        let rows = state.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Tea");

        assert!(state
            .load_share_query("name=Eggs&time=300&name=Rice&time=600")
            .unwrap());
        let rows = state.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Eggs");
        assert_eq!(rows[1].name, "Rice");
    }

    #[test]
    fn share_query_reflects_the_current_rows() {
        let state = state_with(&[("Tea", "180"), ("", "")]);
        assert_eq!(state.share_query().unwrap(), "name=Tea&time=180");
        state
            .update_row(
                1,
                RowSeed {
                    name: "Eggs".to_string(),
                    duration: "300".to_string(),
                },
            )
            .unwrap();
        assert_eq!(
            state.share_query().unwrap(),
            "name=Tea&time=180&name=Eggs&time=300"
        );
    }

    #[test]
    fn finished_run_can_be_started_again() {
        let state = state_with(&[("A", "0")]);
        state.start_run().unwrap();
        let epoch = current_epoch(&state);
        drive_to_finish(&state, epoch, 2);
        assert!(matches!(state.start_run().unwrap(), StartOutcome::Started));
        assert_eq!(state.display().unwrap().phase, Phase::Running);
    }
}
