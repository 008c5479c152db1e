//! Sequential run state machine

use serde::{Deserialize, Serialize};

/// One named countdown captured into a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    pub name: String,
    pub seconds: u64,
}

/// Where the runner currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Events emitted by the runner for the alert collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// The entry at this index counted down to zero
    EntryFinished(usize),
    /// The last entry finished; the whole sequence is done
    SequenceFinished,
}

/// Why a start request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// Nothing to run; the runner stays idle
    EmptySequence,
    /// A run is already live (running or paused)
    RunActive,
}

/// Read-only projection of the runner for the display surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    pub phase: Phase,
    pub entry_name: Option<String>,
    pub entry_index: Option<usize>,
    pub remaining_seconds: Option<u64>,
}

impl DisplayState {
    /// The empty idle display
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            entry_name: None,
            entry_index: None,
            remaining_seconds: None,
        }
    }
}

/// The sequential countdown state machine
///
/// Owns an immutable snapshot of the timer specs for the duration of a run.
/// `current_index` only increases; `remaining_seconds` only decreases while
/// running and is never observable below zero. The `epoch` stamp changes on
/// every start and reset so a tick scheduled for an earlier run can prove it
/// is stale before touching anything.
#[derive(Debug, Clone)]
pub struct RunState {
    sequence: Vec<TimerSpec>,
    current_index: usize,
    remaining_seconds: u64,
    phase: Phase,
    epoch: u64,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            sequence: Vec::new(),
            current_index: 0,
            remaining_seconds: 0,
            phase: Phase::Idle,
            epoch: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a run is live (ticking or paused mid-sequence)
    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Paused)
    }

    /// Capture `specs` and enter the first entry
    ///
    /// The snapshot must already be validated; the runner itself only
    /// refuses an empty sequence or a start over a live run.
    pub fn start(&mut self, specs: Vec<TimerSpec>) -> Result<(), StartError> {
        if self.is_live() {
            return Err(StartError::RunActive);
        }
        if specs.is_empty() {
            return Err(StartError::EmptySequence);
        }
        self.remaining_seconds = specs[0].seconds;
        self.sequence = specs;
        self.current_index = 0;
        self.phase = Phase::Running;
        self.epoch += 1;
        Ok(())
    }

    /// Apply one second of progress
    ///
    /// Does nothing unless running. When the current entry reaches zero it
    /// completes on this tick: its finished event is emitted and the next
    /// entry (if any) is entered with its full duration, so even a
    /// zero-second entry consumes exactly one tick before signalling.
    pub fn tick(&mut self) -> Vec<RunnerEvent> {
        if self.phase != Phase::Running {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            events.push(RunnerEvent::EntryFinished(self.current_index));
            self.current_index += 1;
            match self.sequence.get(self.current_index) {
                Some(next) => {
                    self.remaining_seconds = next.seconds;
                }
                None => {
                    self.phase = Phase::Finished;
                    events.push(RunnerEvent::SequenceFinished);
                }
            }
        }
        events
    }

    /// Suspend ticking; only meaningful while running
    ///
    /// Returns whether the transition happened. Ticks arriving while paused
    /// are inert and are not replayed on resume.
    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = Phase::Paused;
        true
    }

    /// Continue ticking from the remaining value held at pause time
    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }
        self.phase = Phase::Running;
        true
    }

    /// Discard the run and return to idle, from any phase
    pub fn reset(&mut self) {
        self.sequence.clear();
        self.current_index = 0;
        self.remaining_seconds = 0;
        self.phase = Phase::Idle;
        self.epoch += 1;
    }

    /// Current read-only projection for rendering
    pub fn display(&self) -> DisplayState {
        match self.sequence.get(self.current_index) {
            Some(entry) if self.is_live() => DisplayState {
                phase: self.phase,
                entry_name: Some(entry.name.clone()),
                entry_index: Some(self.current_index),
                remaining_seconds: Some(self.remaining_seconds),
            },
            _ => DisplayState {
                phase: self.phase,
                entry_name: None,
                entry_index: None,
                remaining_seconds: None,
            },
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, seconds: u64) -> TimerSpec {
        TimerSpec {
            name: name.to_string(),
            seconds,
        }
    }

    #[test]
    fn start_with_empty_sequence_is_refused() {
        let mut run = RunState::new();
        assert_eq!(run.start(Vec::new()), Err(StartError::EmptySequence));
        assert_eq!(run.phase(), Phase::Idle);
    }

    #[test]
    fn start_enters_the_first_entry() {
        let mut run = RunState::new();
        run.start(vec![spec("Tea", 180)]).unwrap();
        let display = run.display();
        assert_eq!(display.phase, Phase::Running);
        assert_eq!(display.entry_name.as_deref(), Some("Tea"));
        assert_eq!(display.remaining_seconds, Some(180));
    }

    #[test]
    fn start_over_a_live_run_is_refused() {
        let mut run = RunState::new();
        run.start(vec![spec("a", 5)]).unwrap();
        assert_eq!(run.start(vec![spec("b", 5)]), Err(StartError::RunActive));
        run.pause();
        assert_eq!(run.start(vec![spec("b", 5)]), Err(StartError::RunActive));
    }

    #[test]
    fn zero_then_two_second_sequence_signal_schedule() {
        let mut run = RunState::new();
        run.start(vec![spec("A", 0), spec("B", 2)]).unwrap();

        // A completes on the very first tick, before B starts counting.
        let events = run.tick();
        assert_eq!(events, vec![RunnerEvent::EntryFinished(0)]);
        assert_eq!(run.display().entry_name.as_deref(), Some("B"));
        assert_eq!(run.display().remaining_seconds, Some(2));

        assert!(run.tick().is_empty());
        assert_eq!(run.display().remaining_seconds, Some(1));

        let events = run.tick();
        assert_eq!(
            events,
            vec![RunnerEvent::EntryFinished(1), RunnerEvent::SequenceFinished]
        );
        assert_eq!(run.phase(), Phase::Finished);
    }

    #[test]
    fn entries_advance_with_no_gap() {
        let mut run = RunState::new();
        run.start(vec![spec("a", 1), spec("b", 3)]).unwrap();
        assert_eq!(run.tick(), vec![RunnerEvent::EntryFinished(0)]);
        assert_eq!(run.display().remaining_seconds, Some(3));
        assert!(run.tick().is_empty());
        assert_eq!(run.display().remaining_seconds, Some(2));
    }

    #[test]
    fn pause_holds_the_remaining_value() {
        let mut run = RunState::new();
        run.start(vec![spec("a", 6)]).unwrap();
        run.tick();
        assert_eq!(run.display().remaining_seconds, Some(5));
        assert!(run.pause());

        // Inert ticks while paused: nothing changes, nothing is replayed.
        for _ in 0..10 {
            assert!(run.tick().is_empty());
        }
        assert_eq!(run.display().remaining_seconds, Some(5));

        assert!(run.resume());
        assert_eq!(run.display().remaining_seconds, Some(5));
        run.tick();
        assert_eq!(run.display().remaining_seconds, Some(4));
    }

    #[test]
    fn pause_and_resume_only_apply_in_their_phase() {
        let mut run = RunState::new();
        assert!(!run.pause());
        assert!(!run.resume());
        run.start(vec![spec("a", 2)]).unwrap();
        assert!(!run.resume());
        run.pause();
        assert!(!run.pause());
    }

    #[test]
    fn reset_returns_to_idle_and_silences_ticks() {
        let mut run = RunState::new();
        run.start(vec![spec("a", 5), spec("b", 5)]).unwrap();
        run.tick();
        run.reset();
        assert_eq!(run.phase(), Phase::Idle);
        assert_eq!(run.display(), DisplayState::idle());
        assert!(run.tick().is_empty());
        assert_eq!(run.display(), DisplayState::idle());
    }

    #[test]
    fn reset_and_start_bump_the_epoch() {
        let mut run = RunState::new();
        let e0 = run.epoch();
        run.start(vec![spec("a", 1)]).unwrap();
        let e1 = run.epoch();
        assert!(e1 > e0);
        run.reset();
        assert!(run.epoch() > e1);
    }

    #[test]
    fn remaining_never_observable_below_zero() {
        let mut run = RunState::new();
        run.start(vec![spec("a", 0)]).unwrap();
        run.tick();
        // Finished; further ticks keep the projection clamped and inert.
        run.tick();
        assert_eq!(run.display().remaining_seconds, None);
        assert_eq!(run.phase(), Phase::Finished);
    }

    #[test]
    fn finished_machine_accepts_a_fresh_start() {
        let mut run = RunState::new();
        run.start(vec![spec("a", 0)]).unwrap();
        run.tick();
        assert_eq!(run.phase(), Phase::Finished);
        run.start(vec![spec("b", 2)]).unwrap();
        assert_eq!(run.display().entry_name.as_deref(), Some("b"));
        assert_eq!(run.display().remaining_seconds, Some(2));
    }

    #[test]
    fn signal_counts_for_a_three_entry_run() {
        let mut run = RunState::new();
        run.start(vec![spec("a", 1), spec("b", 0), spec("c", 2)])
            .unwrap();
        let mut entry_finished = 0;
        let mut sequence_finished = 0;
        while run.phase() == Phase::Running {
            for event in run.tick() {
                match event {
                    RunnerEvent::EntryFinished(_) => entry_finished += 1,
                    RunnerEvent::SequenceFinished => sequence_finished += 1,
                }
            }
        }
        assert_eq!(entry_finished, 3);
        assert_eq!(sequence_finished, 1);
    }
}
