use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Where a scan currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Detecting,
    Recognizing { index: usize, label: String },
    Extracting,
    Done,
    Failed { message: String },
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed { .. })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => f.write_str("Idle"),
            Stage::Detecting => f.write_str("Detecting document type"),
            Stage::Recognizing { index, label } => {
                write!(f, "Recognizing region {} ({label})", index + 1)
            }
            Stage::Extracting => f.write_str("Extracting fields"),
            Stage::Done => f.write_str("Done"),
            Stage::Failed { message } => write!(f, "Failed: {message}"),
        }
    }
}

/// Snapshot published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineState {
    pub stage: Stage,
    /// 0–100, never decreasing within a run.
    pub progress_percent: u8,
    /// Incremented at the start of every run.
    pub run: u64,
}

/// Weighted stages laid out over `[start, end]` percent.
#[derive(Debug, Clone)]
pub struct ProgressSchedule {
    start: u8,
    end: u8,
    weights: Vec<u32>,
}

impl ProgressSchedule {
    pub fn new(start: u8, end: u8, weights: Vec<u32>) -> Self {
        let end = end.min(100);
        Self { start: start.min(end), end, weights }
    }

    fn total(&self) -> u32 {
        self.weights.iter().sum()
    }

    /// Overall percent when `stage` is `inner` percent complete. Stages past
    /// the end of the schedule map to `end`.
    pub fn percent(&self, stage: usize, inner: u8) -> u8 {
        let total = self.total();
        if total == 0 || stage >= self.weights.len() {
            return self.end;
        }
        let before: u32 = self.weights[..stage].iter().sum();
        let done = before as f64 + self.weights[stage] as f64 * inner.min(100) as f64 / 100.0;
        let span = (self.end - self.start) as f64;
        (self.start as f64 + span * done / total as f64).floor() as u8
    }

    /// Percent at which `stage` ends.
    pub fn stage_end(&self, stage: usize) -> u8 {
        self.percent(stage, 100)
    }
}

/// Owns the published [`PipelineState`]. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    tx: Arc<watch::Sender<PipelineState>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PipelineState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PipelineState {
        self.tx.borrow().clone()
    }

    /// Start a new run at 0 % and return its id.
    pub fn begin(&self) -> u64 {
        let mut run = 0;
        self.tx.send_modify(|state| {
            run = state.run + 1;
            *state = PipelineState { stage: Stage::Detecting, progress_percent: 0, run };
        });
        run
    }

    /// Move `run` into `stage`, raising progress to at least `percent`.
    pub fn enter(&self, run: u64, stage: Stage, percent: u8) {
        self.tx.send_if_modified(|state| {
            if state.run != run || state.stage.is_terminal() {
                return false;
            }
            debug!(run, %stage, percent, "pipeline stage");
            state.stage = stage;
            state.progress_percent = state.progress_percent.max(percent.min(100));
            true
        });
    }

    /// Raise progress within the current stage. Late reports from a run that
    /// already ended are dropped.
    pub fn advance(&self, run: u64, percent: u8) {
        self.tx.send_if_modified(|state| {
            let percent = percent.min(100);
            if state.run != run || state.stage.is_terminal() || percent <= state.progress_percent {
                return false;
            }
            state.progress_percent = percent;
            true
        });
    }

    pub fn complete(&self, run: u64) {
        self.tx.send_if_modified(|state| {
            if state.run != run {
                return false;
            }
            state.stage = Stage::Done;
            state.progress_percent = 100;
            true
        });
    }

    pub fn fail(&self, run: u64, message: String) {
        self.tx.send_if_modified(|state| {
            if state.run != run {
                return false;
            }
            state.stage = Stage::Failed { message };
            true
        });
    }

    /// After `delay`, drop a finished `run` back to idle at 0 %, unless a newer
    /// run has started in the meantime.
    pub fn schedule_reset(&self, run: u64, delay: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send_if_modified(|state| {
                if state.run != run || !state.stage.is_terminal() {
                    return false;
                }
                state.stage = Stage::Idle;
                state.progress_percent = 0;
                true
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_weighted() {
        let s = ProgressSchedule::new(0, 100, vec![20, 80]);
        assert_eq!(s.percent(0, 0), 0);
        assert_eq!(s.percent(0, 50), 10);
        assert_eq!(s.stage_end(0), 20);
        assert_eq!(s.percent(1, 50), 60);
        assert_eq!(s.stage_end(1), 100);
        assert_eq!(s.percent(7, 0), 100);
    }

    #[test]
    fn schedule_rescales_into_range() {
        let s = ProgressSchedule::new(19, 100, vec![40, 40, 5]);
        assert_eq!(s.percent(0, 0), 19);
        assert!(s.stage_end(0) < s.stage_end(1));
        assert_eq!(s.stage_end(2), 100);
    }

    #[test]
    fn schedule_is_monotonic_in_stage_and_inner() {
        let s = ProgressSchedule::new(10, 100, vec![3, 7, 1, 9]);
        let mut last = 0;
        for stage in 0..4 {
            for inner in (0..=100).step_by(10) {
                let p = s.percent(stage, inner);
                assert!(p >= last, "stage {stage} inner {inner}: {p} < {last}");
                last = p;
            }
        }
    }

    #[test]
    fn progress_never_decreases() {
        let tracker = ProgressTracker::new();
        let run = tracker.begin();
        tracker.advance(run, 40);
        tracker.advance(run, 30);
        assert_eq!(tracker.snapshot().progress_percent, 40);
        tracker.enter(run, Stage::Extracting, 10);
        assert_eq!(tracker.snapshot().progress_percent, 40);
        assert_eq!(tracker.snapshot().stage, Stage::Extracting);
    }

    #[test]
    fn stale_run_updates_are_ignored() {
        let tracker = ProgressTracker::new();
        let old = tracker.begin();
        tracker.fail(old, "boom".into());
        let new = tracker.begin();
        tracker.advance(old, 90);
        tracker.enter(old, Stage::Extracting, 90);
        let state = tracker.snapshot();
        assert_eq!(state.run, new);
        assert_eq!(state.stage, Stage::Detecting);
        assert_eq!(state.progress_percent, 0);
    }

    #[test]
    fn terminal_state_ignores_progress() {
        let tracker = ProgressTracker::new();
        let run = tracker.begin();
        tracker.advance(run, 30);
        tracker.fail(run, "engine".into());
        tracker.advance(run, 80);
        let state = tracker.snapshot();
        assert_eq!(state.progress_percent, 30);
        assert_eq!(state.stage.to_string(), "Failed: engine");
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let tracker = ProgressTracker::new();
        let run = tracker.begin();
        tracker.complete(run);
        tracker.schedule_reset(run, Duration::from_millis(10));
        let mut rx = tracker.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.stage == Stage::Idle))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracker.snapshot().progress_percent, 0);
    }

    #[tokio::test]
    async fn reset_skipped_when_new_run_started() {
        let tracker = ProgressTracker::new();
        let run = tracker.begin();
        tracker.complete(run);
        tracker.schedule_reset(run, Duration::from_millis(10));
        let next = tracker.begin();
        tracker.advance(next, 25);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = tracker.snapshot();
        assert_eq!(state.stage, Stage::Detecting);
        assert_eq!(state.progress_percent, 25);
    }
}
