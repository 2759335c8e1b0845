use crate::metrics::{compute_metrics_with, MetricsResult, ScoringPolicy};
use crate::mode::Mode;
use crate::phrases::{DurationBucket, PhraseProvider};
use std::time::Duration;
use tracing::{debug, info};

/// Immutable settings a session is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub mode: Mode,
    /// seconds in time mode, words in words mode, bucket hint otherwise
    pub duration: u32,
    pub policy: ScoringPolicy,
}

impl SessionConfig {
    pub fn new(mode: Mode, duration: u32) -> Self {
        Self {
            mode,
            duration,
            policy: ScoringPolicy::STANDARD,
        }
    }

    pub fn bucket(&self) -> DurationBucket {
        DurationBucket::from_secs(self.duration)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.mode
            .is_timed()
            .then(|| Duration::from_secs(self.duration as u64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// waiting for the first keystroke
    Ready,
    Running,
    Paused,
    Finished,
}

/// What happened to a keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Accepted,
    /// the phrase was completed and the next one is now the target
    SegmentCompleted,
    /// the keystroke ended the test
    Finished,
    /// paused or finished, the keystroke was dropped
    Rejected,
}

/// Everything that changes while typing. Replaced wholesale on reset.
#[derive(Debug, Clone)]
struct SessionState {
    phase: Phase,
    target: String,
    typed: String,
    completed_typed: String,
    completed_target: String,
    completed_words: usize,
    segments_completed: usize,
    elapsed: Duration,
}

impl SessionState {
    fn fresh(target: String) -> Self {
        Self {
            phase: Phase::Ready,
            target,
            typed: String::new(),
            completed_typed: String::new(),
            completed_target: String::new(),
            completed_words: 0,
            segments_completed: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// A typing test in progress
#[derive(Debug)]
pub struct TypingSession {
    config: SessionConfig,
    provider: Box<dyn PhraseProvider + Send>,
    first_target: String,
    state: SessionState,
}

impl TypingSession {
    pub fn new(config: SessionConfig, provider: Box<dyn PhraseProvider + Send>) -> Self {
        let target = provider.phrase(config.bucket());
        Self {
            config,
            provider,
            first_target: target.clone(),
            state: SessionState::fresh(target),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn target(&self) -> &str {
        &self.state.target
    }

    pub fn typed(&self) -> &str {
        &self.state.typed
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.state.elapsed
    }

    pub fn segments_completed(&self) -> usize {
        self.state.segments_completed
    }

    pub fn has_started(&self) -> bool {
        self.state.phase != Phase::Ready
    }

    pub fn is_paused(&self) -> bool {
        self.state.phase == Phase::Paused
    }

    pub fn has_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    /// Time left in time mode
    pub fn remaining(&self) -> Option<Duration> {
        self.config
            .time_limit()
            .map(|limit| limit.saturating_sub(self.state.elapsed))
    }

    /// Fully typed words, counting completed phrases and finished words of the current one
    pub fn words_typed(&self) -> usize {
        let typed = &self.state.typed;
        let mut current = typed.split_whitespace().count();
        if !typed.ends_with(char::is_whitespace) {
            current = current.saturating_sub(1);
        }
        self.state.completed_words + current
    }

    /// Type one character at the end of the input
    pub fn write(&mut self, c: char) -> InputOutcome {
        match self.state.phase {
            Phase::Paused | Phase::Finished => return InputOutcome::Rejected,
            Phase::Ready => self.state.phase = Phase::Running,
            Phase::Running => {}
        }

        self.state.typed.push(c);

        let outcome = if self.segment_is_complete() {
            self.complete_segment()
        } else {
            InputOutcome::Accepted
        };

        if outcome != InputOutcome::Finished && self.word_goal_reached() {
            self.finish_now();
            return InputOutcome::Finished;
        }

        outcome
    }

    /// Remove the last typed character
    pub fn backspace(&mut self) -> bool {
        if self.state.phase != Phase::Running {
            return false;
        }
        self.state.typed.pop().is_some()
    }

    /// Advance the clock. Returns true when the tick ended the test.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if self.state.phase != Phase::Running {
            return false;
        }

        self.state.elapsed += delta;

        if let Some(limit) = self.config.time_limit() {
            if self.state.elapsed >= limit {
                self.state.elapsed = limit;
                self.finish_now();
                return true;
            }
        }
        false
    }

    pub fn pause(&mut self) {
        if self.state.phase == Phase::Running {
            self.state.phase = Phase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state.phase == Phase::Paused {
            self.state.phase = Phase::Running;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            Phase::Ready | Phase::Finished => {}
        }
    }

    /// End the test now, e.g. zen mode or an early stop
    pub fn finish(&mut self) -> MetricsResult {
        if !self.has_finished() {
            self.finish_now();
        }
        self.metrics()
    }

    /// Start over with a new phrase
    pub fn reset(&mut self) {
        let target = self.provider.phrase(self.config.bucket());
        self.first_target = target.clone();
        self.state = SessionState::fresh(target);
    }

    /// Start over with the phrase the session began with
    pub fn restart(&mut self) {
        self.state = SessionState::fresh(self.first_target.clone());
    }

    /// Score of everything typed so far, including completed phrases
    pub fn metrics(&self) -> MetricsResult {
        let typed = format!("{}{}", self.state.completed_typed, self.state.typed);
        let target = format!("{}{}", self.state.completed_target, self.state.target);
        compute_metrics_with(
            &self.config.policy,
            &typed,
            &target,
            self.state.elapsed,
            self.config.mode,
        )
    }

    /// Final score, only once the test has ended
    pub fn result(&self) -> Option<MetricsResult> {
        self.has_finished().then(|| self.metrics())
    }

    fn segment_is_complete(&self) -> bool {
        let typed = self.state.typed.trim();
        !typed.is_empty() && typed == self.state.target.trim()
    }

    fn complete_segment(&mut self) -> InputOutcome {
        let finished = self.state.target.trim().to_string();
        self.state.completed_words += finished.split_whitespace().count();
        self.state.completed_typed.push_str(&finished);
        self.state.completed_target.push_str(&finished);
        self.state.segments_completed += 1;
        self.state.typed.clear();

        debug!(
            segments = self.state.segments_completed,
            words = self.state.completed_words,
            "segment completed"
        );

        if !self.config.mode.rolls_over() {
            self.finish_now();
            return InputOutcome::Finished;
        }

        self.state.target = self.provider.phrase(self.config.bucket());
        InputOutcome::SegmentCompleted
    }

    fn word_goal_reached(&self) -> bool {
        self.config.mode == Mode::Words && self.words_typed() >= self.config.duration as usize
    }

    fn finish_now(&mut self) {
        self.state.phase = Phase::Finished;
        info!(
            mode = %self.config.mode,
            elapsed_ms = self.state.elapsed.as_millis() as u64,
            segments = self.state.segments_completed,
            "typing test finished"
        );
    }
}
