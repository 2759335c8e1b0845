use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Fallback duration for modes that offer no duration choices
pub const FALLBACK_DURATION: u32 = 60;

const TIME_DURATIONS: [u32; 4] = [15, 30, 60, 120];
const WORD_COUNTS: [u32; 4] = [10, 25, 50, 100];

/// Test mode. Decides how a session terminates and what its `duration` means.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// race against the clock: `duration` is a number of seconds
    #[default]
    Time,
    /// type a set number of words: `duration` is a word count
    Words,
    /// type one full quote
    Quote,
    /// no timer, finish whenever you like
    Zen,
}

impl Mode {
    /// Durations offered for this mode (seconds or words)
    pub fn durations(&self) -> &'static [u32] {
        match self {
            Mode::Time => &TIME_DURATIONS,
            Mode::Words => &WORD_COUNTS,
            Mode::Quote | Mode::Zen => &[],
        }
    }

    pub fn default_duration(&self) -> u32 {
        self.durations()
            .first()
            .copied()
            .unwrap_or(FALLBACK_DURATION)
    }

    /// Whether the session counts down from `duration` seconds
    pub fn is_timed(&self) -> bool {
        matches!(self, Mode::Time)
    }

    /// Whether completing a phrase fetches the next one instead of ending the test
    pub fn rolls_over(&self) -> bool {
        !matches!(self, Mode::Quote)
    }
}
