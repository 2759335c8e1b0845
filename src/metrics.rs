use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Constants that decide how errors feed into the score.
///
/// Live display and the final result must be computed with the same policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    /// characters that count as one word
    pub chars_per_word: f64,
    /// words per minute subtracted for every error
    pub wpm_penalty_per_error: f64,
    /// consistency points subtracted for every error
    pub consistency_penalty_per_error: f64,
}

impl ScoringPolicy {
    /// The policy used throughout the application: speed counts correct
    /// characters only and is never penalised a second time for errors.
    pub const STANDARD: ScoringPolicy = ScoringPolicy {
        chars_per_word: 5.0,
        wpm_penalty_per_error: 0.0,
        consistency_penalty_per_error: 5.0,
    };

    /// Alternative that also docks half a word per minute for each error
    pub const PENALIZED: ScoringPolicy = ScoringPolicy {
        chars_per_word: 5.0,
        wpm_penalty_per_error: 0.5,
        consistency_penalty_per_error: 5.0,
    };
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Score of a (possibly partial) typing attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResult {
    pub wpm: f64,
    pub raw_wpm: f64,
    pub accuracy: f64,
    pub errors: usize,
    pub correct_chars: usize,
    pub consistency: f64,
    pub chars_typed: usize,
    pub time_taken_secs: u64,
    pub mode: Mode,
}

impl MetricsResult {
    /// Result reported when no time has elapsed
    pub fn neutral(mode: Mode) -> Self {
        Self {
            wpm: 0.0,
            raw_wpm: 0.0,
            accuracy: 100.0,
            errors: 0,
            correct_chars: 0,
            consistency: 100.0,
            chars_typed: 0,
            time_taken_secs: 0,
            mode,
        }
    }

    /// Words counted towards `wpm`
    pub fn words_typed(&self, policy: &ScoringPolicy) -> f64 {
        self.correct_chars as f64 / policy.chars_per_word
    }

    pub fn is_perfect(&self) -> bool {
        self.errors == 0 && self.chars_typed > 0
    }
}

/// Tally of a character-by-character comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharTally {
    pub correct: usize,
    pub errors: usize,
    pub typed: usize,
}

/// Compare `typed` against `target` position by position.
///
/// Characters typed past the end of `target` are errors. Target characters
/// not reached yet are not.
pub fn tally(typed: &str, target: &str) -> CharTally {
    let mut expected = target.chars();
    let mut tally = CharTally::default();

    for c in typed.chars() {
        tally.typed += 1;
        match expected.next() {
            Some(e) if e == c => tally.correct += 1,
            _ => tally.errors += 1,
        }
    }

    tally
}

/// Score `typed` against `target` with [`ScoringPolicy::STANDARD`]
pub fn compute_metrics(typed: &str, target: &str, elapsed: Duration, mode: Mode) -> MetricsResult {
    compute_metrics_with(&ScoringPolicy::STANDARD, typed, target, elapsed, mode)
}

pub fn compute_metrics_with(
    policy: &ScoringPolicy,
    typed: &str,
    target: &str,
    elapsed: Duration,
    mode: Mode,
) -> MetricsResult {
    if elapsed.is_zero() {
        return MetricsResult::neutral(mode);
    }

    let tally = tally(typed, target);
    let minutes = elapsed.as_secs_f64() / 60.0;

    let accuracy = (100.0 * tally.correct as f64 / tally.typed.max(1) as f64).clamp(0.0, 100.0);

    let words = tally.correct as f64 / policy.chars_per_word;
    let wpm = (words / minutes - tally.errors as f64 * policy.wpm_penalty_per_error).max(0.0);
    let raw_wpm = (tally.typed as f64 / policy.chars_per_word / minutes).max(0.0);

    let consistency = (100.0 - tally.errors as f64 * policy.consistency_penalty_per_error)
        .clamp(0.0, 100.0);

    MetricsResult {
        wpm,
        raw_wpm,
        accuracy,
        errors: tally.errors,
        correct_chars: tally.correct,
        consistency,
        chars_typed: tally.typed,
        time_taken_secs: elapsed.as_secs_f64().round() as u64,
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_zero_elapsed_is_neutral() {
        let result = compute_metrics("xyz", "abc", Duration::ZERO, Mode::Time);

        assert_eq!(result, MetricsResult::neutral(Mode::Time));
        assert_eq!(result.wpm, 0.0);
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.errors, 0);
        assert_eq!(result.consistency, 100.0);
    }

    #[test]
    fn test_exact_match_one_minute() {
        let result = compute_metrics("cat", "cat", ms(60_000), Mode::Time);

        assert_eq!(result.correct_chars, 3);
        assert_eq!(result.errors, 0);
        assert_eq!(result.accuracy, 100.0);
        assert!((result.words_typed(&ScoringPolicy::STANDARD) - 0.6).abs() < 1e-9);
        assert!((result.wpm - 0.6).abs() < 1e-9);
        assert!((result.raw_wpm - 0.6).abs() < 1e-9);
        assert_eq!(result.time_taken_secs, 60);
    }

    #[test]
    fn test_single_substitution() {
        let result = compute_metrics("cap", "cat", ms(30_000), Mode::Time);

        assert_eq!(result.correct_chars, 2);
        assert_eq!(result.errors, 1);
        assert!((result.accuracy - 66.7).abs() < 0.05);
        assert_eq!(result.consistency, 95.0);
    }

    #[test]
    fn test_extra_characters_are_errors() {
        let result = compute_metrics("cats!", "cat", ms(60_000), Mode::Words);

        assert_eq!(result.correct_chars, 3);
        assert_eq!(result.errors, 2);
        assert_eq!(result.chars_typed, 5);
        assert!((result.accuracy - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_untyped_target_is_not_an_error() {
        let result = compute_metrics("ca", "cat", ms(1_000), Mode::Time);

        assert_eq!(result.errors, 0);
        assert_eq!(result.accuracy, 100.0);
    }

    #[test]
    fn test_no_overlap_has_zero_accuracy() {
        let result = compute_metrics("xyz", "abc", ms(10_000), Mode::Time);

        assert_eq!(result.errors, 3);
        assert_eq!(result.correct_chars, 0);
        assert_eq!(result.accuracy, 0.0);
        assert_eq!(result.wpm, 0.0);
        assert!(result.raw_wpm > 0.0);
    }

    #[test]
    fn test_empty_input_with_time() {
        let result = compute_metrics("", "abc", ms(5_000), Mode::Zen);

        assert_eq!(result.errors, 0);
        assert_eq!(result.accuracy, 0.0);
        assert_eq!(result.wpm, 0.0);
        assert_eq!(result.consistency, 100.0);
    }

    #[test]
    fn test_consistency_floors_at_zero() {
        let typed = "x".repeat(40);
        let result = compute_metrics(&typed, "", ms(60_000), Mode::Time);

        assert_eq!(result.errors, 40);
        assert_eq!(result.consistency, 0.0);
    }

    #[test]
    fn test_standard_policy_does_not_penalise_speed() {
        assert_eq!(ScoringPolicy::STANDARD.wpm_penalty_per_error, 0.0);
        assert_eq!(ScoringPolicy::STANDARD.consistency_penalty_per_error, 5.0);
        assert_eq!(ScoringPolicy::default(), ScoringPolicy::STANDARD);
    }

    #[test]
    fn test_penalized_policy_subtracts_per_error() {
        // 10 correct chars in 1 minute = 2 wpm, one error docks 0.5
        let result = compute_metrics_with(
            &ScoringPolicy::PENALIZED,
            "aaaaaaaaaab",
            "aaaaaaaaaa",
            ms(60_000),
            Mode::Time,
        );

        assert_eq!(result.errors, 1);
        assert!((result.wpm - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_penalized_policy_floors_at_zero() {
        let result =
            compute_metrics_with(&ScoringPolicy::PENALIZED, "xxxxx", "aaaaa", ms(60_000), Mode::Time);

        assert_eq!(result.wpm, 0.0);
    }

    #[test]
    fn test_multibyte_characters_compare_by_char() {
        let result = compute_metrics("héllo", "héllo", ms(60_000), Mode::Quote);

        assert_eq!(result.chars_typed, 5);
        assert_eq!(result.errors, 0);
        assert_eq!(result.correct_chars, 5);
    }

    #[test]
    fn test_tally_counts() {
        assert_eq!(
            tally("abxd", "abcdef"),
            CharTally {
                correct: 3,
                errors: 1,
                typed: 4
            }
        );
        assert_eq!(tally("", ""), CharTally::default());
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = compute_metrics("cat", "cat", ms(60_000), Mode::Time);
        let json = serde_json::to_value(result).unwrap();

        assert!(json.get("rawWpm").is_some());
        assert!(json.get("correctChars").is_some());
        assert_eq!(json["mode"], "time");
    }
}
