use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Number of entries shown on the leaderboard screen
pub const DISPLAY_LIMIT: usize = 10;

const ANONYMOUS_NAME: &str = "Anonymous";
const UNKNOWN_LOCATION: &str = "Unknown";

/// A player's best results as held by the leaderboard service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(alias = "wpm")]
    pub best_wpm: f64,
    #[serde(alias = "accuracy", default)]
    pub best_accuracy: f64,
    #[serde(default)]
    pub tests_completed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, location: impl Into<String>, best_wpm: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            location: location.into(),
            best_wpm,
            best_accuracy: 0.0,
            tests_completed: 0,
            join_date: None,
        }
    }

    pub fn same_identity(&self, name: &str) -> bool {
        self.name == name
    }

    /// Keep the better value of every field
    fn absorb(&mut self, other: &LeaderboardEntry) {
        self.best_wpm = self.best_wpm.max(other.best_wpm);
        self.best_accuracy = self.best_accuracy.max(other.best_accuracy);
        self.tests_completed = self.tests_completed.max(other.tests_completed);
        if self.location.is_empty() {
            self.location = other.location.clone();
        }
    }
}

/// The local user's bests, merged into the board when they qualify
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCandidate {
    pub name: String,
    pub location: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub tests_completed: u64,
}

impl SessionCandidate {
    /// At least one finished test or a non-zero speed
    pub fn qualifies(&self) -> bool {
        self.tests_completed > 0 || self.wpm > 0.0
    }

    fn display_name(&self) -> &str {
        match self.name.trim() {
            "" => ANONYMOUS_NAME,
            name => name,
        }
    }

    fn into_entry(self) -> LeaderboardEntry {
        let location = match self.location.trim() {
            "" => UNKNOWN_LOCATION.to_string(),
            location => location.to_string(),
        };
        LeaderboardEntry {
            id: None,
            name: self.display_name().to_string(),
            location,
            best_wpm: self.wpm,
            best_accuracy: self.accuracy,
            tests_completed: self.tests_completed,
            join_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub entry: LeaderboardEntry,
    pub is_current_user: bool,
}

/// Aggregates over every entry, not just the displayed ones
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeaderboardStats {
    pub players: usize,
    pub max_wpm: f64,
    pub max_accuracy: f64,
    pub total_tests: u64,
    pub average_wpm: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    ranked: Vec<RankedEntry>,
    current_user_rank: Option<usize>,
    stats: LeaderboardStats,
}

impl Leaderboard {
    pub fn ranked(&self) -> &[RankedEntry] {
        &self.ranked
    }

    pub fn top(&self, n: usize) -> &[RankedEntry] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    pub fn display(&self) -> &[RankedEntry] {
        self.top(DISPLAY_LIMIT)
    }

    pub fn current_user_rank(&self) -> Option<usize> {
        self.current_user_rank
    }

    pub fn current_user(&self) -> Option<&RankedEntry> {
        self.ranked.iter().find(|r| r.is_current_user)
    }

    pub fn stats(&self) -> &LeaderboardStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Faster first, then more accurate. Equal entries keep their input order.
fn by_wpm_then_accuracy(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.best_wpm
        .total_cmp(&a.best_wpm)
        .then_with(|| b.best_accuracy.total_cmp(&a.best_accuracy))
}

/// Merge the candidate into the snapshot, rank everything and compute aggregates
pub fn build_leaderboard(
    entries: &[LeaderboardEntry],
    candidate: Option<SessionCandidate>,
) -> Leaderboard {
    let mut pool = entries.to_vec();

    let current_name = match candidate.filter(SessionCandidate::qualifies) {
        Some(candidate) => {
            let entry = candidate.into_entry();
            let name = entry.name.clone();
            match pool.iter_mut().find(|e| e.same_identity(&name)) {
                Some(existing) => existing.absorb(&entry),
                None => pool.push(entry),
            }
            Some(name)
        }
        None => None,
    };

    let ranked = pool
        .into_iter()
        .sorted_by(by_wpm_then_accuracy)
        .enumerate()
        .map(|(idx, entry)| RankedEntry {
            rank: idx + 1,
            is_current_user: current_name
                .as_deref()
                .is_some_and(|name| entry.same_identity(name)),
            entry,
        })
        .collect::<Vec<_>>();

    let current_user_rank = ranked.iter().find(|r| r.is_current_user).map(|r| r.rank);
    let stats = compute_stats(&ranked);

    Leaderboard {
        ranked,
        current_user_rank,
        stats,
    }
}

fn compute_stats(ranked: &[RankedEntry]) -> LeaderboardStats {
    let wpms = ranked.iter().map(|r| r.entry.best_wpm).collect::<Vec<f64>>();

    LeaderboardStats {
        players: ranked.len(),
        max_wpm: wpms.iter().copied().fold(0.0, f64::max),
        max_accuracy: ranked
            .iter()
            .map(|r| r.entry.best_accuracy)
            .fold(0.0, f64::max),
        total_tests: ranked
            .iter()
            .map(|r| r.entry.tests_completed)
            .fold(0, u64::saturating_add),
        average_wpm: crate::util::mean(&wpms).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, wpm: f64) -> SessionCandidate {
        SessionCandidate {
            name: name.to_string(),
            location: "Here".to_string(),
            wpm,
            accuracy: 95.0,
            tests_completed: 1,
        }
    }

    #[test]
    fn test_empty_board() {
        let board = build_leaderboard(&[], None);

        assert!(board.ranked().is_empty());
        assert_eq!(board.current_user_rank(), None);
        assert_eq!(*board.stats(), LeaderboardStats::default());
        assert_eq!(board.stats().max_wpm, 0.0);
        assert_eq!(board.stats().total_tests, 0);
    }

    #[test]
    fn test_candidate_is_ranked_among_entries() {
        let entries = vec![
            LeaderboardEntry::new("A", "", 100.0),
            LeaderboardEntry::new("B", "", 150.0),
        ];
        let board = build_leaderboard(&entries, Some(candidate("C", 120.0)));

        let names = board
            .ranked()
            .iter()
            .map(|r| (r.entry.name.as_str(), r.rank))
            .collect::<Vec<_>>();
        assert_eq!(names, vec![("B", 1), ("C", 2), ("A", 3)]);
        assert_eq!(board.current_user_rank(), Some(2));
        assert_eq!(board.current_user().unwrap().entry.name, "C");
    }

    #[test]
    fn test_same_inputs_build_the_same_board() {
        let entries = vec![LeaderboardEntry::new("A", "", 100.0)];

        let first = build_leaderboard(&entries, Some(candidate("C", 120.0)));
        let second = build_leaderboard(&entries, Some(candidate("C", 120.0)));

        assert_eq!(first, second);
        assert_eq!(first.current_user().unwrap().entry.join_date, None);
    }

    #[test]
    fn test_total_tests_saturates() {
        let mut a = LeaderboardEntry::new("A", "", 100.0);
        a.tests_completed = u64::MAX;
        let mut b = LeaderboardEntry::new("B", "", 90.0);
        b.tests_completed = 7;

        let board = build_leaderboard(&[a, b], None);

        assert_eq!(board.stats().total_tests, u64::MAX);
    }

    #[test]
    fn test_non_qualifying_candidate_is_ignored() {
        let entries = vec![LeaderboardEntry::new("A", "", 100.0)];
        let mut c = candidate("C", 0.0);
        c.tests_completed = 0;

        let board = build_leaderboard(&entries, Some(c));

        assert_eq!(board.ranked().len(), 1);
        assert_eq!(board.current_user_rank(), None);
    }

    #[test]
    fn test_candidate_merges_with_same_name() {
        let mut existing = LeaderboardEntry::new("A", "Somewhere", 130.0);
        existing.best_accuracy = 99.0;
        existing.tests_completed = 40;
        let entries = vec![existing, LeaderboardEntry::new("B", "", 120.0)];

        let mut c = candidate("A", 140.0);
        c.accuracy = 90.0;
        c.tests_completed = 3;
        let board = build_leaderboard(&entries, Some(c));

        assert_eq!(board.ranked().len(), 2);
        let me = board.current_user().unwrap();
        assert_eq!(me.rank, 1);
        assert_eq!(me.entry.best_wpm, 140.0);
        assert_eq!(me.entry.best_accuracy, 99.0);
        assert_eq!(me.entry.tests_completed, 40);
        assert_eq!(me.entry.location, "Somewhere");
    }

    #[test]
    fn test_blank_candidate_identity_gets_placeholders() {
        let c = SessionCandidate {
            name: "  ".to_string(),
            location: String::new(),
            wpm: 50.0,
            accuracy: 90.0,
            tests_completed: 1,
        };
        let board = build_leaderboard(&[], Some(c));

        let me = board.current_user().unwrap();
        assert_eq!(me.entry.name, "Anonymous");
        assert_eq!(me.entry.location, "Unknown");
        assert_eq!(board.current_user_rank(), Some(1));
    }

    #[test]
    fn test_ties_broken_by_accuracy_then_input_order() {
        let mut a = LeaderboardEntry::new("A", "", 100.0);
        a.best_accuracy = 90.0;
        let mut b = LeaderboardEntry::new("B", "", 100.0);
        b.best_accuracy = 95.0;
        let mut c = LeaderboardEntry::new("C", "", 100.0);
        c.best_accuracy = 90.0;

        let board = build_leaderboard(&[a, b, c], None);
        let names = board
            .ranked()
            .iter()
            .map(|r| r.entry.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_display_truncates_but_stats_cover_everything() {
        let entries = (0..15)
            .map(|i| {
                let mut e = LeaderboardEntry::new(format!("P{i}"), "", 50.0 + i as f64);
                e.tests_completed = 2;
                e.best_accuracy = 80.0 + i as f64;
                e
            })
            .collect::<Vec<_>>();

        let board = build_leaderboard(&entries, None);

        assert_eq!(board.display().len(), DISPLAY_LIMIT);
        assert_eq!(board.ranked().len(), 15);
        assert_eq!(board.stats().players, 15);
        assert_eq!(board.stats().total_tests, 30);
        assert_eq!(board.stats().max_wpm, 64.0);
        assert_eq!(board.stats().max_accuracy, 94.0);
        assert_eq!(board.stats().average_wpm, 57.0);
        assert_eq!(board.top(100).len(), 15);
    }

    #[test]
    fn test_entry_accepts_short_field_names() {
        let json = r#"{"name":"A","location":"X","wpm":101.5,"accuracy":97.2,"testsCompleted":3,"joinDate":"2024-01-15"}"#;
        let entry: LeaderboardEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.best_wpm, 101.5);
        assert_eq!(entry.best_accuracy, 97.2);
        assert_eq!(entry.tests_completed, 3);
        assert_eq!(entry.join_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }
}
