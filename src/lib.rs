// Library surface shared by the binary and the integration tests.
// Terminal rendering lives in the binary only.
pub mod app_dirs;
pub mod assets;
pub mod error;
pub mod history;
pub mod leaderboard;
pub mod metrics;
pub mod mode;
pub mod phrases;
pub mod poller;
pub mod preferences;
pub mod runtime;
pub mod service;
pub mod session;
pub mod util;

pub use error::{FastLegendError, FlResult};
pub use leaderboard::{build_leaderboard, Leaderboard, LeaderboardEntry, SessionCandidate};
pub use metrics::{compute_metrics, compute_metrics_with, MetricsResult, ScoringPolicy};
pub use mode::Mode;
