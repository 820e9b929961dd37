// Application services
//
// Scoring, ranking and the dashboard facade, built on the domain ports.

pub mod dashboard;
pub mod leaderboard;
pub mod scoring_engine;

// Re-export main types
pub use dashboard::{Dashboard, Overview};
pub use leaderboard::LeaderboardAggregator;
pub use scoring_engine::ScoringEngine;
