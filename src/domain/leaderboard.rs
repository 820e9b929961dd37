use rust_decimal::Decimal;
use serde::Serialize;

/// A team's standing, derived on every leaderboard query and never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub team_id: String,
    pub team_name: String,
    pub total_score: Decimal,
    /// Standard competition rank: ties share a rank, the next rank skips
    pub rank: u32,
}
