use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::errors::EngineResult;
use crate::domain::leaderboard::LeaderboardEntry;
use crate::domain::repositories::record_store::{RecordStore, Snapshot};
use crate::domain::score::Score;
use crate::domain::submission::{Submission, SubmissionStatus};
use crate::domain::team::Team;

/// Decimal places shown for a team's total
const DISPLAY_DP: u32 = 2;

/// Decimal places compared when ordering teams; absorbs division residue
/// such as three thirds summing to 0.999...
const COMPARISON_DP: u32 = 12;

/// Combines several judges' totals for one submission
///
/// Exact arithmetic mean; no scores means zero.
pub fn effective_score(totals: &[Decimal]) -> Decimal {
    if totals.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = totals.iter().copied().sum();
    sum / Decimal::from(totals.len())
}

#[derive(Debug)]
struct Standing {
    total: Decimal,
    /// Submission time of the team's most recent scored submission
    latest_scored: DateTime<Utc>,
}

impl Standing {
    fn ranking_total(&self) -> Decimal {
        self.total.round_dp(COMPARISON_DP)
    }
}

fn compare_standings(a: (&String, &Standing), b: (&String, &Standing)) -> Ordering {
    b.1.ranking_total()
        .cmp(&a.1.ranking_total())
        .then_with(|| a.1.latest_scored.cmp(&b.1.latest_scored))
        .then_with(|| a.0.cmp(b.0))
}

/// Derives ranked standings from a consistent snapshot
///
/// Only teams with at least one Scored submission are ranked. Pending and
/// Rejected submissions contribute nothing.
pub fn compute_leaderboard(snapshot: &Snapshot) -> EngineResult<Vec<LeaderboardEntry>> {
    let teams: HashMap<String, Team> = snapshot
        .records::<Team>()?
        .into_iter()
        .map(|t| (t.id().to_string(), t))
        .collect();

    let mut totals_by_submission: HashMap<String, Vec<Decimal>> = HashMap::new();
    for score in snapshot.records::<Score>()? {
        totals_by_submission
            .entry(score.submission_id().to_string())
            .or_default()
            .push(score.total_score());
    }

    let mut standings: BTreeMap<String, Standing> = BTreeMap::new();
    for submission in snapshot.records::<Submission>()? {
        if submission.status() != SubmissionStatus::Scored {
            continue;
        }
        let effective = totals_by_submission
            .get(submission.id())
            .map(|totals| effective_score(totals))
            .unwrap_or(Decimal::ZERO);

        let standing = standings
            .entry(submission.team_id().to_string())
            .or_insert(Standing {
                total: Decimal::ZERO,
                latest_scored: submission.submitted_at(),
            });
        standing.total += effective;
        standing.latest_scored = standing.latest_scored.max(submission.submitted_at());
    }

    let mut ordered: Vec<(&String, &Standing)> = standings.iter().collect();
    ordered.sort_by(|a, b| compare_standings(*a, *b));

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(ordered.len());
    let mut previous: Option<(Decimal, u32)> = None;
    for (position, (team_id, standing)) in ordered.into_iter().enumerate() {
        let total = standing.ranking_total();
        let rank = match previous {
            Some((prev_total, prev_rank)) if prev_total == total => prev_rank,
            _ => position as u32 + 1,
        };
        previous = Some((total, rank));
        let team_name = teams
            .get(team_id.as_str())
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| team_id.clone());

        entries.push(LeaderboardEntry {
            team_id: team_id.clone(),
            team_name,
            total_score: standing.total.round_dp(DISPLAY_DP).normalize(),
            rank,
        });
    }

    Ok(entries)
}

/// Read-only view over scores; never writes to the store
pub struct LeaderboardAggregator {
    store: Arc<dyn RecordStore>,
}

impl LeaderboardAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Recomputes the leaderboard from current store state
    pub async fn leaderboard(&self) -> EngineResult<Vec<LeaderboardEntry>> {
        let snapshot = self.store.snapshot().await?;
        let entries = compute_leaderboard(&snapshot)?;
        tracing::debug!(teams = entries.len(), "Computed leaderboard");
        Ok(entries)
    }
}
