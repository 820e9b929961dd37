use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::leaderboard::LeaderboardEntry;
use crate::domain::repositories::record_store::{Collection, Record, RecordStore};
use crate::domain::repositories::SubmissionRepository;
use crate::domain::score::Score;
use crate::domain::submission::{Submission, SubmissionStatus};
use crate::domain::task::Task;
use crate::domain::team::Team;
use crate::infrastructure::repositories::StoreSubmissionRepository;
use crate::infrastructure::seed;

use super::leaderboard::LeaderboardAggregator;
use super::scoring_engine::ScoringEngine;

/// Headline numbers for the judges' overview page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_teams: usize,
    pub total_tasks: usize,
    pub total_submissions: usize,
    pub pending_evaluations: usize,
    pub scored_submissions: usize,
    pub rejected_submissions: usize,
}

/// The engine's functional surface, as consumed by the judges' UI
///
/// Owns one record store and wires the submission repository, scoring
/// engine and leaderboard aggregator onto it.
pub struct Dashboard {
    store: Arc<dyn RecordStore>,
    submissions: Arc<dyn SubmissionRepository>,
    engine: ScoringEngine,
    leaderboard: LeaderboardAggregator,
}

impl Dashboard {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            submissions: Arc::new(StoreSubmissionRepository::new(store.clone())),
            engine: ScoringEngine::new(store.clone()),
            leaderboard: LeaderboardAggregator::new(store.clone()),
            store,
        }
    }

    /// Seeds default teams, tasks and submissions into an empty store
    ///
    /// Safe to call on every start: existing data, including judges'
    /// progress, is never touched.
    pub async fn initialize_default_data(&self) -> EngineResult<()> {
        let seeded = self.store.seed_if_empty(seed::default_batch()?).await?;
        if seeded {
            tracing::info!("Seeded default event data");
        } else {
            tracing::debug!("Record store already populated, skipping seed");
        }
        Ok(())
    }

    /// Submissions awaiting review, oldest first
    pub async fn get_pending_submissions(&self) -> EngineResult<Vec<Submission>> {
        self.submissions.list_pending().await
    }

    pub async fn get_submission(&self, submission_id: &str) -> EngineResult<Submission> {
        self.submissions.get(submission_id).await
    }

    pub async fn submit_score(
        &self,
        submission_id: &str,
        judge_id: &str,
        criteria_scores: BTreeMap<String, Decimal>,
        comment: &str,
    ) -> EngineResult<Score> {
        self.engine
            .submit_score(submission_id, judge_id, criteria_scores, comment)
            .await
    }

    pub async fn reject_submission(&self, submission_id: &str, reason: &str) -> EngineResult<()> {
        self.engine.reject_submission(submission_id, reason).await?;
        Ok(())
    }

    pub async fn get_leaderboard(&self) -> EngineResult<Vec<LeaderboardEntry>> {
        self.leaderboard.leaderboard().await
    }

    /// Hand in work from a team; the new submission starts Pending
    pub async fn submit_work(
        &self,
        team_id: &str,
        task_id: &str,
        content_ref: &str,
    ) -> EngineResult<Submission> {
        self.submissions.create(team_id, task_id, content_ref).await
    }

    /// Judges' feedback on one submission, in the order it was given
    pub async fn scores_for_submission(&self, submission_id: &str) -> EngineResult<Vec<Score>> {
        self.submissions.get(submission_id).await?;

        let mut scores: Vec<Score> = self
            .store
            .fetch_all::<Score>()
            .await?
            .into_iter()
            .filter(|s| s.submission_id() == submission_id)
            .collect();
        scores.sort_by(|a, b| {
            a.scored_at()
                .cmp(&b.scored_at())
                .then_with(|| a.judge_id().cmp(b.judge_id()))
        });
        Ok(scores)
    }

    /// Every submission regardless of status, oldest first
    pub async fn list_submissions(&self) -> EngineResult<Vec<Submission>> {
        self.submissions.list_all().await
    }

    /// A team's submissions, oldest first
    pub async fn team_submissions(&self, team_id: &str) -> EngineResult<Vec<Submission>> {
        if self.store.fetch::<Team>(team_id).await?.is_none() {
            return Err(EngineError::not_found(Team::ENTITY, team_id));
        }
        self.submissions.list_by_team(team_id).await
    }

    pub async fn list_teams(&self) -> EngineResult<Vec<Team>> {
        Ok(self.store.fetch_all::<Team>().await?)
    }

    pub async fn list_tasks(&self) -> EngineResult<Vec<Task>> {
        Ok(self.store.fetch_all::<Task>().await?)
    }

    pub async fn overview(&self) -> EngineResult<Overview> {
        let snapshot = self.store.snapshot().await?;
        let submissions = snapshot.records::<Submission>()?;
        let count = |status: SubmissionStatus| {
            submissions.iter().filter(|s| s.status() == status).count()
        };

        Ok(Overview {
            total_teams: snapshot.len(Collection::Teams),
            total_tasks: snapshot.len(Collection::Tasks),
            total_submissions: submissions.len(),
            pending_evaluations: count(SubmissionStatus::Pending),
            scored_submissions: count(SubmissionStatus::Scored),
            rejected_submissions: count(SubmissionStatus::Rejected),
        })
    }

    /// Closes the underlying store
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.store.close().await?;
        tracing::info!("Record store closed");
        Ok(())
    }
}
