// Default event data written on first start

use chrono::{Duration, Utc};

use crate::domain::errors::EngineResult;
use crate::domain::repositories::record_store::WriteBatch;
use crate::domain::submission::Submission;
use crate::domain::task::{Criterion, Task};
use crate::domain::team::Team;

fn members(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn default_teams() -> EngineResult<Vec<Team>> {
    Ok(vec![
        Team::new("alpha", "Team Alpha", members(&["ada", "linus"]))?,
        Team::new("beta", "Team Beta", members(&["grace", "ken"]))?,
        Team::new("gamma", "Team Gamma", members(&["barbara", "dennis"]))?,
        Team::new("delta", "Team Delta", members(&["margaret", "bjarne"]))?,
    ])
}

pub fn default_tasks() -> EngineResult<Vec<Task>> {
    Ok(vec![
        Task::new(
            "prototype",
            "Prototype Build",
            vec![Criterion::new("Innovation", 30), Criterion::new("Execution", 20)],
        )?,
        Task::new(
            "pitch",
            "Pitch Deck",
            vec![
                Criterion::new("Clarity", 10),
                Criterion::new("Impact", 10),
                Criterion::new("Delivery", 5),
            ],
        )?,
        Task::new(
            "docs",
            "Technical Documentation",
            vec![Criterion::new("Completeness", 15), Criterion::new("Accuracy", 10)],
        )?,
    ])
}

/// Pending work handed in before judging opens
pub fn default_submissions() -> EngineResult<Vec<Submission>> {
    let now = Utc::now();
    let entries = [
        ("S1", "alpha", "prototype", "https://git.example.com/alpha/prototype", 6),
        ("S2", "beta", "prototype", "https://git.example.com/beta/prototype", 5),
        ("S3", "gamma", "pitch", "https://files.example.com/gamma/pitch.pdf", 4),
        ("S4", "delta", "docs", "https://docs.example.com/delta", 3),
    ];

    entries
        .into_iter()
        .map(|(id, team, task, content, hours_ago)| {
            Submission::new(id, team, task, content, now - Duration::hours(hours_ago))
                .map(|(submission, _)| submission)
        })
        .collect()
}

/// The batch `initialize_default_data` seeds into an empty store
pub fn default_batch() -> EngineResult<WriteBatch> {
    let mut batch = WriteBatch::new();
    for team in default_teams()? {
        batch = batch.put(&team)?;
    }
    for task in default_tasks()? {
        batch = batch.put(&task)?;
    }
    for submission in default_submissions()? {
        batch = batch.put(&submission)?;
    }
    Ok(batch)
}
