use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{ensure_present, EngineResult};
use super::repositories::record_store::{Collection, Record};

/// A competing team
///
/// Immutable once created; membership edits happen outside the engine.
///
/// # Example
/// ```
/// use judgeboard_api::domain::Team;
///
/// let team = Team::new("alpha", "Team Alpha", vec!["ada".to_string()]).expect("valid team");
/// assert_eq!(team.name(), "Team Alpha");
/// assert_eq!(team.members(), ["ada".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    id: String,
    name: String,
    members: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new team
    ///
    /// # Business Rules Enforced
    /// - Id and name must not be empty
    /// - Member identifiers must not be empty
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        members: Vec<String>,
    ) -> EngineResult<Self> {
        let team = Self {
            id: id.into(),
            name: name.into(),
            members,
            created_at: Utc::now(),
        };
        team.validate()?;
        Ok(team)
    }

    fn validate(&self) -> EngineResult<()> {
        ensure_present("team.id", &self.id)?;
        ensure_present("team.name", &self.name)?;
        for member in &self.members {
            ensure_present("team.members", member)?;
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in the order they joined
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Team {
    const COLLECTION: Collection = Collection::Teams;
    const ENTITY: &'static str = "Team";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn check_schema(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())
    }
}
