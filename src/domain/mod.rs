// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod errors;
pub mod leaderboard;
pub mod repositories;
pub mod score;
pub mod submission;
pub mod task;
pub mod team;

pub use errors::{EngineError, EngineResult};
pub use leaderboard::LeaderboardEntry;
pub use score::Score;
pub use submission::{Submission, SubmissionStatus};
pub use task::{Criterion, Task};
pub use team::Team;
