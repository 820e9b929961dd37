// Request extractors shared by handlers

pub mod judge;

pub use judge::{JudgeId, JUDGE_ID_HEADER};
