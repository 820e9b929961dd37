pub mod dashboard;
pub mod leaderboard;
pub mod submissions;
pub mod teams;
