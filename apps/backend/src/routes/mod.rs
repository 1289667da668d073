pub mod auth;
pub mod leaderboard;
pub mod learner;
pub mod progress;
