pub mod grading;
pub mod rewards;
