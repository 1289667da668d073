//! Per-topic progression state machine.
//!
//! Transitions are monotone: flags only ever flip to true and the solved
//! counter only grows, so a retry or replay can never regress a learner.
//! The completion gate is video watched, quiz passed, and every problem
//! solved; topics with no problems complete on the quiz alone.

use serde::{Deserialize, Serialize};

use crate::error::{ProgressionError, Result};
use crate::types::TopicState;

/// Progress flags for one (learner, topic) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub video_watched: bool,
    pub quiz_passed: bool,
    pub problems_completed: u32,
}

/// Outcome of applying a quiz score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub passed: bool,
    /// True only when this attempt flipped quiz_passed from false to true.
    pub newly_passed: bool,
}

impl TopicProgress {
    /// Mark the topic video as watched. Returns true if this was the
    /// first watch.
    pub fn mark_video_watched(&mut self) -> bool {
        let changed = !self.video_watched;
        self.video_watched = true;
        changed
    }

    /// Apply an integer-percent quiz score against the pass threshold.
    ///
    /// A score below the threshold leaves all state unchanged. A passing
    /// retake of an already-passed quiz reports `newly_passed: false` so
    /// the caller does not re-award.
    pub fn apply_quiz_score(&mut self, score: u32, threshold: u32) -> Result<QuizOutcome> {
        if score > 100 {
            return Err(ProgressionError::InvalidScore(score));
        }

        let passed = score >= threshold;
        let newly_passed = passed && !self.quiz_passed;
        if passed {
            self.quiz_passed = true;
        }

        Ok(QuizOutcome { passed, newly_passed })
    }

    /// Record one solved problem, capped at the topic's total.
    pub fn record_problem_solved(&mut self, total_problems: u32) {
        if self.problems_completed < total_problems {
            self.problems_completed += 1;
        }
    }

    /// Completion gate: video watched, quiz passed, all problems solved.
    pub fn is_complete(&self, total_problems: u32) -> bool {
        self.video_watched && self.quiz_passed && self.problems_completed >= total_problems
    }

    /// Derive the display state from the stored flags.
    pub fn state(&self, total_problems: u32) -> TopicState {
        if self.is_complete(total_problems) {
            TopicState::TopicComplete
        } else if self.quiz_passed {
            if self.problems_completed > 0 {
                TopicState::ProblemsInProgress
            } else {
                TopicState::QuizPassed
            }
        } else if self.video_watched {
            TopicState::VideoWatched
        } else {
            TopicState::NotStarted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const THRESHOLD: u32 = 70;

    #[test]
    fn fresh_topic_is_not_started() {
        let progress = TopicProgress::default();
        assert_eq!(progress.state(2), TopicState::NotStarted);
        assert!(!progress.is_complete(2));
    }

    #[test]
    fn video_watch_is_monotone() {
        let mut progress = TopicProgress::default();
        assert!(progress.mark_video_watched());
        assert!(!progress.mark_video_watched());
        assert!(progress.video_watched);
        assert_eq!(progress.state(2), TopicState::VideoWatched);
    }

    #[test]
    fn failing_quiz_leaves_state_unchanged() {
        let mut progress = TopicProgress::default();
        progress.mark_video_watched();
        let outcome = progress.apply_quiz_score(65, THRESHOLD).unwrap();
        assert!(!outcome.passed);
        assert!(!outcome.newly_passed);
        assert!(!progress.quiz_passed);
        assert_eq!(progress.state(2), TopicState::VideoWatched);
    }

    #[test]
    fn threshold_is_a_strict_integer_compare() {
        let mut progress = TopicProgress::default();
        assert!(!progress.apply_quiz_score(69, THRESHOLD).unwrap().passed);
        assert!(progress.apply_quiz_score(70, THRESHOLD).unwrap().passed);
    }

    #[test]
    fn quiz_retake_does_not_re_pass() {
        let mut progress = TopicProgress::default();
        progress.mark_video_watched();
        let first = progress.apply_quiz_score(80, THRESHOLD).unwrap();
        assert!(first.newly_passed);
        let retake = progress.apply_quiz_score(95, THRESHOLD).unwrap();
        assert!(retake.passed);
        assert!(!retake.newly_passed);
    }

    #[test]
    fn failing_retake_never_regresses_a_pass() {
        let mut progress = TopicProgress::default();
        progress.apply_quiz_score(80, THRESHOLD).unwrap();
        let retake = progress.apply_quiz_score(30, THRESHOLD).unwrap();
        assert!(!retake.passed);
        assert!(progress.quiz_passed);
    }

    #[test]
    fn score_over_hundred_is_rejected() {
        let mut progress = TopicProgress::default();
        assert_eq!(
            progress.apply_quiz_score(101, THRESHOLD),
            Err(ProgressionError::InvalidScore(101))
        );
    }

    #[test]
    fn problems_completed_is_capped() {
        let mut progress = TopicProgress::default();
        for _ in 0..5 {
            progress.record_problem_solved(2);
        }
        assert_eq!(progress.problems_completed, 2);
    }

    #[test]
    fn completion_gate_requires_all_three() {
        let mut progress = TopicProgress::default();
        progress.mark_video_watched();
        progress.apply_quiz_score(80, THRESHOLD).unwrap();
        progress.record_problem_solved(2);
        assert_eq!(progress.state(2), TopicState::ProblemsInProgress);
        assert!(!progress.is_complete(2));
        progress.record_problem_solved(2);
        assert_eq!(progress.state(2), TopicState::TopicComplete);
        assert!(progress.is_complete(2));
    }

    #[test]
    fn zero_problem_topic_completes_on_quiz() {
        let mut progress = TopicProgress::default();
        progress.mark_video_watched();
        assert!(!progress.is_complete(0));
        progress.apply_quiz_score(70, THRESHOLD).unwrap();
        assert!(progress.is_complete(0));
        assert_eq!(progress.state(0), TopicState::TopicComplete);
    }

    #[test]
    fn solved_count_is_non_decreasing() {
        let mut progress = TopicProgress::default();
        let mut prev = 0;
        for _ in 0..10 {
            progress.record_problem_solved(4);
            assert!(progress.problems_completed >= prev);
            assert!(progress.problems_completed <= 4);
            prev = progress.problems_completed;
        }
    }
}
