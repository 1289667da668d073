//! Grading boundary.
//!
//! Problem submissions are judged by an external generative-AI service.
//! The core only consumes a pass/fail verdict, so the boundary is a
//! trait: production wires a remote client, tests inject a deterministic
//! stub. No module-level mutable state; selection strategies (API key
//! pools etc.) belong inside an implementation, injected at startup.

use crate::models::Problem;

/// Verdict returned by a grader.
#[derive(Debug, Clone)]
pub struct GradeVerdict {
    pub is_correct: bool,
    pub feedback: Option<String>,
}

/// Strategy for judging a problem submission.
pub trait Grader: Send + Sync {
    /// Grader identifier, for logs.
    fn name(&self) -> &'static str;

    /// Judge a submission against a problem.
    fn grade(&self, problem: &Problem, submission: &str) -> GradeVerdict;
}

/// Deterministic grader used in development and tests.
///
/// Accepts any non-empty submission that does not contain the marker
/// string `"fail"`, so test scenarios can force either verdict.
#[derive(Debug, Default)]
pub struct StubGrader;

impl Grader for StubGrader {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn grade(&self, _problem: &Problem, submission: &str) -> GradeVerdict {
        let trimmed = submission.trim();
        let is_correct = !trimmed.is_empty() && !trimmed.contains("fail");
        GradeVerdict {
            is_correct,
            feedback: (!is_correct).then(|| "submission rejected".to_string()),
        }
    }
}
