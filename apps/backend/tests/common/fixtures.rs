//! Test fixtures and factory functions for creating request bodies.

use serde_json::json;

/// Create a learner register request body.
pub fn register_request(display_name: Option<&str>) -> serde_json::Value {
    match display_name {
        Some(n) => json!({ "display_name": n }),
        None => json!({}),
    }
}

/// Create a quiz submission request body.
pub fn quiz_request(score: u32) -> serde_json::Value {
    json!({ "score": score })
}

/// Create a problem submission request body that the stub grader accepts.
pub fn passing_submission() -> serde_json::Value {
    json!({ "submission": "fn solve(input: &str) -> String { input.to_uppercase() }" })
}

/// Create a problem submission request body that the stub grader rejects.
pub fn failing_submission() -> serde_json::Value {
    json!({ "submission": "fail" })
}
