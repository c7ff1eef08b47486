use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

fn default_resume() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAttemptRequest {
    #[validate(length(min = 1, max = 64))]
    pub assignment_id: String,

    /// Reuse the most recent incomplete attempt for this assignment.
    #[serde(default = "default_resume")]
    pub resume: bool,
}

/// A value for one question. `value` is read according to the question's
/// type; `text` is the free-text companion where the question allows one.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitResponseRequest {
    #[serde(default)]
    pub value: Option<Value>,

    #[validate(length(max = 10000))]
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignExamRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}
