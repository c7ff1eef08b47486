pub mod batch;
pub mod request;
pub mod response;

pub use batch::{BatchAnswer, BatchQuestion, BatchSection, QuestionBatch, ResponseView};
pub use request::{AssignExamRequest, CreateAttemptRequest, PaginationParams, SubmitResponseRequest};
pub use response::{
    ApiResponse, AttemptCreated, AttemptResults, ExamSummary, FinishOutcome, PaginatedResponse,
    QuestionSummary, SubmissionOutcome,
};
