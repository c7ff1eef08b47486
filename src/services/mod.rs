pub mod attempt_service;
pub mod correctness;
pub mod exam_service;
pub mod exam_transfer;
pub mod response_codec;
pub mod scoring_service;
pub mod traversal;

pub use attempt_service::AttemptService;
pub use exam_service::ExamService;
