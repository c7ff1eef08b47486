pub mod answer;
pub mod assignment;
pub mod attempt;
pub mod exam;
pub mod question;
pub mod response;
pub mod section;
pub use answer::Answer;
pub use assignment::Assignment;
pub use attempt::{Attempt, AttemptStatus};
pub use exam::ExamDefinition;
pub use question::{Question, QuestionConstraints, QuestionType};
pub use response::{Response, ResponseValue};
pub use section::Section;
