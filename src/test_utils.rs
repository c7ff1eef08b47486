#[cfg(test)]
pub mod fixtures {
    use rust_decimal::Decimal;

    use crate::models::domain::{
        Answer, ExamDefinition, Question, QuestionConstraints, QuestionType, Section,
    };

    /// Two sections. The first asks a scored colour question and then a
    /// "continue?" question whose first answer ends the exam; the second
    /// holds a single scored text question. Passing score 50.
    pub fn branching_exam() -> ExamDefinition {
        let mut exam = ExamDefinition::new("branching", Some(Decimal::from(50))).unwrap();

        let colour = Question::new("colour", "Colour of the sky?", QuestionType::Choice)
            .required()
            .with_rejoinder("Blue is correct.")
            .with_answers(vec![
                Answer::labelled("blue", "Blue").with_correct(true),
                Answer::labelled("red", "Red").with_correct(false),
            ]);
        let carry_on = Question::new("continue", "Continue?", QuestionType::Choice)
            .required()
            .with_answers(vec![
                Answer::labelled("stop", "Stop here").ending_exam(),
                Answer::labelled("go", "Keep going"),
            ]);
        let capital = Question::new("capital", "Capital of France?", QuestionType::Text)
            .required()
            .with_answers(vec![Answer::new("paris").with_value("Paris").with_correct(true)]);

        exam.insert_section(
            None,
            Section::new("s1")
                .with_title("Warm up")
                .with_questions(vec![colour, carry_on]),
        )
        .unwrap();
        exam.insert_section(None, Section::new("s2").with_questions(vec![capital]))
            .unwrap();
        exam
    }

    /// One required integer question bounded to 1..=10 whose correct value is 5.
    pub fn numeric_exam() -> ExamDefinition {
        let mut exam = ExamDefinition::new("numeric", Some(Decimal::from(100))).unwrap();
        let guess = Question::new("guess", "Pick a number", QuestionType::Integer)
            .required()
            .with_constraints(QuestionConstraints {
                min_value: Some(Decimal::from(1)),
                max_value: Some(Decimal::from(10)),
                ..Default::default()
            })
            .with_answers(vec![Answer::new("five").with_value("5").with_correct(true)]);
        exam.insert_section(None, Section::new("only").with_questions(vec![guess]))
            .unwrap();
        exam
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_are_valid_definitions() {
        assert!(branching_exam().validate().is_ok());
        assert!(numeric_exam().validate().is_ok());
    }

    #[test]
    fn test_branching_exam_layout() {
        let exam = branching_exam();
        assert_eq!(exam.sections.len(), 2);
        assert_eq!(exam.sections[0].questions.len(), 2);
        assert!(exam.sections[0].questions[1].answers[0].ends_exam);
    }
}
