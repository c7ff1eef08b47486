//! Type-polymorphic parsing, validation and matching of response values.
//!
//! Each [`QuestionType`] has a parse step (raw JSON to [`ResponseValue`]),
//! a validity check against the question's constraints and a match step used
//! for correctness and branching. Dispatch is an exhaustive `match`, so a new
//! question type does not compile until all three are handled.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::models::domain::{Answer, ExamDefinition, Question, QuestionType, Response, ResponseValue};

const TRUE_TOKENS: [&str; 6] = ["true", "t", "yes", "y", "1", "on"];
const FALSE_TOKENS: [&str; 6] = ["false", "f", "no", "n", "0", "off"];
const NULL_TOKENS: [&str; 5] = ["", "null", "none", "nil", "n/a"];

const FLOAT_TOLERANCE: f64 = 1e-9;

pub struct ResponseCodec;

impl ResponseCodec {
    /// Parses a raw submitted value. `Ok(None)` means "no answer".
    pub fn parse(question_type: QuestionType, raw: &Value) -> AppResult<Option<ResponseValue>> {
        if raw.is_null() {
            return Ok(None);
        }
        if let Value::String(s) = raw {
            if s.trim().is_empty() {
                return Ok(None);
            }
        }

        match question_type {
            QuestionType::Boolean => parse_boolean(raw),
            QuestionType::Text | QuestionType::LongText => parse_text(raw),
            QuestionType::Choice | QuestionType::MultiChoice => parse_choices(raw),
            QuestionType::Date => parse_date(raw),
            QuestionType::DateTime => parse_date_time(raw),
            QuestionType::Time => parse_time(raw),
            QuestionType::Decimal => parse_decimal(raw),
            QuestionType::Float => parse_float(raw),
            QuestionType::Integer | QuestionType::Rating => parse_integer(raw),
        }
    }

    /// Checks a parsed value (and optional free-text companion) against the
    /// question's constraints.
    pub fn validate(question: &Question, value: Option<&ResponseValue>, text: Option<&str>) -> AppResult<()> {
        let has_text = text.is_some_and(|t| !t.trim().is_empty());
        if has_text && !question.accepts_free_text() {
            return Err(AppError::InvalidInput(format!(
                "Question '{}' does not accept a free-text response",
                question.name
            )));
        }

        let Some(value) = value else {
            if question.required && !has_text {
                return Err(AppError::InvalidInput(format!(
                    "Question '{}' requires an answer",
                    question.name
                )));
            }
            return Ok(());
        };

        let constraints = &question.constraints;
        match (question.question_type, value) {
            (QuestionType::Boolean, ResponseValue::Boolean(_)) => Ok(()),
            (QuestionType::Text | QuestionType::LongText, ResponseValue::Text(text)) => {
                validate_text(question, text)
            }
            (QuestionType::Choice | QuestionType::MultiChoice, ResponseValue::Choices(ids)) => {
                validate_choices(question, ids)
            }
            (QuestionType::Date, ResponseValue::Date(_))
            | (QuestionType::DateTime, ResponseValue::DateTime(_))
            | (QuestionType::Time, ResponseValue::Time(_)) => Ok(()),
            (QuestionType::Decimal, ResponseValue::Decimal(d)) => {
                check_bounds(question, *d, constraints.min_value, constraints.max_value)
            }
            (QuestionType::Float, ResponseValue::Float(f)) => {
                let d = Decimal::try_from(*f).map_err(|_| {
                    AppError::InvalidInput(format!("{} cannot be compared to the allowed range", f))
                })?;
                check_bounds(question, d, constraints.min_value, constraints.max_value)
            }
            (QuestionType::Integer, ResponseValue::Integer(i)) => {
                check_bounds(question, Decimal::from(*i), constraints.min_value, constraints.max_value)
            }
            (QuestionType::Rating, ResponseValue::Integer(i)) => {
                if *i < 0 {
                    return Err(AppError::InvalidInput("A rating cannot be negative".to_string()));
                }
                check_bounds(question, Decimal::from(*i), constraints.min_value, constraints.max_value)
            }
            (question_type, _) => Err(AppError::InvalidInput(format!(
                "Value does not fit a {:?} question",
                question_type
            ))),
        }
    }

    /// Whether a response value matches an answer definition. Choice values
    /// match by selected id; every other type compares against the answer's
    /// stored value parsed with the same rules as a submission.
    pub fn matches(question_type: QuestionType, value: &ResponseValue, answer: &Answer) -> bool {
        if let ResponseValue::Choices(ids) = value {
            return ids.iter().any(|id| *id == answer.id);
        }

        let Some(stored) = answer.value.as_deref() else {
            return false;
        };
        let Ok(Some(expected)) = Self::parse(question_type, &Value::String(stored.to_string())) else {
            return false;
        };

        match (value, &expected) {
            (ResponseValue::Text(given), ResponseValue::Text(wanted)) => {
                given.trim().to_lowercase() == wanted.trim().to_lowercase()
            }
            (ResponseValue::Float(given), ResponseValue::Float(wanted)) => {
                (given - wanted).abs() <= FLOAT_TOLERANCE
            }
            (given, wanted) => given == wanted,
        }
    }

    /// Parses `raw`, stores it on the response and records validity.
    ///
    /// The value is stored even when it fails parsing or validation; the
    /// returned error is the soft failure to report back to the caller.
    pub fn apply(
        question: &Question,
        response: &mut Response,
        raw: Option<Value>,
        text: Option<String>,
    ) -> AppResult<()> {
        let text = text.filter(|t| !t.trim().is_empty());
        let parsed = match raw.as_ref() {
            Some(raw) => Self::parse(question.question_type, raw),
            None => Ok(None),
        };

        let outcome = match parsed {
            Ok(value) => {
                response.set_value(value, raw, text);
                Self::validate(question, response.value.as_ref(), response.text.as_deref())
            }
            Err(err) => {
                response.set_value(None, raw, text);
                Err(err)
            }
        };

        response.valid = Some(outcome.is_ok());
        outcome
    }

    /// Answer values of non-choice questions must parse under the question's type.
    pub fn check_answer_values(exam: &ExamDefinition) -> AppResult<()> {
        for (_, question) in exam.questions() {
            if question.question_type.is_choice() {
                continue;
            }
            for answer in &question.answers {
                let Some(stored) = answer.value.as_deref() else {
                    continue;
                };
                let parsed = Self::parse(question.question_type, &Value::String(stored.to_string()));
                if !matches!(parsed, Ok(Some(_))) {
                    return Err(AppError::ValidationError(format!(
                        "Answer '{}' value '{}' is not a valid {:?}",
                        answer.name, stored, question.question_type
                    )));
                }
            }
        }
        Ok(())
    }
}

fn as_token(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn type_mismatch(expected: &str, raw: &Value) -> AppError {
    AppError::InvalidInput(format!("Expected {}, got {}", expected, raw))
}

fn parse_boolean(raw: &Value) -> AppResult<Option<ResponseValue>> {
    match raw {
        Value::Bool(b) => return Ok(Some(ResponseValue::Boolean(*b))),
        // 1.0 and 0.0 count the same as 1 and 0
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f == 1.0 => return Ok(Some(ResponseValue::Boolean(true))),
            Some(f) if f == 0.0 => return Ok(Some(ResponseValue::Boolean(false))),
            _ => {}
        },
        _ => {}
    }
    let token = as_token(raw)
        .ok_or_else(|| type_mismatch("a yes/no value", raw))?
        .to_lowercase();

    if TRUE_TOKENS.contains(&token.as_str()) {
        Ok(Some(ResponseValue::Boolean(true)))
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Ok(Some(ResponseValue::Boolean(false)))
    } else if NULL_TOKENS.contains(&token.as_str()) {
        Ok(None)
    } else {
        Err(type_mismatch("a yes/no value", raw))
    }
}

fn parse_text(raw: &Value) -> AppResult<Option<ResponseValue>> {
    match raw {
        Value::String(s) => Ok(Some(ResponseValue::Text(s.clone()))),
        Value::Number(_) | Value::Bool(_) => Ok(Some(ResponseValue::Text(raw.to_string()))),
        _ => Err(type_mismatch("text", raw)),
    }
}

fn parse_choices(raw: &Value) -> AppResult<Option<ResponseValue>> {
    let ids: Vec<String> = match raw {
        Value::String(s) => vec![s.trim().to_string()],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                other => Err(type_mismatch("answer ids", other)),
            })
            .collect::<AppResult<_>>()?,
        _ => return Err(type_mismatch("one or more answer ids", raw)),
    };

    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.into_iter().filter(|id| !id.is_empty()) {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }

    if unique.is_empty() {
        return Ok(None);
    }
    Ok(Some(ResponseValue::Choices(unique)))
}

fn parse_date(raw: &Value) -> AppResult<Option<ResponseValue>> {
    let s = raw.as_str().ok_or_else(|| type_mismatch("a date", raw))?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| Some(ResponseValue::Date(d)))
        .map_err(|_| AppError::InvalidInput(format!("'{}' is not a date (YYYY-MM-DD)", s)))
}

fn parse_date_time(raw: &Value) -> AppResult<Option<ResponseValue>> {
    let s = raw.as_str().ok_or_else(|| type_mismatch("a date-time", raw))?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(ResponseValue::DateTime(dt.with_timezone(&Utc))));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| Some(ResponseValue::DateTime(naive.and_utc())))
        .ok_or_else(|| AppError::InvalidInput(format!("'{}' is not a date-time", s)))
}

fn parse_time(raw: &Value) -> AppResult<Option<ResponseValue>> {
    let s = raw.as_str().ok_or_else(|| type_mismatch("a time", raw))?.trim();
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
        .map(|t| Some(ResponseValue::Time(t)))
        .ok_or_else(|| AppError::InvalidInput(format!("'{}' is not a time (HH:MM[:SS])", s)))
}

fn parse_decimal(raw: &Value) -> AppResult<Option<ResponseValue>> {
    let token = match raw {
        Value::String(_) | Value::Number(_) => as_token(raw),
        _ => None,
    }
    .ok_or_else(|| type_mismatch("a decimal number", raw))?;

    Decimal::from_str(&token)
        .or_else(|_| Decimal::from_scientific(&token))
        .map(|d| Some(ResponseValue::Decimal(d)))
        .map_err(|_| AppError::InvalidInput(format!("'{}' is not a decimal number", token)))
}

fn parse_float(raw: &Value) -> AppResult<Option<ResponseValue>> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
    .ok_or_else(|| type_mismatch("a number", raw))?;

    Ok(Some(ResponseValue::Float(value)))
}

fn parse_integer(raw: &Value) -> AppResult<Option<ResponseValue>> {
    let value = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| type_mismatch("a whole number", raw))?;

    Ok(Some(ResponseValue::Integer(value)))
}

fn validate_text(question: &Question, text: &str) -> AppResult<()> {
    let constraints = &question.constraints;
    let length = text.chars().count();

    if question.required && text.trim().is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Question '{}' requires an answer",
            question.name
        )));
    }
    if let Some(min) = constraints.min_length {
        if length < min {
            return Err(AppError::InvalidInput(format!(
                "Answer must be at least {} characters long",
                min
            )));
        }
    }
    if let Some(max) = constraints.max_length {
        if length > max {
            return Err(AppError::InvalidInput(format!(
                "Answer must be at most {} characters long",
                max
            )));
        }
    }
    if let Some(pattern) = &constraints.pattern {
        let anchored = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            AppError::InternalError(format!("Question '{}' pattern: {}", question.name, e))
        })?;
        if !anchored.is_match(text) {
            return Err(AppError::InvalidInput(format!(
                "Answer does not match the expected format for '{}'",
                question.name
            )));
        }
    }
    Ok(())
}

fn validate_choices(question: &Question, ids: &[String]) -> AppResult<()> {
    for id in ids {
        if !question.visible_answers().any(|a| a.id == *id) {
            return Err(AppError::InvalidInput(format!(
                "'{}' is not an answer of question '{}'",
                id, question.name
            )));
        }
    }

    let count = ids.len();
    if question.question_type == QuestionType::Choice && count > 1 {
        return Err(AppError::InvalidInput(format!(
            "Question '{}' accepts a single selection",
            question.name
        )));
    }

    let constraints = &question.constraints;
    if let Some(min) = constraints.min_selections {
        if count < min {
            return Err(AppError::InvalidInput(format!(
                "Select at least {} answer(s)",
                min
            )));
        }
    }
    if let Some(max) = constraints.max_selections {
        if count > max {
            return Err(AppError::InvalidInput(format!(
                "Select at most {} answer(s)",
                max
            )));
        }
    }
    Ok(())
}

fn check_bounds(
    question: &Question,
    value: Decimal,
    min: Option<Decimal>,
    max: Option<Decimal>,
) -> AppResult<()> {
    if let Some(min) = min {
        if value < min {
            return Err(AppError::InvalidInput(format!(
                "{} is below the minimum of {} for '{}'",
                value, min, question.name
            )));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(AppError::InvalidInput(format!(
                "{} is above the maximum of {} for '{}'",
                value, max, question.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::QuestionConstraints;
    use serde_json::json;

    fn question(question_type: QuestionType) -> Question {
        Question::new("q", "Question?", question_type)
    }

    fn bounded(question_type: QuestionType, min: i64, max: i64) -> Question {
        question(question_type).with_constraints(QuestionConstraints {
            min_value: Some(Decimal::from(min)),
            max_value: Some(Decimal::from(max)),
            ..Default::default()
        })
    }

    #[test]
    fn boolean_tokens_are_case_insensitive() {
        let parse = |raw: Value| ResponseCodec::parse(QuestionType::Boolean, &raw).unwrap();

        assert_eq!(parse(json!("YES")), Some(ResponseValue::Boolean(true)));
        assert_eq!(parse(json!("t")), Some(ResponseValue::Boolean(true)));
        assert_eq!(parse(json!("Off")), Some(ResponseValue::Boolean(false)));
        assert_eq!(parse(json!(0)), Some(ResponseValue::Boolean(false)));
        assert_eq!(parse(json!(1.0)), Some(ResponseValue::Boolean(true)));
        assert_eq!(parse(json!(0.0)), Some(ResponseValue::Boolean(false)));
        assert_eq!(parse(json!(true)), Some(ResponseValue::Boolean(true)));
        assert_eq!(parse(json!("None")), None);
        assert_eq!(parse(json!(null)), None);
        assert!(ResponseCodec::parse(QuestionType::Boolean, &json!("maybe")).is_err());
        assert!(ResponseCodec::parse(QuestionType::Boolean, &json!(0.5)).is_err());
    }

    #[test]
    fn choices_accept_single_id_or_list_and_deduplicate() {
        let single = ResponseCodec::parse(QuestionType::Choice, &json!("a1")).unwrap();
        assert_eq!(single, Some(ResponseValue::Choices(vec!["a1".into()])));

        let many = ResponseCodec::parse(QuestionType::MultiChoice, &json!(["a1", "a2", "a1"])).unwrap();
        assert_eq!(many, Some(ResponseValue::Choices(vec!["a1".into(), "a2".into()])));

        assert_eq!(ResponseCodec::parse(QuestionType::MultiChoice, &json!([])).unwrap(), None);
        assert!(ResponseCodec::parse(QuestionType::MultiChoice, &json!([1, 2])).is_err());
    }

    #[test]
    fn temporal_types_parse() {
        assert!(matches!(
            ResponseCodec::parse(QuestionType::Date, &json!("2024-02-29")).unwrap(),
            Some(ResponseValue::Date(_))
        ));
        assert!(ResponseCodec::parse(QuestionType::Date, &json!("2023-02-29")).is_err());
        assert!(matches!(
            ResponseCodec::parse(QuestionType::DateTime, &json!("2024-05-01T10:30:00+02:00")).unwrap(),
            Some(ResponseValue::DateTime(_))
        ));
        assert!(matches!(
            ResponseCodec::parse(QuestionType::DateTime, &json!("2024-05-01 10:30")).unwrap(),
            Some(ResponseValue::DateTime(_))
        ));
        assert!(matches!(
            ResponseCodec::parse(QuestionType::Time, &json!("07:45")).unwrap(),
            Some(ResponseValue::Time(_))
        ));
        assert!(ResponseCodec::parse(QuestionType::Time, &json!("25:00")).is_err());
    }

    #[test]
    fn numeric_types_parse_from_numbers_and_strings() {
        assert_eq!(
            ResponseCodec::parse(QuestionType::Decimal, &json!("12.50")).unwrap(),
            Some(ResponseValue::Decimal(Decimal::new(1250, 2)))
        );
        assert_eq!(
            ResponseCodec::parse(QuestionType::Integer, &json!(" 42 ")).unwrap(),
            Some(ResponseValue::Integer(42))
        );
        assert_eq!(
            ResponseCodec::parse(QuestionType::Float, &json!(2.5)).unwrap(),
            Some(ResponseValue::Float(2.5))
        );
        assert!(ResponseCodec::parse(QuestionType::Integer, &json!("4.2")).is_err());
        assert!(ResponseCodec::parse(QuestionType::Float, &json!("NaN")).is_err());
        assert!(ResponseCodec::parse(QuestionType::Decimal, &json!([1])).is_err());
    }

    #[test]
    fn numeric_bounds_are_enforced() {
        let q = bounded(QuestionType::Integer, 1, 10);
        assert!(ResponseCodec::validate(&q, Some(&ResponseValue::Integer(10)), None).is_ok());
        assert!(matches!(
            ResponseCodec::validate(&q, Some(&ResponseValue::Integer(11)), None),
            Err(AppError::InvalidInput(_))
        ));

        let f = bounded(QuestionType::Float, 0, 1);
        assert!(ResponseCodec::validate(&f, Some(&ResponseValue::Float(0.5)), None).is_ok());
        assert!(ResponseCodec::validate(&f, Some(&ResponseValue::Float(1.01)), None).is_err());

        let rating = question(QuestionType::Rating);
        assert!(ResponseCodec::validate(&rating, Some(&ResponseValue::Integer(-1)), None).is_err());
    }

    #[test]
    fn text_length_and_pattern() {
        let q = question(QuestionType::Text).with_constraints(QuestionConstraints {
            min_length: Some(2),
            max_length: Some(5),
            pattern: Some("[a-z]+".to_string()),
            ..Default::default()
        });
        let check = |s: &str| ResponseCodec::validate(&q, Some(&ResponseValue::Text(s.into())), None);

        assert!(check("abc").is_ok());
        assert!(check("a").is_err());
        assert!(check("abcdef").is_err());
        assert!(check("ab1").is_err(), "pattern must match the whole value");
    }

    #[test]
    fn selection_counts_and_membership() {
        let multi = question(QuestionType::MultiChoice)
            .with_constraints(QuestionConstraints {
                min_selections: Some(1),
                max_selections: Some(2),
                ..Default::default()
            })
            .with_answers(vec![
                Answer::labelled("a", "A"),
                Answer::labelled("b", "B"),
                Answer::labelled("c", "C"),
                Answer::new("hidden"),
            ]);
        let ids: Vec<String> = multi.answers.iter().map(|a| a.id.clone()).collect();
        let pick = |chosen: &[usize]| {
            let value = ResponseValue::Choices(chosen.iter().map(|i| ids[*i].clone()).collect());
            ResponseCodec::validate(&multi, Some(&value), None)
        };

        assert!(pick(&[0]).is_ok());
        assert!(pick(&[0, 1]).is_ok());
        assert!(pick(&[0, 1, 2]).is_err());
        assert!(pick(&[3]).is_err(), "unlabelled answers cannot be selected");

        let foreign = ResponseValue::Choices(vec!["elsewhere".into()]);
        assert!(ResponseCodec::validate(&multi, Some(&foreign), None).is_err());
    }

    #[test]
    fn single_choice_rejects_multiple_selections() {
        let q = question(QuestionType::Choice)
            .with_answers(vec![Answer::labelled("a", "A"), Answer::labelled("b", "B")]);
        let both = ResponseValue::Choices(q.answers.iter().map(|a| a.id.clone()).collect());
        assert!(ResponseCodec::validate(&q, Some(&both), None).is_err());
    }

    #[test]
    fn required_and_free_text_rules() {
        let required = question(QuestionType::Integer).required();
        assert!(ResponseCodec::validate(&required, None, None).is_err());

        let optional = question(QuestionType::Integer);
        assert!(ResponseCodec::validate(&optional, None, None).is_ok());
        assert!(ResponseCodec::validate(&optional, None, Some("note")).is_err());

        let with_text = question(QuestionType::Choice).with_free_text().required();
        assert!(ResponseCodec::validate(&with_text, None, Some("Other: blue")).is_ok());

        let text = question(QuestionType::Text).with_free_text();
        assert!(ResponseCodec::validate(&text, Some(&ResponseValue::Text("x".into())), Some("y")).is_err());
    }

    #[test]
    fn mismatched_value_kind_is_invalid() {
        let q = question(QuestionType::Date);
        assert!(ResponseCodec::validate(&q, Some(&ResponseValue::Integer(1)), None).is_err());
    }

    #[test]
    fn matching_by_type() {
        let text_answer = Answer::new("paris").with_value("Paris");
        assert!(ResponseCodec::matches(
            QuestionType::Text,
            &ResponseValue::Text("  paris ".into()),
            &text_answer
        ));

        let decimal_answer = Answer::new("half").with_value("0.50");
        assert!(ResponseCodec::matches(
            QuestionType::Decimal,
            &ResponseValue::Decimal(Decimal::new(5, 1)),
            &decimal_answer
        ));

        let float_answer = Answer::new("third").with_value("0.1");
        assert!(ResponseCodec::matches(
            QuestionType::Float,
            &ResponseValue::Float(0.1 + 1e-12),
            &float_answer
        ));

        let choice = Answer::labelled("x", "X");
        let selected = ResponseValue::Choices(vec![choice.id.clone()]);
        assert!(ResponseCodec::matches(QuestionType::Choice, &selected, &choice));
        assert!(!ResponseCodec::matches(
            QuestionType::Choice,
            &ResponseValue::Choices(vec!["other".into()]),
            &choice
        ));

        let no_value = Answer::new("blank");
        assert!(!ResponseCodec::matches(QuestionType::Integer, &ResponseValue::Integer(1), &no_value));
    }

    #[test]
    fn apply_stores_invalid_values_and_flags_them() {
        let q = bounded(QuestionType::Integer, 1, 5).required();
        let mut response = Response::placeholder("a", "s", &q.id, 0);

        let result = ResponseCodec::apply(&q, &mut response, Some(json!(9)), None);

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(response.value, Some(ResponseValue::Integer(9)));
        assert_eq!(response.valid, Some(false));
    }

    #[test]
    fn apply_keeps_raw_value_when_unparsable() {
        let q = question(QuestionType::Integer);
        let mut response = Response::placeholder("a", "s", &q.id, 0);

        let result = ResponseCodec::apply(&q, &mut response, Some(json!("twelve")), None);

        assert!(result.is_err());
        assert_eq!(response.value, None);
        assert_eq!(response.raw_value, Some(json!("twelve")));
        assert_eq!(response.valid, Some(false));
    }

    #[test]
    fn answer_values_must_parse_for_their_question_type() {
        let mut exam = ExamDefinition::new("exam", None).unwrap();
        let section = crate::models::domain::Section::new("s");
        let section_id = section.id.clone();
        exam.insert_section(None, section).unwrap();
        let q = question(QuestionType::Integer)
            .with_answers(vec![Answer::new("bad").with_value("not a number")]);
        exam.insert_question(&section_id, None, q).unwrap();

        assert!(matches!(
            ResponseCodec::check_answer_values(&exam),
            Err(AppError::ValidationError(_))
        ));
    }
}
