//! Walks an exam's sections in order, honouring branch directives raised by
//! validly answered questions, and plans the next batch of questions for an
//! attempt.

use std::collections::{HashMap, VecDeque};

use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::domain::{ExamDefinition, Question, Response, Section};

/// Branch state threaded through a walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraversalState {
    pub jump_target: Option<String>,
    pub section_ended: bool,
    pub exam_ended: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct SurfacedQuestion<'a> {
    pub section: &'a Section,
    pub question: &'a Question,
    /// Position of the question within this attempt's selection for the section.
    pub sequence: usize,
    pub response: Option<&'a Response>,
}

/// A lazy walk over the questions an attempt must see.
///
/// A section with no responses yet is selected on entry: all questions in
/// position order, or shuffled and capped when the section is randomized.
/// Once responses exist the stored selection and order are reused.
pub struct Traversal<'a, R> {
    exam: &'a ExamDefinition,
    responses: HashMap<&'a str, &'a Response>,
    rng: R,
    state: TraversalState,
    next_section: usize,
    current: Option<&'a Section>,
    queue: VecDeque<(usize, &'a Question)>,
}

impl<'a> Traversal<'a, ThreadRng> {
    pub fn new(exam: &'a ExamDefinition, responses: &'a [Response]) -> Self {
        Self::with_rng(exam, responses, rand::thread_rng())
    }
}

impl<'a, R: Rng> Traversal<'a, R> {
    pub fn with_rng(exam: &'a ExamDefinition, responses: &'a [Response], rng: R) -> Self {
        Traversal {
            exam,
            responses: responses
                .iter()
                .map(|r| (r.question_id.as_str(), r))
                .collect(),
            rng,
            state: TraversalState::default(),
            next_section: 0,
            current: None,
            queue: VecDeque::new(),
        }
    }

    fn select(&mut self, section: &'a Section) -> Vec<&'a Question> {
        let mut existing: Vec<&'a Response> = self
            .responses
            .values()
            .copied()
            .filter(|r| r.section_id == section.id)
            .collect();

        if !existing.is_empty() {
            existing.sort_by_key(|r| r.sequence);
            return existing
                .iter()
                .filter_map(|r| section.question(&r.question_id))
                .collect();
        }

        let mut questions: Vec<&'a Question> = section.questions.iter().collect();
        if section.random_order {
            questions.shuffle(&mut self.rng);
            if let Some(cap) = section.max_questions {
                questions.truncate(cap);
            }
        }
        questions
    }

    fn apply_branches(&mut self, question: &Question, response: &Response) {
        for answer_id in &response.matched_answer_ids {
            let Some(answer) = question.answer(answer_id) else {
                continue;
            };
            if let Some(target) = &answer.next_section_id {
                self.state.jump_target = Some(target.clone());
            }
            if answer.ends_section {
                self.state.section_ended = true;
            }
            if answer.ends_exam {
                self.state.exam_ended = true;
            }
        }
    }
}

impl<'a, R: Rng> Iterator for Traversal<'a, R> {
    type Item = SurfacedQuestion<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let exam = self.exam;
        loop {
            if let Some(section) = self.current {
                if !self.state.section_ended {
                    if let Some((sequence, question)) = self.queue.pop_front() {
                        let response = self.responses.get(question.id.as_str()).copied();
                        if let Some(answered) = response.filter(|r| r.is_valid()) {
                            self.apply_branches(question, answered);
                        }
                        return Some(SurfacedQuestion {
                            section,
                            question,
                            sequence,
                            response,
                        });
                    }
                }
                self.current = None;
                self.queue.clear();
            }

            let section = exam.sections.get(self.next_section)?;
            self.next_section += 1;

            if self.state.exam_ended {
                return None;
            }
            if let Some(target) = &self.state.jump_target {
                if *target != section.id {
                    continue;
                }
                self.state.jump_target = None;
            }
            if let Some(next) = &section.next_section_id {
                self.state.jump_target = Some(next.clone());
            }

            self.state.section_ended = false;
            self.queue = self.select(section).into_iter().enumerate().collect();
            self.current = Some(section);
        }
    }
}

/// Whether a surfaced question still needs an answer before the attempt can
/// move on: unanswered, or answered but not valid. An optional question is
/// settled by submitting an empty value.
pub fn is_pending(response: Option<&Response>) -> bool {
    !response.is_some_and(|r| r.is_valid())
}

#[derive(Debug)]
pub struct BatchPlan<'a> {
    pub questions: Vec<SurfacedQuestion<'a>>,
    /// Placeholders to create for questions surfaced for the first time.
    pub placeholders: Vec<Response>,
    /// Number of returned questions still awaiting a valid answer.
    pub pending: usize,
}

impl BatchPlan<'_> {
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }
}

/// Collects the next batch from a walk.
///
/// Pending questions are returned (and answered ones too when
/// `include_answered` is set). Once a pending question has been collected the
/// batch stops at the next section boundary, so a caller can never see
/// pending questions from two sections at once.
pub fn plan_batch<'a, R: Rng>(
    traversal: Traversal<'a, R>,
    attempt_id: &str,
    include_answered: bool,
) -> BatchPlan<'a> {
    let mut plan = BatchPlan {
        questions: Vec::new(),
        placeholders: Vec::new(),
        pending: 0,
    };
    let mut pending_section: Option<&str> = None;

    for surfaced in traversal {
        if let Some(section_id) = pending_section {
            if surfaced.section.id != section_id {
                break;
            }
        }

        if is_pending(surfaced.response) {
            if surfaced.response.is_none() {
                plan.placeholders.push(Response::placeholder(
                    attempt_id,
                    &surfaced.section.id,
                    &surfaced.question.id,
                    surfaced.sequence,
                ));
            }
            pending_section.get_or_insert(surfaced.section.id.as_str());
            plan.pending += 1;
            plan.questions.push(surfaced);
        } else if include_answered {
            plan.questions.push(surfaced);
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{Answer, QuestionType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        exam: ExamDefinition,
    }

    impl Fixture {
        /// Sections with the given number of required yes/no choice questions;
        /// question names are `s{section}q{question}`.
        fn new(layout: &[usize]) -> Self {
            let mut exam = ExamDefinition::new("exam", None).unwrap();
            for (s, count) in layout.iter().enumerate() {
                let questions = (0..*count)
                    .map(|q| {
                        Question::new(&format!("s{}q{}", s, q), "?", QuestionType::Choice)
                            .required()
                            .with_answers(vec![
                                Answer::labelled(&format!("s{}q{}yes", s, q), "Yes"),
                                Answer::labelled(&format!("s{}q{}no", s, q), "No"),
                            ])
                    })
                    .collect();
                let section = Section::new(&format!("s{}", s)).with_questions(questions);
                exam.insert_section(None, section).unwrap();
            }
            Fixture { exam }
        }

        fn section_id(&self, s: usize) -> String {
            self.exam.sections[s].id.clone()
        }

        fn question(&self, s: usize, q: usize) -> &Question {
            &self.exam.sections[s].questions[q]
        }

        /// A valid response selecting answer `a` of question `q` in section `s`.
        fn answered(&self, s: usize, q: usize, a: usize) -> Response {
            let question = self.question(s, q);
            let mut response = Response::placeholder("attempt", &self.section_id(s), &question.id, q);
            response.valid = Some(true);
            response.matched_answer_ids = vec![question.answers[a].id.clone()];
            response
        }

        fn walk_names(&self, responses: &[Response]) -> Vec<String> {
            Traversal::with_rng(&self.exam, responses, StdRng::seed_from_u64(7))
                .map(|s| s.question.name.clone())
                .collect()
        }
    }

    #[test]
    fn walks_all_questions_in_order_without_branches() {
        let fixture = Fixture::new(&[2, 1]);
        assert_eq!(fixture.walk_names(&[]), vec!["s0q0", "s0q1", "s1q0"]);
    }

    #[test]
    fn answer_ending_exam_stops_later_sections() {
        let mut fixture = Fixture::new(&[2, 1]);
        fixture.exam.sections[0].questions[1].answers[0].ends_exam = true;

        let responses = vec![fixture.answered(0, 0, 1), fixture.answered(0, 1, 0)];
        assert_eq!(fixture.walk_names(&responses), vec!["s0q0", "s0q1"]);
    }

    #[test]
    fn answer_ending_section_skips_rest_of_section() {
        let mut fixture = Fixture::new(&[3, 1]);
        fixture.exam.sections[0].questions[0].answers[0].ends_section = true;

        let responses = vec![fixture.answered(0, 0, 0)];
        assert_eq!(fixture.walk_names(&responses), vec!["s0q0", "s1q0"]);
    }

    #[test]
    fn section_default_jump_skips_intermediate_sections() {
        let mut fixture = Fixture::new(&[1, 1, 1]);
        let target = fixture.section_id(2);
        let origin = fixture.section_id(0);
        fixture.exam.set_section_next(&origin, Some(&target)).unwrap();

        assert_eq!(fixture.walk_names(&[]), vec!["s0q0", "s2q0"]);
    }

    #[test]
    fn answer_jump_overrides_section_default() {
        let mut fixture = Fixture::new(&[1, 1, 1, 1]);
        let origin = fixture.section_id(0);
        let default_target = fixture.section_id(3);
        let answer_target = fixture.section_id(1);
        fixture.exam.set_section_next(&origin, Some(&default_target)).unwrap();
        let answer_id = fixture.question(0, 0).answers[1].id.clone();
        fixture.exam.set_answer_next(&answer_id, Some(&answer_target)).unwrap();

        assert_eq!(fixture.walk_names(&[]), vec!["s0q0", "s3q0"]);

        let responses = vec![fixture.answered(0, 0, 1)];
        assert_eq!(fixture.walk_names(&responses), vec!["s0q0", "s1q0", "s2q0", "s3q0"]);
    }

    #[test]
    fn invalid_responses_do_not_branch() {
        let mut fixture = Fixture::new(&[1, 1]);
        fixture.exam.sections[0].questions[0].answers[0].ends_exam = true;
        let mut response = fixture.answered(0, 0, 0);
        response.valid = Some(false);

        assert_eq!(fixture.walk_names(&[response]), vec!["s0q0", "s1q0"]);
    }

    #[test]
    fn randomized_section_is_capped_and_then_stable() {
        let mut fixture = Fixture::new(&[5]);
        fixture.exam.sections[0].random_order = true;
        fixture.exam.sections[0].max_questions = Some(3);

        let first: Vec<(String, usize)> =
            Traversal::with_rng(&fixture.exam, &[], StdRng::seed_from_u64(1))
                .map(|s| (s.question.id.clone(), s.sequence))
                .collect();
        assert_eq!(first.len(), 3);

        let section_id = fixture.section_id(0);
        let stored: Vec<Response> = first
            .iter()
            .map(|(id, seq)| Response::placeholder("attempt", &section_id, id, *seq))
            .collect();

        for seed in 0..5 {
            let again: Vec<String> =
                Traversal::with_rng(&fixture.exam, &stored, StdRng::seed_from_u64(seed))
                    .map(|s| s.question.id.clone())
                    .collect();
            let expected: Vec<String> = first.iter().map(|(id, _)| id.clone()).collect();
            assert_eq!(again, expected);
        }
    }

    #[test]
    fn batch_stops_at_next_section_once_something_is_pending() {
        let fixture = Fixture::new(&[2, 2]);
        let traversal = Traversal::with_rng(&fixture.exam, &[], StdRng::seed_from_u64(3));

        let plan = plan_batch(traversal, "attempt", false);

        let names: Vec<&str> = plan.questions.iter().map(|s| s.question.name.as_str()).collect();
        assert_eq!(names, vec!["s0q0", "s0q1"]);
        assert_eq!(plan.placeholders.len(), 2);
        assert_eq!(plan.pending, 2);
    }

    #[test]
    fn batch_moves_on_after_section_is_answered() {
        let fixture = Fixture::new(&[2, 1]);
        let responses = vec![fixture.answered(0, 0, 0), fixture.answered(0, 1, 0)];

        let plan = plan_batch(
            Traversal::with_rng(&fixture.exam, &responses, StdRng::seed_from_u64(3)),
            "attempt",
            false,
        );
        let names: Vec<&str> = plan.questions.iter().map(|s| s.question.name.as_str()).collect();
        assert_eq!(names, vec!["s1q0"]);

        let with_answered = plan_batch(
            Traversal::with_rng(&fixture.exam, &responses, StdRng::seed_from_u64(3)),
            "attempt",
            true,
        );
        assert_eq!(with_answered.questions.len(), 3);
        assert_eq!(with_answered.placeholders.len(), 1);
    }

    #[test]
    fn invalid_response_keeps_question_pending() {
        let fixture = Fixture::new(&[1, 1]);
        let mut response = fixture.answered(0, 0, 0);
        response.valid = Some(false);
        let responses = vec![response];

        let plan = plan_batch(
            Traversal::with_rng(&fixture.exam, &responses, StdRng::seed_from_u64(3)),
            "attempt",
            false,
        );

        assert_eq!(plan.questions.len(), 1);
        assert_eq!(plan.questions[0].question.name, "s0q0");
        assert!(plan.placeholders.is_empty());
    }

    #[test]
    fn fully_answered_exam_yields_empty_batch() {
        let fixture = Fixture::new(&[1, 1]);
        let responses = vec![fixture.answered(0, 0, 0), fixture.answered(1, 0, 0)];

        let plan = plan_batch(
            Traversal::with_rng(&fixture.exam, &responses, StdRng::seed_from_u64(3)),
            "attempt",
            false,
        );
        assert!(plan.is_complete());
        assert!(plan.questions.is_empty());
    }

    #[test]
    fn untouched_optional_question_stays_pending() {
        let mut fixture = Fixture::new(&[2, 1]);
        fixture.exam.sections[0].questions[1].required = false;
        let untouched = Response::placeholder(
            "attempt",
            &fixture.section_id(0),
            &fixture.question(0, 1).id,
            1,
        );
        let responses = vec![fixture.answered(0, 0, 0), untouched.clone()];

        assert!(is_pending(Some(&untouched)));
        assert!(is_pending(None));

        let plan = plan_batch(
            Traversal::with_rng(&fixture.exam, &responses, StdRng::seed_from_u64(3)),
            "attempt",
            false,
        );
        let names: Vec<&str> = plan.questions.iter().map(|s| s.question.name.as_str()).collect();
        assert_eq!(names, vec!["s0q1"]);
        assert!(plan.placeholders.is_empty());
    }
}
