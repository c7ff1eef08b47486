use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    auth::{Actor, IdentityResolver, PermissionChecker, Resource},
    errors::{AppError, AppResult},
    models::{
        domain::{Attempt, ExamDefinition, Response},
        dto::{
            AttemptCreated, AttemptResults, FinishOutcome, QuestionBatch, QuestionSummary,
            SubmissionOutcome, SubmitResponseRequest,
        },
    },
    repositories::{AssignmentRepository, AttemptRepository, ExamRepository, ResponseRepository},
    services::{
        correctness::CorrectnessChecker,
        response_codec::ResponseCodec,
        scoring_service::{ScoreCard, ScoringEngine},
        traversal::{plan_batch, SurfacedQuestion, Traversal},
    },
};

/// Drives an attempt from creation through scoring.
///
/// An attempt is *not started* until its first batch is fetched, *in
/// progress* until traversal reports nothing left to answer, and
/// *completed* once completion has been recorded and scoring has run.
pub struct AttemptService {
    exams: Arc<dyn ExamRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    attempts: Arc<dyn AttemptRepository>,
    responses: Arc<dyn ResponseRepository>,
    permissions: Arc<dyn PermissionChecker>,
    identity: Arc<dyn IdentityResolver>,
}

impl AttemptService {
    pub fn new(
        exams: Arc<dyn ExamRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        attempts: Arc<dyn AttemptRepository>,
        responses: Arc<dyn ResponseRepository>,
        permissions: Arc<dyn PermissionChecker>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            exams,
            assignments,
            attempts,
            responses,
            permissions,
            identity,
        }
    }

    /// Starts an attempt for an assignment, or picks up the most recent
    /// incomplete one when `resume` is set.
    pub async fn create_attempt(
        &self,
        actor: &Actor,
        assignment_id: &str,
        resume: bool,
    ) -> AppResult<AttemptCreated> {
        let assignment = self
            .assignments
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Assignment with id '{}' not found", assignment_id))
            })?;

        self.permissions.check_create(
            actor,
            &Resource::Attempt {
                owner_id: assignment.user_id.clone(),
            },
        )?;

        let exam = self.load_exam(&assignment.exam_id).await?;

        if resume {
            let incomplete = self
                .attempts
                .find_incomplete_by_assignment(assignment_id)
                .await?;
            if let Some(existing) = incomplete.into_iter().next() {
                log::info!(
                    "Resuming attempt {} for assignment {}",
                    existing.id,
                    assignment_id
                );
                let batch = self.next_batch(&existing, &exam).await?;
                return Ok(AttemptCreated {
                    attempt_id: existing.id,
                    resumed: true,
                    batch: Some(batch).filter(|b| !b.is_empty()),
                });
            }
        }

        let attempt = self.attempts.create(Attempt::new(&assignment)).await?;
        log::info!(
            "Created attempt {} for assignment {} (exam {})",
            attempt.id,
            assignment_id,
            exam.id
        );

        let batch = self.next_batch(&attempt, &exam).await?;
        Ok(AttemptCreated {
            attempt_id: attempt.id,
            resumed: false,
            batch: Some(batch).filter(|b| !b.is_empty()),
        })
    }

    /// The next questions still awaiting an answer. Empty when nothing is left.
    pub async fn resume_attempt(&self, actor: &Actor, attempt_id: &str) -> AppResult<QuestionBatch> {
        let attempt = self.load_attempt(attempt_id).await?;
        let owner_id = self.identity.attempt_owner(&attempt).await?;
        self.permissions
            .check_read(actor, &Resource::Attempt { owner_id })?;
        attempt.ensure_mutable()?;

        let exam = self.load_exam(&attempt.exam_id).await?;
        self.next_batch(&attempt, &exam).await
    }

    /// Stores a value for a surfaced question.
    ///
    /// Values that fail parsing or validation are stored anyway and reported
    /// back through `valid` and `error`; the attempt carries on.
    pub async fn submit_response(
        &self,
        actor: &Actor,
        attempt_id: &str,
        question_id: &str,
        request: SubmitResponseRequest,
    ) -> AppResult<SubmissionOutcome> {
        request.validate()?;

        let attempt = self.load_attempt(attempt_id).await?;
        attempt.ensure_mutable()?;
        let owner_id = self.identity.attempt_owner(&attempt).await?;

        let mut response = self
            .responses
            .find_one(attempt_id, question_id)
            .await?
            .ok_or_else(|| AppError::UnknownQuestionForAttempt(question_id.to_string()))?;

        self.permissions.check_update(
            actor,
            &Resource::Response {
                owner_id,
                already_valid: response.is_valid(),
            },
        )?;

        let exam = self.load_exam(&attempt.exam_id).await?;
        let (_, question) = exam
            .question(question_id)
            .ok_or_else(|| AppError::UnknownQuestionForAttempt(question_id.to_string()))?;

        let outcome = ResponseCodec::apply(question, &mut response, request.value, request.text);
        CorrectnessChecker::apply(question, &mut response);
        let saved = self.responses.save(response).await?;

        if let Err(err) = &outcome {
            log::debug!(
                "Stored invalid response for question {} in attempt {}: {}",
                question_id,
                attempt_id,
                err
            );
        }

        let rejoinder = question
            .rejoinder
            .clone()
            .filter(|_| saved.correct != Some(true));

        Ok(SubmissionOutcome {
            attempt_id: attempt_id.to_string(),
            question_id: question_id.to_string(),
            valid: outcome.is_ok(),
            rejoinder,
            error: outcome.err().map(|err| err.to_string()),
        })
    }

    /// Completes the attempt when nothing is left to answer; otherwise
    /// returns what remains. Completion and score are stored together.
    pub async fn finish_attempt(&self, actor: &Actor, attempt_id: &str) -> AppResult<FinishOutcome> {
        let attempt = self.load_attempt(attempt_id).await?;
        let owner_id = self.identity.attempt_owner(&attempt).await?;
        self.permissions
            .check_update(actor, &Resource::Attempt { owner_id })?;

        if let Some(completed_at) = attempt.completed_at.filter(|_| attempt.scored_at.is_none()) {
            log::warn!("Attempt {} was completed without a score; scoring it now", attempt_id);
            let card = self.record_score(attempt_id).await?;
            return Ok(FinishOutcome::Completed {
                completed_at,
                score: card.score,
                passed: card.passed,
            });
        }
        attempt.ensure_mutable()?;

        let exam = self.load_exam(&attempt.exam_id).await?;
        let batch = self.next_batch(&attempt, &exam).await?;
        if !batch.is_empty() {
            log::info!(
                "Attempt {} cannot finish yet: {} questions remaining",
                attempt_id,
                batch.question_ids().count()
            );
            return Ok(FinishOutcome::Remaining { batch });
        }

        let card = self.score_card(&exam, attempt_id).await?;
        let completed_at = Utc::now();
        let mut completed = attempt.clone();
        completed.completed_at = Some(completed_at);
        completed.record_score(card.score, card.passed)?;

        if !self.attempts.complete(&completed).await? {
            log::warn!("Attempt {} was completed concurrently", attempt_id);
            return Err(AppError::AttemptAlreadyCompleted(attempt_id.to_string()));
        }
        log::info!(
            "Attempt {} completed: {}/{} correct, score {:?}, passed {:?}",
            attempt_id,
            card.correct,
            card.scorable,
            card.score,
            card.passed
        );

        if card.passed == Some(true) {
            self.assignments
                .mark_completed(&attempt.assignment_id, completed_at)
                .await?;
            log::info!(
                "Assignment {} completed by passing attempt {}",
                attempt.assignment_id,
                attempt_id
            );
        }

        Ok(FinishOutcome::Completed {
            completed_at,
            score: card.score,
            passed: card.passed,
        })
    }

    /// Scores a completed attempt that has no score yet. Runs at most once
    /// per attempt; a second call fails with
    /// [`AppError::ScoreAlreadyComputed`] and leaves the stored score alone.
    pub async fn record_score(&self, attempt_id: &str) -> AppResult<ScoreCard> {
        let mut attempt = self.load_attempt(attempt_id).await?;
        if !attempt.is_completed() {
            log::error!("Refusing to score incomplete attempt {}", attempt_id);
            return Err(AppError::AttemptNotYetCompleted(attempt_id.to_string()));
        }

        let exam = self.load_exam(&attempt.exam_id).await?;
        let card = self.score_card(&exam, attempt_id).await?;

        if let Err(err) = attempt.record_score(card.score, card.passed) {
            log::error!("Attempt {} scored twice", attempt_id);
            return Err(err);
        }
        if !self.attempts.save_score(&attempt).await? {
            log::error!("Attempt {} was scored concurrently", attempt_id);
            return Err(AppError::ScoreAlreadyComputed(attempt_id.to_string()));
        }

        log::info!(
            "Scored attempt {}: {}/{} correct, score {:?}, passed {:?}",
            attempt_id,
            card.correct,
            card.scorable,
            card.score,
            card.passed
        );
        Ok(card)
    }

    /// Every surfaced question that has a response, whatever the attempt's
    /// state. Correctness is shown once the attempt is completed. Never writes.
    pub async fn review_attempt(&self, actor: &Actor, attempt_id: &str) -> AppResult<QuestionBatch> {
        let attempt = self.load_attempt(attempt_id).await?;
        let owner_id = self.identity.attempt_owner(&attempt).await?;
        self.permissions
            .check_read(actor, &Resource::Attempt { owner_id })?;

        let exam = self.load_exam(&attempt.exam_id).await?;
        let responses = self.responses.find_by_attempt(attempt_id).await?;
        let surfaced: Vec<SurfacedQuestion<'_>> = Traversal::new(&exam, &responses)
            .filter(|s| s.response.is_some())
            .collect();

        Ok(QuestionBatch::build(&exam, &surfaced, attempt.is_completed()))
    }

    pub async fn get_results(&self, actor: &Actor, attempt_id: &str) -> AppResult<AttemptResults> {
        let attempt = self.load_attempt(attempt_id).await?;
        let owner_id = self.identity.attempt_owner(&attempt).await?;
        self.permissions
            .check_read(actor, &Resource::Attempt { owner_id })?;
        if !attempt.is_completed() {
            return Err(AppError::AttemptNotYetCompleted(attempt_id.to_string()));
        }

        let exam = self.load_exam(&attempt.exam_id).await?;
        let responses = self.responses.find_by_attempt(attempt_id).await?;
        let surfaced: Vec<SurfacedQuestion<'_>> = Traversal::new(&exam, &responses).collect();

        let missed_questions = surfaced
            .iter()
            .filter(|s| s.question.is_scorable())
            .filter(|s| s.response.and_then(|r| r.correct) != Some(true))
            .map(|s| QuestionSummary::from(s.question))
            .collect();
        let invalid_questions = surfaced
            .iter()
            .filter(|s| s.response.is_some_and(|r| r.is_invalid()))
            .map(|s| QuestionSummary::from(s.question))
            .collect();

        Ok(AttemptResults {
            attempt_id: attempt.id,
            score: attempt.score,
            passed: attempt.passed,
            missed_questions,
            invalid_questions,
        })
    }

    /// Plans the next batch, creates placeholders for newly surfaced
    /// questions and records the start time on the first non-empty batch.
    ///
    /// When a concurrent request stored its own selection for the section
    /// first, the batch is re-planned from the stored rows.
    async fn next_batch(&self, attempt: &Attempt, exam: &ExamDefinition) -> AppResult<QuestionBatch> {
        let responses = self.responses.find_by_attempt(&attempt.id).await?;
        let (mut batch, placeholders) = plan(exam, &attempt.id, &responses);

        if !placeholders.is_empty() {
            let selected = placeholders.len();
            let inserted = self.responses.insert_placeholders(placeholders).await?;
            log::debug!(
                "Surfaced {} new questions for attempt {}",
                inserted,
                attempt.id
            );
            if inserted < selected {
                log::debug!(
                    "Attempt {} lost a section selection race; re-planning",
                    attempt.id
                );
                let stored = self.responses.find_by_attempt(&attempt.id).await?;
                batch = plan(exam, &attempt.id, &stored).0;
            }
        }

        if !batch.is_empty() && attempt.started_at.is_none() {
            self.attempts.mark_started(&attempt.id, Utc::now()).await?;
            log::info!("Attempt {} started", attempt.id);
        }

        Ok(batch)
    }

    async fn score_card(&self, exam: &ExamDefinition, attempt_id: &str) -> AppResult<ScoreCard> {
        let responses = self.responses.find_by_attempt(attempt_id).await?;
        let surfaced: Vec<SurfacedQuestion<'_>> = Traversal::new(exam, &responses).collect();
        Ok(ScoringEngine::score(exam, &surfaced))
    }

    async fn load_attempt(&self, attempt_id: &str) -> AppResult<Attempt> {
        self.attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id)))
    }

    async fn load_exam(&self, exam_id: &str) -> AppResult<ExamDefinition> {
        self.exams
            .find_by_id(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exam with id '{}' not found", exam_id)))
    }
}

fn plan(exam: &ExamDefinition, attempt_id: &str, responses: &[Response]) -> (QuestionBatch, Vec<Response>) {
    let plan = plan_batch(Traversal::new(exam, responses), attempt_id, false);
    (
        QuestionBatch::build(exam, &plan.questions, false),
        plan.placeholders,
    )
}
