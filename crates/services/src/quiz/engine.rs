use std::sync::Arc;

use quiz_core::model::{NewResponse, OptionSlot, Question, QuestionId, Response, UserId};
use storage::repository::{QuestionRepository, ResponseRepository, StorageError};

use super::progress::QuizProgress;
use super::session::{AnswerFeedback, QuizSession, QuizState, QuizStep};
use crate::Clock;
use crate::error::QuizError;

/// Derives what a user still has to answer and records their answers.
///
/// Nothing is cached: every query reads the current durable state.
#[derive(Clone)]
pub struct QuizEngine {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            responses,
        }
    }

    /// Questions the user has no response for, in listing order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if repository access fails.
    pub async fn unanswered_questions(&self, user_id: UserId) -> Result<Vec<Question>, QuizError> {
        Ok(self.questions.list_unanswered(user_id).await?)
    }

    /// Append a response carrying only a correctness flag.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage(StorageError::NotFound)` if the question does not exist.
    /// Returns `QuizError::AlreadyAnswered` if the user already answered it.
    pub async fn record_response(
        &self,
        question_id: QuestionId,
        user_id: UserId,
        is_correct: bool,
    ) -> Result<Response, QuizError> {
        self.stored_question(question_id).await?;
        let response = NewResponse::flag_only(question_id, user_id, is_correct, self.clock.now());
        self.append(response).await
    }

    /// Grade `chosen` against the stored version of the question and append the response.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage(StorageError::NotFound)` if the question was deleted.
    /// Returns `QuizError::AlreadyAnswered` if the user already answered it.
    /// Returns `QuizError::Storage` if persistence fails.
    pub async fn record_answer(
        &self,
        question: &Question,
        user_id: UserId,
        chosen: &str,
    ) -> Result<Response, QuizError> {
        let stored = self.stored_question(question.id()).await?;
        let response = NewResponse::graded(&stored, user_id, chosen, self.clock.now());
        self.append(response).await
    }

    async fn stored_question(&self, question_id: QuestionId) -> Result<Question, QuizError> {
        Ok(self
            .questions
            .get_question(question_id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }

    async fn append(&self, response: NewResponse) -> Result<Response, QuizError> {
        let question_id = response.question_id;
        let user_id = response.user_id;
        match self.responses.append_response(response).await {
            Ok(stored) => {
                tracing::debug!(
                    question_id = %question_id,
                    user_id = %user_id,
                    is_correct = stored.is_correct,
                    "response recorded"
                );
                Ok(stored)
            }
            Err(StorageError::DuplicateEntry(_)) => Err(QuizError::AlreadyAnswered {
                question_id,
                user_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// True once the user has a response for every existing question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if repository access fails.
    pub async fn all_questions_attempted(&self, user_id: UserId) -> Result<bool, QuizError> {
        Ok(self.progress(user_id).await?.is_complete)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Storage` if repository access fails.
    pub async fn has_responded(
        &self,
        question_id: QuestionId,
        user_id: UserId,
    ) -> Result<bool, QuizError> {
        Ok(self.responses.has_response(question_id, user_id).await?)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Storage` if repository access fails.
    pub async fn progress(&self, user_id: UserId) -> Result<QuizProgress, QuizError> {
        let total = self.questions.count_questions().await?;
        let answered = self.responses.count_answered_questions(user_id).await?;
        Ok(QuizProgress::new(total, answered))
    }

    /// Delete every recorded response. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if persistence fails.
    pub async fn clear_responses(&self) -> Result<u64, QuizError> {
        let removed = self.responses.clear_responses().await?;
        tracing::info!(removed, "responses cleared");
        Ok(removed)
    }

    /// Start a session at the user's first unanswered question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if repository access fails.
    pub async fn start_session(&self, user_id: UserId) -> Result<QuizSession, QuizError> {
        let first = self.unanswered_questions(user_id).await?.into_iter().next();
        Ok(QuizSession::new(user_id, first))
    }

    /// Record the selected option for the current question.
    ///
    /// The answer is graded against the question as currently stored. When the
    /// question was deleted or already answered since the session reached it,
    /// the session moves on to the next unanswered question (or completes) and
    /// the error is returned so the caller can tell the user.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSelection` if no option was selected.
    /// Returns `QuizError::Completed` if the session has finished.
    /// Returns `QuizError::InvalidTransition` if the answer is already recorded.
    /// Returns `QuizError::AlreadyAnswered` if the response exists in storage.
    /// Returns `QuizError::Storage(StorageError::NotFound)` if the question was deleted.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<AnswerFeedback, QuizError> {
        let slot = match session.state() {
            QuizState::AnswerChosen(slot) => *slot,
            QuizState::AwaitingSelection => return Err(QuizError::NoSelection),
            QuizState::Completed => return Err(QuizError::Completed),
            QuizState::Recorded(_) => return Err(session.invalid("submit")),
        };
        let question_id = session
            .current_question()
            .map(Question::id)
            .ok_or(QuizError::Completed)?;

        match self.answer_stored(question_id, session.user_id(), slot).await {
            Ok(feedback) => {
                session.set_recorded(feedback.clone());
                Ok(feedback)
            }
            Err(
                err @ (QuizError::AlreadyAnswered { .. }
                | QuizError::Storage(StorageError::NotFound)),
            ) => {
                tracing::warn!(question_id = %question_id, error = %err, "skipping stale question");
                self.move_to_next(session).await?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn answer_stored(
        &self,
        question_id: QuestionId,
        user_id: UserId,
        slot: OptionSlot,
    ) -> Result<AnswerFeedback, QuizError> {
        let question = self.stored_question(question_id).await?;
        let chosen = question.option(slot).to_owned();
        let response = NewResponse::graded(&question, user_id, &chosen, self.clock.now());
        let stored = self.append(response).await?;
        Ok(AnswerFeedback {
            question_id,
            chosen,
            correct_answer: question.answer().to_owned(),
            correct_slot: question.answer_slot(),
            is_correct: stored.is_correct,
        })
    }

    /// Move to the next unanswered question, or complete the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` unless the current answer is recorded.
    /// Returns `QuizError::Storage` if repository access fails.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<QuizStep, QuizError> {
        match session.state() {
            QuizState::Recorded(_) => {}
            QuizState::Completed => return Err(QuizError::Completed),
            _ => return Err(session.invalid("advance")),
        }
        self.move_to_next(session).await
    }

    async fn move_to_next(&self, session: &mut QuizSession) -> Result<QuizStep, QuizError> {
        let next = self
            .unanswered_questions(session.user_id())
            .await?
            .into_iter()
            .next();
        session.set_next(next.clone());
        Ok(match next {
            Some(question) => QuizStep::NextQuestion(question),
            None => {
                tracing::info!(user_id = %session.user_id(), "quiz completed");
                QuizStep::Completed
            }
        })
    }
}
