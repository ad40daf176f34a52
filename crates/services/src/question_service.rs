use std::sync::Arc;

use quiz_core::model::{Question, QuestionDraft, QuestionId};
use storage::repository::QuestionRepository;

use crate::error::QuestionServiceError;

/// Admin-side question management.
///
/// Drafts are stored as given: whether `answer` matches one of the options is
/// left to the caller (see `QuestionDraft::answer_slot`).
#[derive(Clone)]
pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn create_question(
        &self,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionServiceError> {
        if draft.answer_slot().is_none() {
            tracing::warn!(text = %draft.text, "answer does not match any option");
        }
        Ok(self.questions.create_question(&draft).await?)
    }

    /// Overwrite a question. `Ok(None)` when the ID is absent.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn update_question(
        &self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, QuestionServiceError> {
        Ok(self.questions.update_question(id, &draft).await?)
    }

    /// Delete a question; responses to it are kept as orphans.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn delete_question(&self, id: QuestionId) -> Result<bool, QuestionServiceError> {
        Ok(self.questions.delete_question(id).await?)
    }

    /// All questions in creation order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn list_questions(&self) -> Result<Vec<Question>, QuestionServiceError> {
        Ok(self.questions.list_questions().await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn get_question(
        &self,
        id: QuestionId,
    ) -> Result<Option<Question>, QuestionServiceError> {
        Ok(self.questions.get_question(id).await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn count_questions(&self) -> Result<u64, QuestionServiceError> {
        Ok(self.questions.count_questions().await?)
    }

    /// Remove every question. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn clear_questions(&self) -> Result<u64, QuestionServiceError> {
        Ok(self.questions.clear_questions().await?)
    }
}
