use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, ResponseId, UserId};
use crate::model::question::Question;

/// A response waiting to be appended.
///
/// `is_correct` is the canonical record of the outcome; `chosen_answer` keeps
/// the literal option text for display and is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub is_correct: bool,
    pub chosen_answer: Option<String>,
    pub answered_at: DateTime<Utc>,
}

impl NewResponse {
    /// Grades `chosen` against the question's answer.
    #[must_use]
    pub fn graded(
        question: &Question,
        user_id: UserId,
        chosen: &str,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id: question.id(),
            user_id,
            is_correct: question.is_correct(chosen),
            chosen_answer: Some(chosen.to_owned()),
            answered_at,
        }
    }

    /// A response carrying only the correctness flag.
    #[must_use]
    pub fn flag_only(
        question_id: QuestionId,
        user_id: UserId,
        is_correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            user_id,
            is_correct,
            chosen_answer: None,
            answered_at,
        }
    }
}

/// A recorded answer event linking a user to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub is_correct: bool,
    pub chosen_answer: Option<String>,
    pub answered_at: DateTime<Utc>,
}

impl Response {
    #[must_use]
    pub fn from_new(id: ResponseId, new: NewResponse) -> Self {
        Self {
            id,
            question_id: new.question_id,
            user_id: new.user_id,
            is_correct: new.is_correct,
            chosen_answer: new.chosen_answer,
            answered_at: new.answered_at,
        }
    }
}
