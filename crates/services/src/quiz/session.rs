use std::fmt;

use quiz_core::model::{OptionSlot, Question, QuestionId, UserId};

use crate::error::QuizError;

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Outcome of submitting an answer, shown before moving on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub chosen: String,
    pub correct_answer: String,
    /// Slot holding the correct answer, `None` when it matches no option.
    pub correct_slot: Option<OptionSlot>,
    pub is_correct: bool,
}

impl AnswerFeedback {
    #[must_use]
    pub fn message(&self) -> String {
        if self.is_correct {
            "Correct!".to_owned()
        } else {
            format!("Incorrect! Correct answer is {}", self.correct_answer)
        }
    }
}

impl fmt::Display for AnswerFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a quiz session stands for its current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    AwaitingSelection,
    AnswerChosen(OptionSlot),
    Recorded(AnswerFeedback),
    Completed,
}

impl QuizState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            QuizState::AwaitingSelection => "awaiting a selection",
            QuizState::AnswerChosen(_) => "an answer is chosen",
            QuizState::Recorded(_) => "the answer is recorded",
            QuizState::Completed => "completed",
        }
    }
}

/// Result of moving past a recorded answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    NextQuestion(Question),
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's pass through their unanswered questions.
///
/// Only the current question is held; the next one is always recomputed from
/// storage by `QuizEngine::advance`, so a session can be dropped and restarted
/// at any point without losing progress.
#[derive(Debug, Clone)]
pub struct QuizSession {
    user_id: UserId,
    current: Option<Question>,
    state: QuizState,
}

impl QuizSession {
    pub(crate) fn new(user_id: UserId, first: Option<Question>) -> Self {
        let state = if first.is_some() {
            QuizState::AwaitingSelection
        } else {
            QuizState::Completed
        };
        Self {
            user_id,
            current: first,
            state,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The question being answered, `None` once completed.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> &QuizState {
        &self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, QuizState::Completed)
    }

    /// The currently selected option, if any.
    #[must_use]
    pub fn selection(&self) -> Option<OptionSlot> {
        match self.state {
            QuizState::AnswerChosen(slot) => Some(slot),
            _ => None,
        }
    }

    /// Pick an option. May be called repeatedly until the answer is submitted.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Completed` when there is nothing left to answer.
    /// Returns `QuizError::InvalidTransition` once the answer is recorded.
    pub fn select(&mut self, slot: OptionSlot) -> Result<(), QuizError> {
        match self.state {
            QuizState::AwaitingSelection | QuizState::AnswerChosen(_) => {
                self.state = QuizState::AnswerChosen(slot);
                Ok(())
            }
            QuizState::Completed => Err(QuizError::Completed),
            QuizState::Recorded(_) => Err(self.invalid("select")),
        }
    }

    pub(crate) fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    pub(crate) fn set_recorded(&mut self, feedback: AnswerFeedback) {
        self.state = QuizState::Recorded(feedback);
    }

    pub(crate) fn set_next(&mut self, next: Option<Question>) {
        self.state = if next.is_some() {
            QuizState::AwaitingSelection
        } else {
            QuizState::Completed
        };
        self.current = next;
    }
}
