use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::QuestionId;

//
// ─── OPTION SLOT ───────────────────────────────────────────────────────────────
//

/// One of the four answer positions of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSlot {
    A,
    B,
    C,
    D,
}

impl OptionSlot {
    pub const ALL: [OptionSlot; 4] = [OptionSlot::A, OptionSlot::B, OptionSlot::C, OptionSlot::D];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            OptionSlot::A => 0,
            OptionSlot::B => 1,
            OptionSlot::C => 2,
            OptionSlot::D => 3,
        }
    }

    #[must_use]
    pub fn label(self) -> char {
        match self {
            OptionSlot::A => 'A',
            OptionSlot::B => 'B',
            OptionSlot::C => 'C',
            OptionSlot::D => 'D',
        }
    }
}

impl fmt::Display for OptionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Editable content of a question.
///
/// The store does not check that `answer` equals one of the options; callers
/// that care use [`QuestionDraft::answer_slot`] before saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub options: [String; 4],
    pub answer: String,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        options: [&str; 4],
        answer: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.map(str::to_owned),
            answer: answer.into(),
        }
    }

    /// The slot whose option text equals the answer, if any.
    #[must_use]
    pub fn answer_slot(&self) -> Option<OptionSlot> {
        slot_for(&self.options, &self.answer)
    }
}

fn slot_for(options: &[String; 4], answer: &str) -> Option<OptionSlot> {
    OptionSlot::ALL
        .into_iter()
        .find(|slot| options[slot.index()] == answer)
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A stored multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: [String; 4],
    answer: String,
}

impl Question {
    #[must_use]
    pub fn from_persisted(id: QuestionId, draft: QuestionDraft) -> Self {
        Self {
            id,
            text: draft.text,
            options: draft.options,
            answer: draft.answer,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; 4] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, slot: OptionSlot) -> &str {
        &self.options[slot.index()]
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn answer_slot(&self) -> Option<OptionSlot> {
        slot_for(&self.options, &self.answer)
    }

    /// Compares the chosen option text against the stored answer.
    #[must_use]
    pub fn is_correct(&self, chosen: &str) -> bool {
        self.answer == chosen
    }

    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            text: self.text.clone(),
            options: self.options.clone(),
            answer: self.answer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capital() -> Question {
        Question::from_persisted(
            QuestionId::new(1),
            QuestionDraft::new("Capital of France?", ["Rome", "Paris", "Oslo", "Bern"], "Paris"),
        )
    }

    #[test]
    fn option_lookup_by_slot() {
        let q = capital();
        assert_eq!(q.option(OptionSlot::A), "Rome");
        assert_eq!(q.option(OptionSlot::D), "Bern");
        assert_eq!(q.answer_slot(), Some(OptionSlot::B));
    }

    #[test]
    fn answer_outside_options_has_no_slot() {
        let draft = QuestionDraft::new("?", ["1", "2", "3", "4"], "5");
        assert_eq!(draft.answer_slot(), None);
    }

    #[test]
    fn correctness_compares_exact_text() {
        let q = capital();
        assert!(q.is_correct("Paris"));
        assert!(!q.is_correct("paris"));
    }
}
