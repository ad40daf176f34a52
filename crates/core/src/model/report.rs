use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, UserId};
use crate::model::question::Question;
use crate::model::response::Response;

/// Classification of one question for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Correct,
    Incorrect,
    Unanswered,
}

impl ReportStatus {
    #[must_use]
    pub fn from_response(response: Option<&Response>) -> Self {
        match response {
            Some(r) if r.is_correct => ReportStatus::Correct,
            Some(_) => ReportStatus::Incorrect,
            None => ReportStatus::Unanswered,
        }
    }
}

/// One line of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub question: Question,
    pub status: ReportStatus,
    pub chosen_answer: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
}

impl ReportTotals {
    #[must_use]
    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.unanswered
    }
}

/// Per-question correctness report for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    user_id: UserId,
    entries: Vec<ReportEntry>,
    totals: ReportTotals,
}

impl Report {
    /// Classifies every question in listing order.
    ///
    /// Responses for other users or for questions not in `questions` are
    /// ignored. When several responses exist for the same question the first
    /// one (lowest id) wins.
    #[must_use]
    pub fn build(user_id: UserId, questions: Vec<Question>, responses: &[Response]) -> Self {
        let mut by_question: HashMap<QuestionId, &Response> = HashMap::new();
        for response in responses.iter().filter(|r| r.user_id == user_id) {
            by_question
                .entry(response.question_id)
                .and_modify(|existing| {
                    if response.id < existing.id {
                        *existing = response;
                    }
                })
                .or_insert(response);
        }

        let mut totals = ReportTotals::default();
        let entries = questions
            .into_iter()
            .map(|question| {
                let response = by_question.get(&question.id()).copied();
                let status = ReportStatus::from_response(response);
                match status {
                    ReportStatus::Correct => totals.correct += 1,
                    ReportStatus::Incorrect => totals.incorrect += 1,
                    ReportStatus::Unanswered => totals.unanswered += 1,
                }
                ReportEntry {
                    question,
                    status,
                    chosen_answer: response.and_then(|r| r.chosen_answer.clone()),
                }
            })
            .collect();

        Self {
            user_id,
            entries,
            totals,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    #[must_use]
    pub fn totals(&self) -> ReportTotals {
        self.totals
    }

    /// Question ids paired with their status, in listing order.
    #[must_use]
    pub fn statuses(&self) -> Vec<(QuestionId, ReportStatus)> {
        self.entries
            .iter()
            .map(|e| (e.question.id(), e.status))
            .collect()
    }
}
