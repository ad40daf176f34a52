/// How far a user is through the question set, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: u64,
    pub answered: u64,
    pub remaining: u64,
    pub is_complete: bool,
}

impl QuizProgress {
    /// `answered` only counts questions that still exist, so it never exceeds `total`.
    #[must_use]
    pub fn new(total: u64, answered: u64) -> Self {
        let answered = answered.min(total);
        Self {
            total,
            answered,
            remaining: total - answered,
            is_complete: answered == total,
        }
    }
}
