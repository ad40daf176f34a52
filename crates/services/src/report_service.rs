use std::sync::Arc;

use quiz_core::model::{Report, Response, User, UserId};
use storage::repository::{QuestionRepository, ResponseRepository, UserRepository};

use crate::error::ReportError;

/// Builds per-user correctness reports for the admin and user report screens.
#[derive(Clone)]
pub struct ReportService {
    users: Arc<dyn UserRepository>,
    questions: Arc<dyn QuestionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        questions: Arc<dyn QuestionRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            users,
            questions,
            responses,
        }
    }

    /// Classify every question as correct, incorrect or unanswered for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if repository access fails.
    pub async fn build_report(&self, user_id: UserId) -> Result<Report, ReportError> {
        let questions = self.questions.list_questions().await?;
        let responses = self.responses.responses_for_user(user_id).await?;
        let report = Report::build(user_id, questions, &responses);
        tracing::debug!(
            user_id = %user_id,
            correct = report.totals().correct,
            incorrect = report.totals().incorrect,
            unanswered = report.totals().unanswered,
            "report built"
        );
        Ok(report)
    }

    /// Users with at least one recorded response.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if repository access fails.
    pub async fn users_with_responses(&self) -> Result<Vec<User>, ReportError> {
        Ok(self.users.list_users_with_responses().await?)
    }

    /// Raw responses for a user, oldest first. Includes orphans.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if repository access fails.
    pub async fn responses_for_user(&self, user_id: UserId) -> Result<Vec<Response>, ReportError> {
        Ok(self.responses.responses_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quiz_core::model::{NewResponse, QuestionDraft, ReportStatus, UserProfile};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service(repo: &Arc<InMemoryRepository>) -> ReportService {
        ReportService::new(repo.clone(), repo.clone(), repo.clone())
    }

    #[tokio::test]
    async fn every_question_lands_in_exactly_one_bucket() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut ids = Vec::new();
        for answer in ["a", "b", "c"] {
            let q = repo
                .create_question(&QuestionDraft::new("?", ["a", "b", "c", "d"], answer))
                .await
                .unwrap();
            ids.push(q.id());
        }
        let user = UserId::new(4);
        let now = fixed_now();
        repo.append_response(NewResponse::flag_only(ids[0], user, true, now))
            .await
            .unwrap();
        repo.append_response(NewResponse::flag_only(ids[1], user, false, now))
            .await
            .unwrap();

        let report = service(&repo).build_report(user).await.unwrap();

        assert_eq!(
            report.statuses(),
            vec![
                (ids[0], ReportStatus::Correct),
                (ids[1], ReportStatus::Incorrect),
                (ids[2], ReportStatus::Unanswered),
            ]
        );
        assert_eq!(report.totals().total(), 3);
    }

    #[tokio::test]
    async fn orphan_responses_are_ignored() {
        let repo = Arc::new(InMemoryRepository::new());
        let q = repo
            .create_question(&QuestionDraft::new("?", ["a", "b", "c", "d"], "a"))
            .await
            .unwrap();
        let user = UserId::new(1);
        repo.append_response(NewResponse::flag_only(q.id(), user, true, fixed_now()))
            .await
            .unwrap();
        repo.delete_question(q.id()).await.unwrap();

        let service = service(&repo);
        let report = service.build_report(user).await.unwrap();
        assert!(report.entries().is_empty());
        assert_eq!(service.responses_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_users_who_answered_are_listed() {
        let repo = Arc::new(InMemoryRepository::new());
        let ana = repo
            .create_user(&UserProfile::new("Ana", "1", "a", None))
            .await
            .unwrap();
        repo.create_user(&UserProfile::new("Ben", "2", "b", None))
            .await
            .unwrap();
        let q = repo
            .create_question(&QuestionDraft::new("?", ["a", "b", "c", "d"], "a"))
            .await
            .unwrap();
        repo.append_response(NewResponse::flag_only(q.id(), ana.id(), true, fixed_now()))
            .await
            .unwrap();

        let listed = service(&repo).users_with_responses().await.unwrap();
        assert_eq!(listed, vec![ana]);
    }
}
