use quiz_core::model::{NewResponse, QuestionDraft, Role, UserId, UserProfile};
use quiz_core::time::fixed_now;
use storage::repository::{
    QuestionRepository, ResponseRepository, SessionCacheRepository, Storage, StorageError,
    UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn open(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn profile(name: &str, phone: &str) -> UserProfile {
    UserProfile::new(name, phone, "pw", Some(format!("{name}.png")))
}

fn draft(text: &str, answer: &str) -> QuestionDraft {
    QuestionDraft::new(text, ["A", "B", "C", "D"], answer)
}

#[tokio::test]
async fn sqlite_users_enforce_unique_phone() {
    let repo = open("memdb_unique_phone").await;

    let created = repo.create_user(&profile("Ana", "555")).await.unwrap();
    assert_eq!(created.role(), Role::Regular);
    assert_eq!(created.image(), Some("Ana.png"));

    let err = repo.create_user(&profile("Ben", "555")).await.unwrap_err();
    assert!(matches!(err, StorageError::DuplicateEntry(_)));

    let other = repo.create_user(&profile("Ben", "556")).await.unwrap();
    let err = repo
        .update_user(other.id(), &profile("Ben", "555"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateEntry(_)));
}

#[tokio::test]
async fn sqlite_credentials_and_listing() {
    let repo = open("memdb_credentials").await;
    repo.insert_admin(&UserProfile::new("Admin", "1", "root", None))
        .await
        .unwrap();
    let ana = repo.create_user(&profile("Ana", "555")).await.unwrap();

    assert!(repo.has_admin().await.unwrap());
    let found = repo.get_user_by_credentials("555", "pw").await.unwrap();
    assert_eq!(found.map(|u| u.id()), Some(ana.id()));
    assert!(
        repo.get_user_by_credentials("555", "PW")
            .await
            .unwrap()
            .is_none()
    );

    let regular = repo.list_regular_users().await.unwrap();
    assert_eq!(regular.len(), 1);
    assert_eq!(regular[0].name(), "Ana");
}

#[tokio::test]
async fn sqlite_update_and_delete_absent_ids_are_silent() {
    let repo = open("memdb_absent_ids").await;

    let missing = repo
        .update_user(UserId::new(404), &profile("Nobody", "0"))
        .await
        .unwrap();
    assert!(missing.is_none());
    assert!(!repo.delete_user(UserId::new(404)).await.unwrap());

    let q = repo.create_question(&draft("Q", "A")).await.unwrap();
    assert!(repo.delete_question(q.id()).await.unwrap());
    assert!(
        repo.update_question(q.id(), &draft("Q2", "B"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn sqlite_question_update_is_reflected_in_listing() {
    let repo = open("memdb_question_update").await;
    let q1 = repo.create_question(&draft("First", "A")).await.unwrap();
    let q2 = repo.create_question(&draft("Second", "B")).await.unwrap();

    let edited = QuestionDraft::new("First, edited", ["W", "X", "Y", "Z"], "Y");
    let updated = repo.update_question(q1.id(), &edited).await.unwrap().unwrap();
    assert_eq!(updated.text(), "First, edited");

    let listed = repo.list_questions().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id(), q1.id());
    assert_eq!(listed[0].to_draft(), edited);
    assert_eq!(listed[1].id(), q2.id());
    assert_eq!(repo.count_questions().await.unwrap(), 2);
}

#[tokio::test]
async fn sqlite_responses_drive_unanswered_and_counts() {
    let repo = open("memdb_responses").await;
    let user = repo.create_user(&profile("Ana", "555")).await.unwrap();
    let q1 = repo.create_question(&draft("Q1", "A")).await.unwrap();
    let q2 = repo.create_question(&draft("Q2", "B")).await.unwrap();

    let unanswered = repo.list_unanswered(user.id()).await.unwrap();
    assert_eq!(unanswered.len(), 2);

    let stored = repo
        .append_response(NewResponse::graded(&q1, user.id(), "A", fixed_now()))
        .await
        .unwrap();
    assert!(stored.is_correct);

    let unanswered = repo.list_unanswered(user.id()).await.unwrap();
    assert_eq!(unanswered.iter().map(|q| q.id()).collect::<Vec<_>>(), vec![q2.id()]);
    assert!(repo.has_response(q1.id(), user.id()).await.unwrap());
    assert_eq!(repo.count_answered_questions(user.id()).await.unwrap(), 1);

    let dup = repo
        .append_response(NewResponse::flag_only(q1.id(), user.id(), false, fixed_now()))
        .await
        .unwrap_err();
    assert!(matches!(dup, StorageError::DuplicateEntry(_)));

    let responses = repo.responses_for_user(user.id()).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].chosen_answer.as_deref(), Some("A"));
    assert_eq!(responses[0].answered_at, fixed_now());

    let with_responses = repo.list_users_with_responses().await.unwrap();
    assert_eq!(with_responses.len(), 1);
}

#[tokio::test]
async fn sqlite_deletes_leave_orphan_responses() {
    let repo = open("memdb_orphans").await;
    let user = repo.create_user(&profile("Ana", "555")).await.unwrap();
    let q1 = repo.create_question(&draft("Q1", "A")).await.unwrap();
    repo.append_response(NewResponse::flag_only(q1.id(), user.id(), true, fixed_now()))
        .await
        .unwrap();

    repo.delete_question(q1.id()).await.unwrap();
    repo.delete_user(user.id()).await.unwrap();

    let orphans = repo.responses_for_user(user.id()).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(repo.count_answered_questions(user.id()).await.unwrap(), 0);

    assert_eq!(repo.clear_responses().await.unwrap(), 1);
    assert!(repo.responses_for_user(user.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_clear_questions_reports_count() {
    let repo = open("memdb_clear_questions").await;
    for i in 0..3 {
        repo.create_question(&draft(&format!("Q{i}"), "A"))
            .await
            .unwrap();
    }
    assert_eq!(repo.clear_questions().await.unwrap(), 3);
    assert_eq!(repo.count_questions().await.unwrap(), 0);
}

#[tokio::test]
async fn sqlite_session_cache_upserts() {
    let repo = open("memdb_session_cache").await;
    repo.put_value("user", "one").await.unwrap();
    repo.put_value("user", "two").await.unwrap();
    assert_eq!(repo.get_value("user").await.unwrap().as_deref(), Some("two"));
    assert!(repo.remove_value("user").await.unwrap());
    assert_eq!(repo.get_value("user").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_file_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("quiz.sqlite3").display());

    let question_id = {
        let storage = Storage::sqlite(&url).await.expect("open");
        let q = storage
            .questions
            .create_question(&draft("Persisted", "C"))
            .await
            .unwrap();
        storage
            .responses
            .append_response(NewResponse::flag_only(q.id(), UserId::new(1), true, fixed_now()))
            .await
            .unwrap();
        q.id()
    };

    let reopened = Storage::sqlite(&url).await.expect("reopen");
    let listed = reopened.questions.list_questions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), question_id);
    assert!(
        reopened
            .questions
            .list_unanswered(UserId::new(1))
            .await
            .unwrap()
            .is_empty()
    );
}
