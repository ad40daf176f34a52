#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod question_service;
pub mod quiz;
pub mod report_service;
pub mod user_service;

pub use quiz_core::Clock;

pub use app_services::{AppServices, ensure_admin, initialize_store};
pub use auth_service::{AuthService, SignedInUser};
pub use error::{
    AuthError, InitError, QuestionServiceError, QuizError, ReportError, UserServiceError,
};
pub use question_service::QuestionService;
pub use quiz::{AnswerFeedback, QuizEngine, QuizProgress, QuizSession, QuizState, QuizStep};
pub use report_service::ReportService;
pub use user_service::UserService;
