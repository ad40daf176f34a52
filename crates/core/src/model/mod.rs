mod ids;
mod question;
mod report;
mod response;
mod user;

pub use ids::{QuestionId, ResponseId, UserId};

pub use question::{OptionSlot, Question, QuestionDraft};
pub use report::{Report, ReportEntry, ReportStatus, ReportTotals};
pub use response::{NewResponse, Response};
pub use user::{ParseRoleError, Role, User, UserProfile};
