mod activity;
mod ids;
mod question;
mod review;

pub use activity::ActivityLog;
pub use ids::{QuestionId, SubjectId, TopicId, UnitId, UserId};
pub use question::{Question, QuestionContent, QuestionKind};
pub use review::{DEFAULT_EASE_FACTOR, Rating, ReviewError, ReviewState, ReviewUpdate};
