pub mod resume;
pub mod user;

pub use resume::{DocumentStatus, ResumeDocument, ResumeRow, SecurityState, VersionHistoryRow};
pub use user::User;
