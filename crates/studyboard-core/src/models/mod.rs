//! Data models for the study dashboard.
//!
//! - `ChapterId`: canonical `chNN` curriculum identifier
//! - `Skill`: fixed skill categories with typed point/maximum tables
//! - `SubmissionMatrix`, `MemberProgress`, `ChapterStatus`: notebook
//!   submission state per member and chapter
//! - Board records: `QuizCompletion`, `Paper`, `Comment`, `Project`

pub mod board;
pub mod chapter;
pub mod skill;
pub mod submission;

pub use board::{
    Comment, NewComment, NewPaper, NewProject, Paper, Project, ProjectUpdate, QuizCompletion,
    DEFAULT_PROJECT_STATUS,
};
pub use chapter::{ChapterId, ParseChapterIdError};
pub use skill::Skill;
pub use submission::{ChapterStatus, MemberProgress, SubmissionMatrix};
