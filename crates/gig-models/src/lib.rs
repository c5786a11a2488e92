//! Shared data models for the Gigboard backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and the lifecycle rules that move them between states
//! - Users and roles
//! - Fraud reports
//! - Typed documents produced by the text-generation oracle (resumes, quizzes)

pub mod assessment;
pub mod fraud;
pub mod job;
pub mod user;

// Re-export common types
pub use assessment::{
    parse_quiz, parse_resume, parse_verdict, strip_code_fence, DocumentError, Quiz,
    QuizQuestion, QuizVerdict, ResumeProfile,
};
pub use fraud::{FraudReport, FraudStatus, NewFraudReport, ReportId};
pub use job::{Job, JobAction, JobEdit, JobId, JobStatus, NewJob, TransitionError};
pub use user::{FreelancerDetails, NewClient, Role, StoredPassword, User, UserId};
