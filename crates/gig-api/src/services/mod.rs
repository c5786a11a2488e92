//! Business logic services.

pub mod assessment;
pub mod fraud;
pub mod gemini;
pub mod users;
pub mod workflow;

pub use assessment::AssessmentService;
pub use fraud::FraudService;
pub use gemini::{GeminiClient, OracleError, TextOracle};
pub use users::{require_admin, Session, UserService};
pub use workflow::{JobWorkflow, WorkflowError, WorkflowResult};
