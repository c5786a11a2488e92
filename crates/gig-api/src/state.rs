//! Application state.

use std::sync::Arc;

use gig_store::{MemoryStore, WriteMode};

use crate::auth::IdentityResolver;
use crate::config::ApiConfig;
use crate::services::{
    AssessmentService, FraudService, GeminiClient, JobWorkflow, OracleError, TextOracle,
    UserService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<IdentityResolver>,
    pub workflow: JobWorkflow,
    pub user_service: UserService,
    pub fraud_service: FraudService,
}

impl AppState {
    /// Create application state with the Gemini oracle.
    pub fn new(config: ApiConfig) -> Result<Self, OracleError> {
        let oracle = Arc::new(GeminiClient::new(&config.gemini)?);
        Ok(Self::with_oracle(config, oracle))
    }

    /// Create application state around any text oracle.
    pub fn with_oracle(config: ApiConfig, oracle: Arc<dyn TextOracle>) -> Self {
        let write_mode = if config.workflow.strict_writes {
            WriteMode::Versioned
        } else {
            WriteMode::LastWriterWins
        };
        let store = Arc::new(MemoryStore::new(write_mode));
        let identity = Arc::new(IdentityResolver::new(&config.auth));

        let workflow = JobWorkflow::new(store.clone(), store.clone())
            .with_lifecycle_enforcement(config.workflow.enforce_lifecycle);
        let user_service = UserService::new(
            store.clone(),
            AssessmentService::new(oracle),
            Arc::clone(&identity),
        );
        let fraud_service = FraudService::new(store.clone(), store.clone());

        Self {
            config,
            store,
            identity,
            workflow,
            user_service,
            fraud_service,
        }
    }
}
