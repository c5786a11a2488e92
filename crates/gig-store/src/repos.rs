//! Repository contracts.
//!
//! Each write is atomic for the single record it touches. Nothing here
//! coordinates writes across records or across requests.

use async_trait::async_trait;

use gig_models::{FraudReport, Job, JobId, Role, User, UserId};

use crate::error::StoreResult;

/// Durable collection of jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Store a new job and return it with its assigned id.
    async fn insert(&self, job: Job) -> StoreResult<Job>;

    async fn get(&self, id: JobId) -> StoreResult<Option<Job>>;

    /// Overwrite an existing job. Fails with `NotFound` if it was deleted meanwhile.
    async fn update(&self, job: Job) -> StoreResult<Job>;

    async fn delete(&self, job: &Job) -> StoreResult<()>;

    async fn list_all(&self) -> StoreResult<Vec<Job>>;

    async fn list_by_client(&self, client_id: UserId) -> StoreResult<Vec<Job>>;

    async fn list_by_freelancer(&self, freelancer_id: UserId) -> StoreResult<Vec<Job>>;
}

/// Durable collection of users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user and return it with its assigned id. Emails are unique.
    async fn insert(&self, user: User) -> StoreResult<User>;

    async fn get(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn update(&self, user: User) -> StoreResult<User>;

    async fn delete(&self, id: UserId) -> StoreResult<()>;

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>>;
}

/// Durable collection of fraud reports.
#[async_trait]
pub trait FraudReportRepository: Send + Sync {
    async fn insert(&self, report: FraudReport) -> StoreResult<FraudReport>;

    async fn list_all(&self) -> StoreResult<Vec<FraudReport>>;
}
