//! Job workflow engine.
//!
//! Every mutating operation follows the same sequence: load the job, apply
//! the lifecycle rule for the caller, then persist the result. Nothing is
//! written when a rule refuses. Concurrent requests for the same job are not
//! serialized here; the store's write mode decides what happens when two of
//! them race.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use gig_models::{Job, JobAction, JobEdit, JobId, JobStatus, NewJob, Role, TransitionError, UserId};
use gig_store::{JobRepository, StoreError, UserRepository};

use crate::auth::Identity;
use crate::metrics;
use crate::security::{sanitize_string, sanitize_title};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => WorkflowError::NotFound(path),
            StoreError::PreconditionFailed(msg) => {
                WorkflowError::Conflict(format!("job was modified concurrently: {}", msg))
            }
            other => WorkflowError::Storage(other),
        }
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(err: validator::ValidationErrors) -> Self {
        WorkflowError::Validation(err.to_string())
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Applies job operations on behalf of authenticated callers.
#[derive(Clone)]
pub struct JobWorkflow {
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserRepository>,
    enforce_lifecycle: bool,
}

impl JobWorkflow {
    pub fn new(jobs: Arc<dyn JobRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            jobs,
            users,
            enforce_lifecycle: false,
        }
    }

    /// Reject any transition outside the lifecycle diagram with a conflict.
    pub fn with_lifecycle_enforcement(mut self, enabled: bool) -> Self {
        self.enforce_lifecycle = enabled;
        self
    }

    /// Create a job owned by the caller.
    pub async fn post(&self, caller: &Identity, mut new_job: NewJob) -> WorkflowResult<Job> {
        new_job.title = sanitize_title(&new_job.title);
        new_job.description = sanitize_string(&new_job.description);
        new_job.validate()?;

        if let Some(freelancer_id) = new_job.freelancer_id {
            self.require_freelancer(freelancer_id).await?;
        }

        let job = self
            .jobs
            .insert(Job::draft(caller.user_id, new_job))
            .await
            .inspect_err(|_| metrics::record_job_transition("post", "error"))?;

        info!(job_id = %job.id, client_id = %job.client_id, "Job posted");
        metrics::record_job_transition("post", "ok");
        Ok(job)
    }

    /// Attach a freelancer to the caller's job.
    pub async fn assign_freelancer(
        &self,
        caller: &Identity,
        job_id: JobId,
        freelancer_id: UserId,
    ) -> WorkflowResult<Job> {
        let mut job = self.load(job_id).await?;
        let previous = job.status;

        if let Err(e) = job.assign_freelancer(caller.user_id, freelancer_id) {
            return Err(self.reject(JobAction::Assign, caller, job_id, e));
        }
        self.require_freelancer(freelancer_id).await?;

        self.commit(JobAction::Assign, caller, previous, job).await
    }

    /// The assigned freelancer proposes a price.
    pub async fn set_price(&self, caller: &Identity, job_id: JobId, price: u32) -> WorkflowResult<Job> {
        self.apply(JobAction::SetPrice, caller, job_id, |job, who| job.set_price(who, price))
            .await
    }

    /// The owner records payment. A paid job becomes active.
    pub async fn update_payment(&self, caller: &Identity, job_id: JobId, paid: bool) -> WorkflowResult<Job> {
        self.apply(JobAction::UpdatePayment, caller, job_id, |job, who| job.set_paid(who, paid))
            .await
    }

    /// The owner rewrites an unpaid job.
    pub async fn edit(&self, caller: &Identity, job_id: JobId, mut edit: JobEdit) -> WorkflowResult<Job> {
        edit.title = sanitize_title(&edit.title);
        edit.description = sanitize_string(&edit.description);
        edit.validate()?;

        self.apply(JobAction::Edit, caller, job_id, |job, who| job.edit(who, edit))
            .await
    }

    /// The owner removes a job.
    pub async fn delete(&self, caller: &Identity, job_id: JobId) -> WorkflowResult<()> {
        let job = self.load(job_id).await?;
        if let Err(e) = job.authorize_delete(caller.user_id) {
            return Err(self.reject(JobAction::Delete, caller, job_id, e));
        }
        if job.paid {
            warn!(job_id = %job_id, "Deleting a paid job");
        }

        self.jobs
            .delete(&job)
            .await
            .inspect_err(|e| self.record_store_failure(JobAction::Delete, job_id, e))?;

        info!(job_id = %job_id, caller = %caller.user_id, "Job deleted");
        metrics::record_job_transition(JobAction::Delete.as_str(), "ok");
        Ok(())
    }

    pub async fn accept(&self, caller: &Identity, job_id: JobId) -> WorkflowResult<Job> {
        self.apply(JobAction::Accept, caller, job_id, |job, who| job.accept(who))
            .await
    }

    pub async fn ignore(&self, caller: &Identity, job_id: JobId) -> WorkflowResult<Job> {
        self.apply(JobAction::Ignore, caller, job_id, |job, who| job.ignore(who))
            .await
    }

    pub async fn complete(&self, caller: &Identity, job_id: JobId) -> WorkflowResult<Job> {
        self.apply(JobAction::Complete, caller, job_id, |job, who| job.complete(who))
            .await
    }

    pub async fn get(&self, job_id: JobId) -> WorkflowResult<Job> {
        self.load(job_id).await
    }

    pub async fn list_all(&self) -> WorkflowResult<Vec<Job>> {
        Ok(self.jobs.list_all().await?)
    }

    /// Jobs the caller owns.
    pub async fn list_for_client(&self, caller: &Identity) -> WorkflowResult<Vec<Job>> {
        Ok(self.jobs.list_by_client(caller.user_id).await?)
    }

    /// Jobs assigned to a freelancer. Only that freelancer may ask.
    pub async fn list_for_freelancer(
        &self,
        caller: &Identity,
        freelancer_id: UserId,
    ) -> WorkflowResult<Vec<Job>> {
        if caller.user_id != freelancer_id {
            return Err(WorkflowError::Unauthorized(
                "only the freelancer may list their own jobs".to_string(),
            ));
        }
        Ok(self.jobs.list_by_freelancer(freelancer_id).await?)
    }

    /// Job counts for every status, in lifecycle order.
    pub async fn status_counts(&self) -> WorkflowResult<Vec<(JobStatus, usize)>> {
        let jobs = self.jobs.list_all().await?;
        Ok(JobStatus::ALL
            .iter()
            .map(|status| (*status, jobs.iter().filter(|j| j.status == *status).count()))
            .collect())
    }

    async fn load(&self, job_id: JobId) -> WorkflowResult<Job> {
        self.jobs
            .get(job_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("job {}", job_id)))
    }

    async fn require_freelancer(&self, user_id: UserId) -> WorkflowResult<()> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("user {}", user_id)))?;
        if user.role != Role::Freelancer {
            return Err(WorkflowError::Validation(format!(
                "user {} is not a freelancer",
                user_id
            )));
        }
        Ok(())
    }

    async fn apply<F>(
        &self,
        action: JobAction,
        caller: &Identity,
        job_id: JobId,
        rule: F,
    ) -> WorkflowResult<Job>
    where
        F: FnOnce(&mut Job, UserId) -> Result<(), TransitionError> + Send,
    {
        let mut job = self.load(job_id).await?;
        let previous = job.status;

        if let Err(e) = rule(&mut job, caller.user_id) {
            return Err(self.reject(action, caller, job_id, e));
        }

        self.commit(action, caller, previous, job).await
    }

    async fn commit(
        &self,
        action: JobAction,
        caller: &Identity,
        previous: JobStatus,
        job: Job,
    ) -> WorkflowResult<Job> {
        if self.enforce_lifecycle {
            if let Err(e) = job.verify_lifecycle(previous) {
                return Err(self.reject(action, caller, job.id, e));
            }
        }

        let job_id = job.id;
        let job = self
            .jobs
            .update(job)
            .await
            .inspect_err(|e| self.record_store_failure(action, job_id, e))?;

        info!(
            job_id = %job.id,
            caller = %caller.user_id,
            op = %action,
            from = %previous,
            to = %job.status,
            "Job updated"
        );
        metrics::record_job_transition(action.as_str(), "ok");
        Ok(job)
    }

    fn reject(&self, action: JobAction, caller: &Identity, job_id: JobId, err: TransitionError) -> WorkflowError {
        warn!(
            job_id = %job_id,
            caller = %caller.user_id,
            op = %action,
            reason = %err,
            "Job operation refused"
        );
        if err.is_denial() {
            metrics::record_job_transition(action.as_str(), "unauthorized");
            WorkflowError::Unauthorized(err.to_string())
        } else {
            metrics::record_job_transition(action.as_str(), "conflict");
            WorkflowError::Conflict(err.to_string())
        }
    }

    fn record_store_failure(&self, action: JobAction, job_id: JobId, err: &StoreError) {
        warn!(job_id = %job_id, op = %action, error = %err, "Job write failed");
        metrics::record_job_transition(action.as_str(), err.kind());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            WorkflowError::from(StoreError::PreconditionFailed("jobs/1".into())),
            WorkflowError::Conflict(_)
        ));
        assert!(matches!(
            WorkflowError::from(StoreError::not_found("jobs/1")),
            WorkflowError::NotFound(_)
        ));
        assert!(matches!(
            WorkflowError::from(StoreError::unavailable("down")),
            WorkflowError::Storage(_)
        ));
    }
}
