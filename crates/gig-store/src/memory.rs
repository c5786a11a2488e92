//! In-memory store.
//!
//! Records live in `BTreeMap`s behind tokio `RwLock`s, so listings come back
//! in id order. Writes to the same job from concurrent requests are not
//! serialized beyond the lock around a single write: under
//! [`WriteMode::LastWriterWins`] the later write silently replaces the earlier
//! one, under [`WriteMode::Versioned`] it is rejected.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use gig_models::{FraudReport, Job, JobId, ReportId, Role, User, UserId};

use crate::error::{StoreError, StoreResult};
use crate::metrics::record_operation;
use crate::repos::{FraudReportRepository, JobRepository, UserRepository};

/// How job writes treat the version carried by the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Overwrite whatever is stored.
    #[default]
    LastWriterWins,
    /// Reject writes whose version differs from the stored one.
    Versioned,
}

/// Store holding every collection in process memory.
pub struct MemoryStore {
    jobs: RwLock<BTreeMap<JobId, Job>>,
    users: RwLock<BTreeMap<UserId, User>>,
    reports: RwLock<Vec<FraudReport>>,
    next_job_id: AtomicI64,
    next_user_id: AtomicI64,
    next_report_id: AtomicI64,
    write_mode: WriteMode,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(WriteMode::default())
    }
}

impl MemoryStore {
    /// Create an empty store. User ids start after the bootstrap admin's.
    pub fn new(write_mode: WriteMode) -> Self {
        Self {
            jobs: RwLock::new(BTreeMap::new()),
            users: RwLock::new(BTreeMap::new()),
            reports: RwLock::new(Vec::new()),
            next_job_id: AtomicI64::new(1),
            next_user_id: AtomicI64::new(UserId::BOOTSTRAP_ADMIN.as_i64() + 1),
            next_report_id: AtomicI64::new(1),
            write_mode,
        }
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    fn apply_update(&self, jobs: &mut BTreeMap<JobId, Job>, mut job: Job) -> StoreResult<Job> {
        let stored = jobs
            .get(&job.id)
            .ok_or_else(|| StoreError::not_found(format!("jobs/{}", job.id)))?;
        self.check_version(&job, stored)?;
        job.version = stored.version + 1;
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn apply_delete(&self, jobs: &mut BTreeMap<JobId, Job>, job: &Job) -> StoreResult<()> {
        let stored = jobs
            .get(&job.id)
            .ok_or_else(|| StoreError::not_found(format!("jobs/{}", job.id)))?;
        self.check_version(job, stored)?;
        jobs.remove(&job.id);
        Ok(())
    }

    fn check_version(&self, job: &Job, stored: &Job) -> StoreResult<()> {
        if self.write_mode == WriteMode::Versioned && stored.version != job.version {
            return Err(StoreError::PreconditionFailed(format!(
                "jobs/{} written at version {}, stored version is {}",
                job.id, job.version, stored.version
            )));
        }
        Ok(())
    }
}

fn outcome<T>(result: &StoreResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn insert(&self, mut job: Job) -> StoreResult<Job> {
        job.id = JobId(self.next_job_id.fetch_add(1, Ordering::SeqCst));
        job.version = 1;
        self.jobs.write().await.insert(job.id, job.clone());
        debug!(job_id = %job.id, "Inserted job");
        record_operation("jobs", "insert", "ok");
        Ok(job)
    }

    async fn get(&self, id: JobId) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(&self, job: Job) -> StoreResult<Job> {
        let result = self.apply_update(&mut *self.jobs.write().await, job);
        record_operation("jobs", "update", outcome(&result));
        result
    }

    async fn delete(&self, job: &Job) -> StoreResult<()> {
        let result = self.apply_delete(&mut *self.jobs.write().await, job);
        record_operation("jobs", "delete", outcome(&result));
        result
    }

    async fn list_all(&self) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.read().await.values().cloned().collect())
    }

    async fn list_by_client(&self, client_id: UserId) -> StoreResult<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn list_by_freelancer(&self, freelancer_id: UserId) -> StoreResult<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.freelancer_id == Some(freelancer_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, mut user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            record_operation("users", "insert", "already_exists");
            return Err(StoreError::AlreadyExists(format!("users/email={}", user.email)));
        }
        user.id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
        users.insert(user.id, user.clone());
        debug!(user_id = %user.id, role = %user.role, "Inserted user");
        record_operation("users", "insert", "ok");
        Ok(user)
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::not_found(format!("users/{}", user.id)));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::AlreadyExists(format!("users/email={}", user.email)));
        }
        users.insert(user.id, user.clone());
        record_operation("users", "update", "ok");
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        let removed = self.users.write().await.remove(&id);
        match removed {
            Some(_) => {
                record_operation("users", "delete", "ok");
                Ok(())
            }
            None => {
                record_operation("users", "delete", "not_found");
                Err(StoreError::not_found(format!("users/{}", id)))
            }
        }
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FraudReportRepository for MemoryStore {
    async fn insert(&self, mut report: FraudReport) -> StoreResult<FraudReport> {
        report.id = ReportId(self.next_report_id.fetch_add(1, Ordering::SeqCst));
        self.reports.write().await.push(report.clone());
        record_operation("fraud_reports", "insert", "ok");
        Ok(report)
    }

    async fn list_all(&self) -> StoreResult<Vec<FraudReport>> {
        Ok(self.reports.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gig_models::{NewFraudReport, NewJob};

    fn new_job(title: &str) -> NewJob {
        NewJob {
            title: title.to_string(),
            description: String::new(),
            estimated_time: None,
            deadline: None,
            budget: 0.0,
            freelancer_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::default();
        let a = JobRepository::insert(&store, Job::draft(UserId(2), new_job("a"))).await.unwrap();
        let b = JobRepository::insert(&store, Job::draft(UserId(2), new_job("b"))).await.unwrap();
        assert_eq!(a.id, JobId(1));
        assert_eq!(b.id, JobId(2));
        assert_eq!(a.version, 1);
    }

    #[tokio::test]
    async fn test_user_ids_skip_bootstrap_admin() {
        let store = MemoryStore::default();
        let user = UserRepository::insert(&store, User::draft("Ada", "ada@example.com", Role::Client))
            .await
            .unwrap();
        assert_ne!(user.id, UserId::BOOTSTRAP_ADMIN);
        assert_eq!(user.id, UserId(2));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::default();
        UserRepository::insert(&store, User::draft("Ada", "ada@example.com", Role::Client))
            .await
            .unwrap();
        let err = UserRepository::insert(&store, User::draft("Ada", "ADA@example.com", Role::Freelancer))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = MemoryStore::new(WriteMode::LastWriterWins);
        let job = JobRepository::insert(&store, Job::draft(UserId(2), new_job("a"))).await.unwrap();

        let mut first = job.clone();
        first.title = "first".into();
        let mut second = job.clone();
        second.title = "second".into();

        JobRepository::update(&store, first).await.unwrap();
        let written = JobRepository::update(&store, second).await.unwrap();
        assert_eq!(written.version, 3);

        let stored = JobRepository::get(&store, job.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "second");
    }

    #[tokio::test]
    async fn test_versioned_rejects_stale_write() {
        let store = MemoryStore::new(WriteMode::Versioned);
        let job = JobRepository::insert(&store, Job::draft(UserId(2), new_job("a"))).await.unwrap();

        let mut first = job.clone();
        first.title = "first".into();
        let mut stale = job.clone();
        stale.title = "stale".into();

        JobRepository::update(&store, first).await.unwrap();
        let err = JobRepository::update(&store, stale).await.unwrap_err();
        assert!(err.is_precondition_failed());

        let err = JobRepository::delete(&store, &job).await.unwrap_err();
        assert!(err.is_precondition_failed());

        let stored = JobRepository::get(&store, job.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "first");
    }

    #[tokio::test]
    async fn test_update_after_delete_is_not_found() {
        let store = MemoryStore::default();
        let job = JobRepository::insert(&store, Job::draft(UserId(2), new_job("a"))).await.unwrap();
        JobRepository::delete(&store, &job).await.unwrap();
        let err = JobRepository::update(&store, job).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listings_filter_by_party() {
        let store = MemoryStore::default();
        let mut assigned = new_job("assigned");
        assigned.freelancer_id = Some(UserId(5));
        JobRepository::insert(&store, Job::draft(UserId(2), assigned)).await.unwrap();
        JobRepository::insert(&store, Job::draft(UserId(3), new_job("other"))).await.unwrap();

        assert_eq!(store.list_by_client(UserId(2)).await.unwrap().len(), 1);
        assert_eq!(store.list_by_freelancer(UserId(5)).await.unwrap().len(), 1);
        assert_eq!(JobRepository::list_all(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fraud_reports_round_trip() {
        let store = MemoryStore::default();
        let report = FraudReport::draft(
            UserId(2),
            NewFraudReport {
                reported_user_id: UserId(3),
                description: "Took payment, never delivered".into(),
            },
        );
        let saved = FraudReportRepository::insert(&store, report).await.unwrap();
        assert_eq!(saved.id, ReportId(1));
        assert_eq!(FraudReportRepository::list_all(&store).await.unwrap().len(), 1);
    }
}
