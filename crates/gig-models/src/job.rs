//! Job records and the lifecycle rules that govern them.
//!
//! Every mutating rule takes the caller's user id and either applies the
//! change or returns a [`TransitionError`] without touching the record.
//! Persisting the result is the caller's concern.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

use crate::UserId;

/// Unique identifier for a job.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Posted, waiting for a freelancer and a price
    #[default]
    Pending,
    /// One side accepted the negotiated terms
    Accepted,
    /// Paid by the client, work in progress
    Active,
    /// Work delivered
    Completed,
    /// Dropped by the client before payment
    Ignored,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Accepted,
        JobStatus::Active,
        JobStatus::Completed,
        JobStatus::Ignored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Accepted => "ACCEPTED",
            JobStatus::Active => "ACTIVE",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Ignored => "IGNORED",
        }
    }

    /// Whether `next` is an edge of the lifecycle diagram. Staying put is always allowed.
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;

        *self == next
            || matches!(
                (self, next),
                (Pending, Accepted)
                    | (Pending, Ignored)
                    | (Pending, Active)
                    | (Accepted, Active)
                    | (Active, Completed)
                    | (Ignored, Pending)
            )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The operations that can be applied to an existing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobAction {
    Assign,
    SetPrice,
    UpdatePayment,
    Edit,
    Delete,
    Accept,
    Ignore,
    Complete,
}

impl JobAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobAction::Assign => "assign",
            JobAction::SetPrice => "set_price",
            JobAction::UpdatePayment => "update_payment",
            JobAction::Edit => "edit",
            JobAction::Delete => "delete",
            JobAction::Accept => "accept",
            JobAction::Ignore => "ignore",
            JobAction::Complete => "complete",
        }
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a rule refused to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("caller does not own this job")]
    NotOwner,

    #[error("caller is not the freelancer assigned to this job")]
    NotAssignedFreelancer,

    #[error("job is already paid")]
    AlreadyPaid,

    #[error("caller may not {0} this job in its current state")]
    NotEligible(JobAction),

    #[error("status cannot move from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("a paid job cannot be {0}")]
    PaidInStatus(JobStatus),
}

impl TransitionError {
    /// Denials are authorization failures; the rest are lifecycle conflicts.
    pub fn is_denial(&self) -> bool {
        !matches!(
            self,
            TransitionError::InvalidTransition { .. } | TransitionError::PaidInStatus(_)
        )
    }
}

/// A unit of work posted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Assigned by the store on insert
    pub id: JobId,
    pub client_id: UserId,
    #[serde(default)]
    pub freelancer_id: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub budget: f64,
    /// Proposed by the assigned freelancer
    #[serde(default)]
    pub price: Option<u32>,
    #[serde(default)]
    pub paid: bool,
    pub status: JobStatus,
    /// Bumped by the store on every write
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Job creation payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct NewJob {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub budget: f64,
    #[serde(default)]
    pub freelancer_id: Option<UserId>,
}

/// Fields a client may rewrite while the job is unpaid.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct JobEdit {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

impl Job {
    /// Build an unsaved job owned by `client_id`.
    pub fn draft(client_id: UserId, new_job: NewJob) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::default(),
            client_id,
            freelancer_id: new_job.freelancer_id,
            title: new_job.title,
            description: new_job.description,
            estimated_time: new_job.estimated_time,
            deadline: new_job.deadline,
            budget: new_job.budget,
            price: None,
            paid: false,
            status: JobStatus::Pending,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, caller: UserId) -> bool {
        self.client_id == caller
    }

    pub fn is_assigned_to(&self, caller: UserId) -> bool {
        self.freelancer_id == Some(caller)
    }

    pub fn assign_freelancer(
        &mut self,
        caller: UserId,
        freelancer: UserId,
    ) -> Result<(), TransitionError> {
        self.require_owner(caller)?;
        self.freelancer_id = Some(freelancer);
        self.touch();
        Ok(())
    }

    pub fn set_price(&mut self, caller: UserId, price: u32) -> Result<(), TransitionError> {
        if !self.is_assigned_to(caller) {
            return Err(TransitionError::NotAssignedFreelancer);
        }
        self.price = Some(price);
        self.touch();
        Ok(())
    }

    /// Record the payment flag. Paying is the only way into `Active`.
    pub fn set_paid(&mut self, caller: UserId, paid: bool) -> Result<(), TransitionError> {
        self.require_owner(caller)?;
        self.paid = paid;
        if paid {
            self.status = JobStatus::Active;
        }
        self.touch();
        Ok(())
    }

    pub fn edit(&mut self, caller: UserId, edit: JobEdit) -> Result<(), TransitionError> {
        self.require_owner(caller)?;
        if self.paid {
            return Err(TransitionError::AlreadyPaid);
        }
        self.title = edit.title;
        self.description = edit.description;
        self.estimated_time = edit.estimated_time;
        self.touch();
        Ok(())
    }

    /// Deletion is gated on ownership only; paid jobs can be deleted too.
    pub fn authorize_delete(&self, caller: UserId) -> Result<(), TransitionError> {
        self.require_owner(caller)
    }

    /// Either the assigned freelancer, or the owning client once a price exists.
    pub fn accept(&mut self, caller: UserId) -> Result<(), TransitionError> {
        if self.is_assigned_to(caller) || (self.is_owned_by(caller) && self.price.is_some()) {
            self.status = JobStatus::Accepted;
            self.touch();
            return Ok(());
        }
        Err(TransitionError::NotEligible(JobAction::Accept))
    }

    /// The assigned freelancer steps back (job returns to the pool), or the owning
    /// client drops an unpaid job.
    pub fn ignore(&mut self, caller: UserId) -> Result<(), TransitionError> {
        if self.is_assigned_to(caller) {
            self.freelancer_id = None;
            self.status = JobStatus::Pending;
        } else if self.is_owned_by(caller) && !self.paid {
            self.status = JobStatus::Ignored;
        } else {
            return Err(TransitionError::NotEligible(JobAction::Ignore));
        }
        self.touch();
        Ok(())
    }

    pub fn complete(&mut self, caller: UserId) -> Result<(), TransitionError> {
        if self.is_assigned_to(caller) || (self.is_owned_by(caller) && self.price.is_some()) {
            self.status = JobStatus::Completed;
            self.touch();
            return Ok(());
        }
        Err(TransitionError::NotEligible(JobAction::Complete))
    }

    /// Check this record against the lifecycle diagram, given the status it had before
    /// the last rule was applied.
    pub fn verify_lifecycle(&self, previous: JobStatus) -> Result<(), TransitionError> {
        if !previous.can_advance_to(self.status) {
            return Err(TransitionError::InvalidTransition {
                from: previous,
                to: self.status,
            });
        }
        if self.paid && !matches!(self.status, JobStatus::Active | JobStatus::Completed) {
            return Err(TransitionError::PaidInStatus(self.status));
        }
        Ok(())
    }

    fn require_owner(&self, caller: UserId) -> Result<(), TransitionError> {
        if self.is_owned_by(caller) {
            Ok(())
        } else {
            Err(TransitionError::NotOwner)
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: UserId = UserId(10);
    const FREELANCER: UserId = UserId(20);
    const STRANGER: UserId = UserId(30);

    fn posted() -> Job {
        let mut job = Job::draft(
            CLIENT,
            NewJob {
                title: "Landing page".into(),
                description: "Static site".into(),
                estimated_time: Some("2 weeks".into()),
                deadline: None,
                budget: 500.0,
                freelancer_id: None,
            },
        );
        job.id = JobId(1);
        job
    }

    fn assigned() -> Job {
        let mut job = posted();
        job.assign_freelancer(CLIENT, FREELANCER).unwrap();
        job
    }

    #[test]
    fn test_draft_defaults() {
        let job = posted();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(!job.paid);
        assert_eq!(job.client_id, CLIENT);
        assert_eq!(job.price, None);
    }

    #[test]
    fn test_only_owner_assigns() {
        let mut job = posted();
        assert_eq!(
            job.assign_freelancer(STRANGER, FREELANCER),
            Err(TransitionError::NotOwner)
        );
        assert_eq!(job.freelancer_id, None);

        job.assign_freelancer(CLIENT, FREELANCER).unwrap();
        assert_eq!(job.freelancer_id, Some(FREELANCER));
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn test_only_assigned_freelancer_prices() {
        let mut job = assigned();
        assert_eq!(
            job.set_price(CLIENT, 100),
            Err(TransitionError::NotAssignedFreelancer)
        );
        job.set_price(FREELANCER, 100).unwrap();
        assert_eq!(job.price, Some(100));
    }

    #[test]
    fn test_payment_forces_active() {
        let mut job = assigned();
        job.set_paid(CLIENT, true).unwrap();
        assert!(job.paid);
        assert_eq!(job.status, JobStatus::Active);

        job.set_paid(CLIENT, false).unwrap();
        assert!(!job.paid);
        assert_eq!(job.status, JobStatus::Active);
    }

    #[test]
    fn test_edit_locked_after_payment() {
        let edit = JobEdit {
            title: "New title".into(),
            description: "New description".into(),
            estimated_time: None,
        };

        let mut job = posted();
        job.edit(CLIENT, edit.clone()).unwrap();
        assert_eq!(job.title, "New title");
        assert_eq!(job.budget, 500.0);

        job.set_paid(CLIENT, true).unwrap();
        assert_eq!(job.edit(CLIENT, edit.clone()), Err(TransitionError::AlreadyPaid));
        assert_eq!(job.edit(STRANGER, edit), Err(TransitionError::NotOwner));
    }

    #[test]
    fn test_accept_paths() {
        // Client without a price has no path.
        let mut job = assigned();
        assert_eq!(
            job.accept(CLIENT),
            Err(TransitionError::NotEligible(JobAction::Accept))
        );

        // Assigned freelancer needs no price.
        job.accept(FREELANCER).unwrap();
        assert_eq!(job.status, JobStatus::Accepted);

        // Client once priced.
        let mut job = assigned();
        job.set_price(FREELANCER, 50).unwrap();
        job.accept(CLIENT).unwrap();
        assert_eq!(job.status, JobStatus::Accepted);

        assert!(job.accept(STRANGER).is_err());
    }

    #[test]
    fn test_ignore_paths() {
        let mut job = assigned();
        job.ignore(FREELANCER).unwrap();
        assert_eq!(job.freelancer_id, None);
        assert_eq!(job.status, JobStatus::Pending);

        // Nobody is assigned any more.
        assert_eq!(
            job.ignore(FREELANCER),
            Err(TransitionError::NotEligible(JobAction::Ignore))
        );

        job.ignore(CLIENT).unwrap();
        assert_eq!(job.status, JobStatus::Ignored);

        let mut paid = assigned();
        paid.set_paid(CLIENT, true).unwrap();
        assert!(paid.ignore(CLIENT).is_err());
    }

    #[test]
    fn test_complete_paths() {
        let mut job = posted();
        assert!(job.complete(CLIENT).is_err());

        let mut job = assigned();
        job.complete(FREELANCER).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_delete_ignores_payment() {
        let mut job = posted();
        job.set_paid(CLIENT, true).unwrap();
        assert!(job.authorize_delete(CLIENT).is_ok());
        assert_eq!(job.authorize_delete(STRANGER), Err(TransitionError::NotOwner));
    }

    #[test]
    fn test_lifecycle_edges() {
        assert!(JobStatus::Pending.can_advance_to(JobStatus::Accepted));
        assert!(JobStatus::Accepted.can_advance_to(JobStatus::Active));
        assert!(JobStatus::Active.can_advance_to(JobStatus::Completed));
        assert!(JobStatus::Ignored.can_advance_to(JobStatus::Pending));
        assert!(JobStatus::Completed.can_advance_to(JobStatus::Completed));

        assert!(!JobStatus::Accepted.can_advance_to(JobStatus::Pending));
        assert!(!JobStatus::Active.can_advance_to(JobStatus::Pending));
        assert!(!JobStatus::Completed.can_advance_to(JobStatus::Active));
    }

    #[test]
    fn test_verify_lifecycle_flags_freelancer_walking_away() {
        let mut job = assigned();
        job.accept(FREELANCER).unwrap();
        let before = job.status;
        job.ignore(FREELANCER).unwrap();

        assert_eq!(
            job.verify_lifecycle(before),
            Err(TransitionError::InvalidTransition {
                from: JobStatus::Accepted,
                to: JobStatus::Pending,
            })
        );
        assert!(!job.verify_lifecycle(before).unwrap_err().is_denial());
    }

    #[test]
    fn test_verify_lifecycle_flags_paid_acceptance() {
        let mut job = assigned();
        job.set_paid(CLIENT, true).unwrap();
        let before = job.status;
        job.accept(FREELANCER).unwrap();

        assert!(job.verify_lifecycle(before).is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }
}
