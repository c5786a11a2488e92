//! Fraud reports filed by clients and freelancers against other users.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::UserId;

/// Unique identifier for a fraud report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudStatus {
    #[default]
    Pending,
    Reviewed,
    Resolved,
}

/// A stored fraud report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FraudReport {
    pub id: ReportId,
    pub reporter_id: UserId,
    pub reported_user_id: UserId,
    pub description: String,
    pub status: FraudStatus,
    pub created_at: DateTime<Utc>,
}

/// Report submission payload. The reporter comes from the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct NewFraudReport {
    pub reported_user_id: UserId,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
}

impl FraudReport {
    pub fn draft(reporter_id: UserId, report: NewFraudReport) -> Self {
        Self {
            id: ReportId::default(),
            reporter_id,
            reported_user_id: report.reported_user_id,
            description: report.description,
            status: FraudStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
