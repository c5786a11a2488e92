//! Fraud reporting.

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use gig_models::{FraudReport, NewFraudReport};
use gig_store::{FraudReportRepository, UserRepository};

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::sanitize_string;

#[derive(Clone)]
pub struct FraudService {
    reports: Arc<dyn FraudReportRepository>,
    users: Arc<dyn UserRepository>,
}

impl FraudService {
    pub fn new(reports: Arc<dyn FraudReportRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { reports, users }
    }

    /// File a report against another user. Admins cannot file reports.
    pub async fn report(&self, caller: &Identity, mut report: NewFraudReport) -> ApiResult<FraudReport> {
        if caller.is_admin() {
            warn!(caller = %caller.user_id, "Admin attempted to file a fraud report");
            metrics::record_fraud_report("unauthorized");
            return Err(ApiError::forbidden("administrators cannot file fraud reports"));
        }

        report.description = sanitize_string(report.description.trim());
        report.validate()?;

        if self.users.get(report.reported_user_id).await?.is_none() {
            return Err(ApiError::not_found(format!("user {}", report.reported_user_id)));
        }

        let stored = self
            .reports
            .insert(FraudReport::draft(caller.user_id, report))
            .await?;

        info!(
            report_id = %stored.id,
            reporter = %stored.reporter_id,
            reported = %stored.reported_user_id,
            "Fraud report filed"
        );
        metrics::record_fraud_report("ok");
        Ok(stored)
    }

    /// All reports. Only the operator holding the bootstrap credential may read them.
    pub async fn list(&self, caller: &Identity) -> ApiResult<Vec<FraudReport>> {
        if !caller.is_bootstrap_admin() {
            warn!(caller = %caller.user_id, "Fraud report listing refused");
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(self.reports.list_all().await?)
    }
}
