//! Skeecaptain applications
//!
//! Players can apply to become a skeecaptain, the volunteer who verifies
//! venues and sessions in their area. Applications are validated, stored
//! as pending and listed newest first for review.

use crate::error::{Result, SkeeboardError};
use crate::ledger::validation::{IssueCollector, MAX_CITY_LEN, MAX_STATE_LEN};
use crate::metrics::MetricsCollector;
use crate::utils::{current_timestamp, generate_record_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::info;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;
const MIN_DESCRIPTION_LEN: usize = 10;

/// Review state of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Application body as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub name: String,
    pub email: String,
    pub city: String,
    pub state: String,
    pub venue_list: String,
    pub experience: String,
}

/// A stored application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeecaptainApplication {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub city: String,
    pub state: String,
    pub venue_list: String,
    pub experience: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

/// `local@domain.tld` with no whitespace
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

impl ApplicationRequest {
    /// Check every field, reporting all problems together
    pub fn validate(&self) -> Result<SkeecaptainApplication> {
        let mut issues = IssueCollector::default();

        let name = issues.required("name", &self.name, MAX_NAME_LEN);
        let email = issues.required("email", &self.email, MAX_EMAIL_LEN);
        if !email.is_empty() && !is_plausible_email(&email) {
            issues.push("email", "must be a valid email address");
        }
        let city = issues.required("city", &self.city, MAX_CITY_LEN);
        let state = issues.required("state", &self.state, MAX_STATE_LEN);
        let venue_list = issues.at_least("venueList", &self.venue_list, MIN_DESCRIPTION_LEN);
        let experience = issues.at_least("experience", &self.experience, MIN_DESCRIPTION_LEN);

        issues.finish(SkeecaptainApplication {
            id: generate_record_id(),
            name,
            email,
            city,
            state: state.to_ascii_uppercase(),
            venue_list,
            experience,
            status: ApplicationStatus::Pending,
            submitted_at: current_timestamp(),
        })
    }
}

/// Trait for application storage
pub trait ApplicationStore: Send + Sync {
    fn insert(&self, application: SkeecaptainApplication) -> Result<()>;

    /// All applications, newest first
    fn list(&self) -> Result<Vec<SkeecaptainApplication>>;
}

/// In-memory application storage
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    applications: RwLock<Vec<SkeecaptainApplication>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, application: SkeecaptainApplication) -> Result<()> {
        let mut applications = self
            .applications
            .write()
            .map_err(|_| SkeeboardError::lock_poisoned("applications write"))?;
        applications.push(application);
        Ok(())
    }

    fn list(&self) -> Result<Vec<SkeecaptainApplication>> {
        let applications = self
            .applications
            .read()
            .map_err(|_| SkeeboardError::lock_poisoned("applications read"))?;

        let mut listed = applications.clone();
        listed.reverse();
        listed.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(listed)
    }
}

/// Intake of skeecaptain applications
pub struct SkeecaptainService {
    store: Arc<dyn ApplicationStore>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SkeecaptainService {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate and store a new pending application
    pub fn apply(&self, request: ApplicationRequest) -> Result<SkeecaptainApplication> {
        let application = request.validate()?;
        self.store.insert(application.clone())?;

        info!(
            "Skeecaptain application received - name: '{}', area: {}, {}",
            application.name, application.city, application.state
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_application_submitted();
        }

        Ok(application)
    }

    pub fn applications(&self) -> Result<Vec<SkeecaptainApplication>> {
        self.store.list()
    }

    pub fn store(&self) -> Arc<dyn ApplicationStore> {
        self.store.clone()
    }
}
