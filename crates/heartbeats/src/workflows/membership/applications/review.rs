use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::auth::{Authenticator, SessionToken};
use super::domain::{ApplicationId, ApplicationRecord, ApplicationStatus};
use super::repository::{ApplicationRepository, RepositoryError};

/// Store round trips the review console performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    List,
    Fetch,
    UpdateStatus,
    Delete,
}

impl StoreOperation {
    /// Generic message shown to staff; the underlying cause only goes to the log.
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Failed to fetch applications.",
            Self::Fetch => "Failed to fetch application.",
            Self::UpdateStatus => "Failed to update application status.",
            Self::Delete => "Failed to delete application.",
        }
    }
}

/// Error raised by staff review operations.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("staff sign-in required")]
    Unauthenticated,
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("deleting application {0} requires explicit confirmation")]
    ConfirmationRequired(ApplicationId),
    #[error("{}", .0.failure_message())]
    Store(StoreOperation),
}

/// Status half of the console filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        ApplicationStatus::from_label(value).map(Self::Only)
    }

    pub fn matches(self, status: ApplicationStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == status,
        }
    }
}

/// Free-text search combined with a status filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub search: String,
    pub status: StatusFilter,
}

impl ReviewFilter {
    pub fn new(search: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    /// Case-insensitive substring over name, roll number, e-mail and role.
    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        let needle = self.search.to_lowercase();
        let profile = &record.profile;
        let matches_search = needle.is_empty()
            || [
                profile.name.as_str(),
                profile.roll_number.as_str(),
                profile.email.as_str(),
                profile.role.label(),
            ]
            .iter()
            .any(|haystack| haystack.to_lowercase().contains(&needle));

        matches_search && self.status.matches(record.status)
    }

    pub fn apply<'a>(&self, records: &'a [ApplicationRecord]) -> Vec<&'a ApplicationRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Dashboard counters over a set of applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub pending: usize,
    pub reviewed: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl ReviewSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ApplicationRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut summary, record| {
                summary.total += 1;
                match record.status {
                    ApplicationStatus::Pending => summary.pending += 1,
                    ApplicationStatus::Reviewed => summary.reviewed += 1,
                    ApplicationStatus::Accepted => summary.accepted += 1,
                    ApplicationStatus::Rejected => summary.rejected += 1,
                }
                summary
            })
    }
}

/// Stateless staff operations over the store. Authentication is the caller's concern.
pub struct ReviewService<R> {
    repository: Arc<R>,
}

impl<R> ReviewService<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// All applications, newest first.
    pub fn list(&self) -> Result<Vec<ApplicationRecord>, ReviewError> {
        self.repository
            .list_recent()
            .map_err(|err| store_failure(StoreOperation::List, None, err))
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, ReviewError> {
        self.repository
            .fetch(id)
            .map_err(|err| store_failure(StoreOperation::Fetch, Some(id), err))?
            .ok_or_else(|| ReviewError::NotFound(id.clone()))
    }

    pub fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, ReviewError> {
        self.set_status_at(id, status, Utc::now())
    }

    /// Any status may follow any other; `updated_at` is stamped on every change.
    pub fn set_status_at(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, ReviewError> {
        let record = self
            .repository
            .update_status(id, status, updated_at)
            .map_err(|err| store_failure(StoreOperation::UpdateStatus, Some(id), err))?;
        info!(application_id = %id, status = status.label(), "application status updated");
        Ok(record)
    }

    /// Hard delete. Refused unless `confirmed`; returns whether a document existed.
    pub fn delete(&self, id: &ApplicationId, confirmed: bool) -> Result<bool, ReviewError> {
        if !confirmed {
            return Err(ReviewError::ConfirmationRequired(id.clone()));
        }

        let removed = self
            .repository
            .delete(id)
            .map_err(|err| store_failure(StoreOperation::Delete, Some(id), err))?;
        if removed {
            info!(application_id = %id, "application deleted");
        }
        Ok(removed)
    }
}

fn store_failure(
    operation: StoreOperation,
    id: Option<&ApplicationId>,
    err: RepositoryError,
) -> ReviewError {
    match (err, id) {
        (RepositoryError::NotFound, Some(id)) => ReviewError::NotFound(id.clone()),
        (err, id) => {
            error!(
                ?operation,
                application_id = id.map(ApplicationId::as_str),
                error = %err,
                "{}",
                operation.failure_message()
            );
            ReviewError::Store(operation)
        }
    }
}

/// Deletion awaiting the reviewer's confirmation. Only the console hands these out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    id: ApplicationId,
    roll_number: String,
}

impl PendingDeletion {
    pub fn id(&self) -> &ApplicationId {
        &self.id
    }

    pub fn roll_number(&self) -> &str {
        &self.roll_number
    }
}

/// A signed-in reviewer's working view: a local copy of the list that only changes when a
/// store round trip succeeds.
pub struct ReviewConsole<R, A> {
    service: Arc<ReviewService<R>>,
    auth: Arc<A>,
    token: SessionToken,
    applications: Vec<ApplicationRecord>,
}

impl<R, A> ReviewConsole<R, A>
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    /// Open the console for a session. Call [`ReviewConsole::refresh`] to load the list.
    pub fn open(
        service: Arc<ReviewService<R>>,
        auth: Arc<A>,
        token: SessionToken,
    ) -> Result<Self, ReviewError> {
        if !auth.is_signed_in(&token) {
            return Err(ReviewError::Unauthenticated);
        }

        Ok(Self {
            service,
            auth,
            token,
            applications: Vec::new(),
        })
    }

    pub fn applications(&self) -> &[ApplicationRecord] {
        &self.applications
    }

    pub fn find(&self, id: &ApplicationId) -> Option<&ApplicationRecord> {
        self.applications.iter().find(|record| &record.id == id)
    }

    pub fn filtered(&self, filter: &ReviewFilter) -> Vec<&ApplicationRecord> {
        filter.apply(&self.applications)
    }

    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary::from_records(&self.applications)
    }

    /// Reload from the store. On failure the current list is kept.
    pub fn refresh(&mut self) -> Result<(), ReviewError> {
        self.ensure_signed_in()?;
        self.applications = self.service.list()?;
        Ok(())
    }

    pub fn set_status(
        &mut self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), ReviewError> {
        self.ensure_signed_in()?;
        let updated = self.service.set_status(id, status)?;
        if let Some(record) = self.applications.iter_mut().find(|record| &record.id == id) {
            record.status = updated.status;
            record.updated_at = updated.updated_at;
        }
        Ok(())
    }

    /// First step of a delete: names the record so the reviewer can confirm it.
    pub fn request_delete(&self, id: &ApplicationId) -> Result<PendingDeletion, ReviewError> {
        self.ensure_signed_in()?;
        let record = self
            .find(id)
            .ok_or_else(|| ReviewError::NotFound(id.clone()))?;
        Ok(PendingDeletion {
            id: record.id.clone(),
            roll_number: record.profile.roll_number.clone(),
        })
    }

    pub fn confirm_delete(&mut self, pending: PendingDeletion) -> Result<(), ReviewError> {
        self.ensure_signed_in()?;
        self.service.delete(&pending.id, true)?;
        self.applications.retain(|record| record.id != pending.id);
        Ok(())
    }

    pub fn sign_out(self) {
        self.auth.sign_out(&self.token);
    }

    fn ensure_signed_in(&self) -> Result<(), ReviewError> {
        if self.auth.is_signed_in(&self.token) {
            Ok(())
        } else {
            Err(ReviewError::Unauthenticated)
        }
    }
}
