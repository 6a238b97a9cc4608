use chrono::{DateTime, Utc};

use super::domain::{ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus};

/// Document about to be created; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub profile: ApplicantProfile,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Storage abstraction over the `applications` document collection.
///
/// `insert` must reject a second document with the same normalized roll number in the same
/// atomic step that writes it; the service's duplicate pre-check is advisory only.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError>;
    fn find_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Every document, newest `submitted_at` first.
    fn list_recent(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError>;
    /// Returns whether a document was removed.
    fn delete(&self, id: &ApplicationId) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("application for roll number {roll_number} already exists")]
    Conflict { roll_number: String },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
