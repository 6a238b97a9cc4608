use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{
    normalize_roll_number, ApplicantProfile, ApplicationId, ApplicationRecord,
    ApplicationStatus, ApplicationSubmission,
};
use super::repository::{ApplicationRepository, NewApplication, RepositoryError};
use super::validation::{validate_form, ValidationErrors};

/// Public intake: validation, duplicate check, and creation.
pub struct MembershipApplicationService<R> {
    repository: Arc<R>,
}

/// What the candidate sees after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub roll_number: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

impl From<&ApplicationRecord> for SubmissionReceipt {
    fn from(record: &ApplicationRecord) -> Self {
        Self {
            application_id: record.id.clone(),
            roll_number: record.profile.roll_number.clone(),
            status: record.status,
            submitted_at: record.submitted_at,
        }
    }
}

/// Error raised by the submission workflow.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("an application with roll number {roll_number} already exists")]
    AlreadyApplied { roll_number: String },
    #[error("Failed to submit application. Please try again.")]
    StoreUnavailable,
}

impl<R> MembershipApplicationService<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Validate and store a raw form submission, stamping it with the current time.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submit_at(submission, Utc::now())
    }

    pub fn submit_at(
        &self,
        submission: ApplicationSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let profile = validate_form(&submission)?;
        self.submit_profile_at(profile, submitted_at)
    }

    /// Store an already validated profile (e.g. from an `IntakeForm`).
    pub fn submit_profile_at(
        &self,
        mut profile: ApplicantProfile,
        submitted_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        profile.roll_number = normalize_roll_number(&profile.roll_number);
        if !profile.role.requires_description() {
            profile.other_role.clear();
        }

        if let Some(existing) = self.existing_application(&profile.roll_number)? {
            warn!(
                roll_number = %existing.profile.roll_number,
                application_id = %existing.id,
                "duplicate application rejected"
            );
            return Err(SubmissionError::AlreadyApplied {
                roll_number: existing.profile.roll_number,
            });
        }

        let application = NewApplication {
            profile,
            status: ApplicationStatus::Pending,
            submitted_at,
        };

        match self.repository.insert(application) {
            Ok(record) => {
                info!(
                    application_id = %record.id,
                    roll_number = %record.profile.roll_number,
                    role = record.profile.role.label(),
                    "application submitted"
                );
                Ok(SubmissionReceipt::from(&record))
            }
            Err(RepositoryError::Conflict { roll_number }) => {
                warn!(%roll_number, "duplicate application caught by store constraint");
                Err(SubmissionError::AlreadyApplied { roll_number })
            }
            Err(err) => {
                error!(error = %err, "error submitting application");
                Err(SubmissionError::StoreUnavailable)
            }
        }
    }

    /// Look up a prior application by roll number, in any letter case.
    pub fn existing_application(
        &self,
        roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, SubmissionError> {
        self.repository
            .find_by_roll_number(&normalize_roll_number(roll_number))
            .map_err(|err| {
                error!(error = %err, "error checking existing application");
                SubmissionError::StoreUnavailable
            })
    }
}
