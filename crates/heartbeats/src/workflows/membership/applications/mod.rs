//! Membership application intake, validation, and staff review.

pub mod auth;
pub mod domain;
pub mod form;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use auth::{AuthError, Authenticator, SessionToken, StaticCredentialAuthenticator};
pub use domain::{
    ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission,
    FormField, MemberRole,
};
pub use form::{EmailAutofill, IntakeForm};
pub use repository::{ApplicationRepository, NewApplication, RepositoryError};
pub use review::{
    PendingDeletion, ReviewConsole, ReviewError, ReviewFilter, ReviewService, ReviewSummary,
    StatusFilter, StoreOperation,
};
pub use router::{application_router, ApplicationState};
pub use service::{MembershipApplicationService, SubmissionError, SubmissionReceipt};
pub use store::{InMemoryApplicationRepository, JsonFileApplicationRepository};
pub use validation::{ValidationErrors, MIN_MOTIVATION_WORDS};
