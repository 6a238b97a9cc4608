use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::AdminCredentials;
use crate::workflows::membership::applications::auth::StaticCredentialAuthenticator;
use crate::workflows::membership::applications::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission,
};
use crate::workflows::membership::applications::repository::{
    ApplicationRepository, NewApplication, RepositoryError,
};
use crate::workflows::membership::applications::store::InMemoryApplicationRepository;
use crate::workflows::membership::applications::{
    application_router, ApplicationState, MembershipApplicationService, ReviewService,
};

pub(super) const ADMIN_EMAIL: &str = "staff@heartbeats.example";
pub(super) const ADMIN_PASSWORD: &str = "encore";

pub(super) fn words(count: usize) -> String {
    (1..=count)
        .map(|index| format!("word{index}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        roll_number: "121cs0123".to_string(),
        name: "Asha Rao".to_string(),
        email: "121cs0123@nitrkl.ac.in".to_string(),
        phone: "+91 98765 43210".to_string(),
        role: "Guitar".to_string(),
        other_role: String::new(),
        why_role: words(24),
        why_heartbeats: words(30),
        demo_link: "https://drive.google.com/x".to_string(),
    }
}

pub(super) fn submission_for(roll_number: &str, name: &str, role: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        roll_number: roll_number.to_string(),
        name: name.to_string(),
        email: format!("{}@nitrkl.ac.in", roll_number.to_lowercase()),
        role: role.to_string(),
        ..submission()
    }
}

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 14, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn authenticator() -> StaticCredentialAuthenticator {
    StaticCredentialAuthenticator::new(
        Some(AdminCredentials {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }),
        5,
    )
}

pub(super) fn build_service() -> (
    MembershipApplicationService<InMemoryApplicationRepository>,
    Arc<InMemoryApplicationRepository>,
) {
    let repository = Arc::new(InMemoryApplicationRepository::new());
    let service = MembershipApplicationService::new(repository.clone());
    (service, repository)
}

pub(super) fn build_review<R>(repository: Arc<R>) -> Arc<ReviewService<R>>
where
    R: ApplicationRepository + 'static,
{
    Arc::new(ReviewService::new(repository))
}

pub(super) fn application_router_with<R>(repository: Arc<R>) -> axum::Router
where
    R: ApplicationRepository + 'static,
{
    application_router(ApplicationState::new(repository, Arc::new(authenticator())))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store that fails every round trip.
pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_roll_number(
        &self,
        _roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_recent(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_status(
        &self,
        _id: &ApplicationId,
        _status: ApplicationStatus,
        _updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &ApplicationId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Pre-check never sees the competing document; the unique index still catches it.
pub(super) struct RacingRepository;

impl ApplicationRepository for RacingRepository {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict {
            roll_number: application.profile.roll_number,
        })
    }

    fn find_by_roll_number(
        &self,
        _roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn list_recent(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(Vec::new())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn update_status(
        &self,
        _id: &ApplicationId,
        _status: ApplicationStatus,
        _updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn delete(&self, _id: &ApplicationId) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}

/// In-memory store that can be taken offline mid-test.
#[derive(Default)]
pub(super) struct SwitchableRepository {
    pub(super) inner: InMemoryApplicationRepository,
    offline: AtomicBool,
}

impl SwitchableRepository {
    pub(super) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("network unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ApplicationRepository for SwitchableRepository {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        self.check()?;
        self.inner.insert(application)
    }

    fn find_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.check()?;
        self.inner.find_by_roll_number(roll_number)
    }

    fn list_recent(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.check()?;
        self.inner.list_recent()
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.check()?;
        self.inner.fetch(id)
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.check()?;
        self.inner.update_status(id, status, updated_at)
    }

    fn delete(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        self.check()?;
        self.inner.delete(id)
    }
}
