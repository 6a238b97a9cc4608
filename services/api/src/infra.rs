use chrono::{DateTime, Utc};
use heartbeats::config::IntakeConfig;
use heartbeats::workflows::membership::applications::{
    ApplicationId, ApplicationRecord, ApplicationRepository, ApplicationStatus,
    InMemoryApplicationRepository, JsonFileApplicationRepository, NewApplication,
    RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store backend picked from `APP_STORE_PATH` at startup. Calls block (the JSON backend does
/// file I/O under a mutex); the router runs them on the blocking pool.
pub(crate) enum ApplicationStore {
    Memory(InMemoryApplicationRepository),
    File(JsonFileApplicationRepository),
}

impl ApplicationStore {
    pub(crate) fn open(config: &IntakeConfig) -> Result<Self, RepositoryError> {
        match &config.store_path {
            Some(path) => {
                let store = JsonFileApplicationRepository::open(path)?;
                info!(path = %store.path().display(), "using json application store");
                Ok(Self::File(store))
            }
            None => {
                info!("using in-memory application store; submissions are lost on restart");
                Ok(Self::Memory(InMemoryApplicationRepository::new()))
            }
        }
    }

    fn backend(&self) -> &dyn ApplicationRepository {
        match self {
            Self::Memory(store) => store,
            Self::File(store) => store,
        }
    }
}

impl ApplicationRepository for ApplicationStore {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        self.backend().insert(application)
    }

    fn find_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.backend().find_by_roll_number(roll_number)
    }

    fn list_recent(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.backend().list_recent()
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.backend().fetch(id)
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.backend().update_status(id, status, updated_at)
    }

    fn delete(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        self.backend().delete(id)
    }
}
