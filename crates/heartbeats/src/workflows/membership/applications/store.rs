//! Document store implementations of [`ApplicationRepository`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{normalize_roll_number, ApplicationId, ApplicationRecord, ApplicationStatus};
use super::repository::{ApplicationRepository, NewApplication, RepositoryError};

/// Documents keyed by id plus a unique index on the normalized roll number.
#[derive(Debug, Clone, Default)]
struct DocumentCollection {
    records: HashMap<ApplicationId, ApplicationRecord>,
    roll_index: HashMap<String, ApplicationId>,
}

impl DocumentCollection {
    fn from_records(records: Vec<ApplicationRecord>) -> Result<Self, RepositoryError> {
        let mut collection = Self::default();
        for record in records {
            let key = normalize_roll_number(&record.profile.roll_number);
            if collection.roll_index.contains_key(&key) {
                return Err(RepositoryError::Unavailable(format!(
                    "store holds duplicate roll number {key}"
                )));
            }
            collection.roll_index.insert(key, record.id.clone());
            collection.records.insert(record.id.clone(), record);
        }
        Ok(collection)
    }

    fn insert(&mut self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        let key = normalize_roll_number(&application.profile.roll_number);
        if self.roll_index.contains_key(&key) {
            return Err(RepositoryError::Conflict { roll_number: key });
        }

        let mut id = ApplicationId::generate();
        while self.records.contains_key(&id) {
            id = ApplicationId::generate();
        }

        let NewApplication {
            mut profile,
            status,
            submitted_at,
        } = application;
        profile.roll_number = key.clone();

        let record = ApplicationRecord {
            id: id.clone(),
            profile,
            status,
            submitted_at,
            updated_at: None,
        };
        self.roll_index.insert(key, id.clone());
        self.records.insert(id, record.clone());
        Ok(record)
    }

    fn find_by_roll_number(&self, roll_number: &str) -> Option<ApplicationRecord> {
        let key = normalize_roll_number(roll_number);
        self.roll_index
            .get(&key)
            .and_then(|id| self.records.get(id))
            .cloned()
    }

    fn list_recent(&self) -> Vec<ApplicationRecord> {
        let mut records: Vec<ApplicationRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    fn update_status(
        &mut self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let record = self.records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.status = status;
        record.updated_at = Some(updated_at);
        Ok(record.clone())
    }

    fn delete(&mut self, id: &ApplicationId) -> bool {
        match self.records.remove(id) {
            Some(record) => {
                self.roll_index
                    .remove(&normalize_roll_number(&record.profile.roll_number));
                true
            }
            None => false,
        }
    }
}

fn lock(
    collection: &Mutex<DocumentCollection>,
) -> Result<MutexGuard<'_, DocumentCollection>, RepositoryError> {
    collection
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

/// Process-local store; contents vanish on restart.
#[derive(Debug, Default)]
pub struct InMemoryApplicationRepository {
    collection: Mutex<DocumentCollection>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        lock(&self.collection)?.insert(application)
    }

    fn find_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.collection)?.find_by_roll_number(roll_number))
    }

    fn list_recent(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.collection)?.list_recent())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.collection)?.records.get(id).cloned())
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        lock(&self.collection)?.update_status(id, status, updated_at)
    }

    fn delete(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.collection)?.delete(id))
    }
}

/// Whole collection persisted as one JSON array.
///
/// Every mutation is applied to a copy, written to a sibling temp file and renamed over the
/// original; the in-memory state only advances once the rename succeeds.
#[derive(Debug)]
pub struct JsonFileApplicationRepository {
    path: PathBuf,
    collection: Mutex<DocumentCollection>,
}

impl JsonFileApplicationRepository {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<ApplicationRecord>>(&bytes).map_err(
                |err| {
                    RepositoryError::Unavailable(format!(
                        "failed to parse {}: {err}",
                        path.display()
                    ))
                },
            )?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(RepositoryError::Unavailable(format!(
                    "failed to read {}: {err}",
                    path.display()
                )))
            }
        };

        let collection = DocumentCollection::from_records(records)?;
        info!(
            path = %path.display(),
            applications = collection.records.len(),
            "opened application store"
        );

        Ok(Self {
            path,
            collection: Mutex::new(collection),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit<T>(
        &self,
        apply: impl FnOnce(&mut DocumentCollection) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = lock(&self.collection)?;
        let mut next = guard.clone();
        let outcome = apply(&mut next)?;
        persist(&self.path, &next)?;
        *guard = next;
        Ok(outcome)
    }
}

fn persist(path: &Path, collection: &DocumentCollection) -> Result<(), RepositoryError> {
    let records = collection.list_recent();
    let payload = serde_json::to_vec_pretty(&records)
        .map_err(|err| RepositoryError::Unavailable(format!("failed to encode store: {err}")))?;

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, payload)
        .and_then(|_| fs::rename(&temp, path))
        .map_err(|err| {
            RepositoryError::Unavailable(format!("failed to write {}: {err}", path.display()))
        })?;

    debug!(path = %path.display(), applications = records.len(), "persisted application store");
    Ok(())
}

impl ApplicationRepository for JsonFileApplicationRepository {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        self.commit(|collection| collection.insert(application))
    }

    fn find_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.collection)?.find_by_roll_number(roll_number))
    }

    fn list_recent(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.collection)?.list_recent())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.collection)?.records.get(id).cloned())
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.commit(|collection| collection.update_status(id, status, updated_at))
    }

    fn delete(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        let removed = {
            let guard = lock(&self.collection)?;
            guard.records.contains_key(id)
        };
        if !removed {
            return Ok(false);
        }
        self.commit(|collection| Ok(collection.delete(id)))
    }
}
