pub mod json_store;
pub mod schema;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// What a progress record is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    Code(String),
    Project(String),
}

impl ResourceId {
    /// Stable key for local storage.
    pub fn key(&self) -> String {
        match self {
            ResourceId::Code(id) => format!("code:{id}"),
            ResourceId::Project(id) => format!("project:{id}"),
        }
    }

    /// Path of the progress endpoint, relative to the API version root.
    pub fn api_path(&self) -> String {
        match self {
            ResourceId::Code(id) => format!("code/{id}/progress"),
            ResourceId::Project(id) => format!("projects/{id}/progress"),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub current_token_index: usize,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Body of a progress write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub current_token_index: usize,
    pub is_completed: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress record not found: {0}")]
    NotFound(ResourceId),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("network support is disabled in this build")]
    Disabled,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A place progress records live: the practice API or a local file.
pub trait ProgressStore: Send + Sync {
    /// `Ok(None)` when no record exists yet.
    fn fetch(&self, resource: &ResourceId) -> StoreResult<Option<ProgressRecord>>;

    /// Create a zeroed record.
    fn create(&self, resource: &ResourceId) -> StoreResult<ProgressRecord>;

    /// Replace an existing record. Fails with `NotFound` if it was never created.
    fn update(&self, resource: &ResourceId, update: &ProgressUpdate)
    -> StoreResult<ProgressRecord>;

    fn delete(&self, resource: &ResourceId) -> StoreResult<()>;
}

/// Fetch the record, creating it first if missing.
pub fn ensure_record<S: ProgressStore + ?Sized>(
    store: &S,
    resource: &ResourceId,
) -> StoreResult<ProgressRecord> {
    match store.fetch(resource)? {
        Some(record) => Ok(record),
        None => {
            info!(%resource, "progress record missing, creating");
            store.create(resource)
        }
    }
}

/// Write progress, lazily creating the record on first write.
///
/// Only a confirmed missing record triggers a create. A pre-fetch answered
/// with any other error status still goes on to the update.
pub fn ensure_and_update<S: ProgressStore + ?Sized>(
    store: &S,
    resource: &ResourceId,
    update: &ProgressUpdate,
) -> StoreResult<ProgressRecord> {
    match store.fetch(resource) {
        Ok(Some(_)) => {}
        Ok(None) => {
            info!(%resource, "progress record missing, creating");
            store.create(resource)?;
        }
        Err(StoreError::Status { status, .. }) => {
            warn!(%resource, status, "progress check failed, updating anyway");
        }
        Err(err) => return Err(err),
    }
    store.update(resource, update)
}
