use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::warn;

use crate::store::schema::ProgressData;
use crate::store::{ProgressRecord, ProgressStore, ProgressUpdate, ResourceId, StoreError, StoreResult};

const PROGRESS_FILE: &str = "progress.json";

/// Progress records kept in a JSON file, for offline and local-file practice.
pub struct JsonStore {
    base_dir: PathBuf,
    // Serializes load-modify-save cycles between the UI and sync threads.
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> StoreResult<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self) -> PathBuf {
        self.base_dir.join(PROGRESS_FILE)
    }

    fn corrupt_path(&self) -> PathBuf {
        self.base_dir.join(format!("{PROGRESS_FILE}.bad"))
    }

    /// A stale file is treated as empty. An unreadable one is renamed to
    /// `progress.json.bad` first so the next save cannot clobber it.
    fn load(&self) -> ProgressData {
        let path = self.file_path();
        if !path.exists() {
            return ProgressData::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(StoreError::from)
            .and_then(|content| Ok(serde_json::from_str::<ProgressData>(&content)?));
        match parsed {
            Ok(data) if !data.needs_reset() => data,
            Ok(data) => {
                warn!(version = data.schema_version, "progress file has stale schema, starting fresh");
                ProgressData::default()
            }
            Err(err) => {
                let aside = self.corrupt_path();
                warn!(
                    %err,
                    path = %path.display(),
                    aside = %aside.display(),
                    "progress file unreadable, moving aside"
                );
                if let Err(err) = fs::rename(&path, &aside) {
                    warn!(%err, "could not move unreadable progress file");
                }
                ProgressData::default()
            }
        }
    }

    fn save(&self, data: &ProgressData) -> StoreResult<()> {
        let path = self.file_path();
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn with_data<T>(
        &self,
        f: impl FnOnce(&mut ProgressData) -> StoreResult<(T, bool)>,
    ) -> StoreResult<T> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut data = self.load();
        let (out, dirty) = f(&mut data)?;
        if dirty {
            self.save(&data)?;
        }
        Ok(out)
    }
}

impl ProgressStore for JsonStore {
    fn fetch(&self, resource: &ResourceId) -> StoreResult<Option<ProgressRecord>> {
        self.with_data(|data| Ok((data.records.get(&resource.key()).cloned(), false)))
    }

    fn create(&self, resource: &ResourceId) -> StoreResult<ProgressRecord> {
        self.with_data(|data| {
            if let Some(existing) = data.records.get(&resource.key()) {
                return Ok((existing.clone(), false));
            }
            let now = Utc::now();
            let record = ProgressRecord {
                progress_percentage: Some(0.0),
                created_at: Some(now),
                updated_at: Some(now),
                ..ProgressRecord::default()
            };
            data.records.insert(resource.key(), record.clone());
            Ok((record, true))
        })
    }

    fn update(
        &self,
        resource: &ResourceId,
        update: &ProgressUpdate,
    ) -> StoreResult<ProgressRecord> {
        self.with_data(|data| {
            let record = data
                .records
                .get_mut(&resource.key())
                .ok_or_else(|| StoreError::NotFound(resource.clone()))?;
            let now = Utc::now();
            record.current_token_index = update.current_token_index;
            if update.is_completed && record.completed_at.is_none() {
                record.completed_at = Some(now);
            }
            record.is_completed = update.is_completed;
            record.updated_at = Some(now);
            Ok((record.clone(), true))
        })
    }

    fn delete(&self, resource: &ResourceId) -> StoreResult<()> {
        self.with_data(|data| {
            let removed = data.records.remove(&resource.key()).is_some();
            Ok(((), removed))
        })
    }
}
