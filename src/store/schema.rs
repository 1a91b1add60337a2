use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::ProgressRecord;

const SCHEMA_VERSION: u32 = 1;

/// On-disk layout of `progress.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressData {
    pub schema_version: u32,
    #[serde(default)]
    pub records: BTreeMap<String, ProgressRecord>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            records: BTreeMap::new(),
        }
    }
}

impl ProgressData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
