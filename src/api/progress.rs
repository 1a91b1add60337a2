use crate::api::client::{ApiClient, ApiResponse, Method};
use crate::store::{ProgressRecord, ProgressStore, ProgressUpdate, ResourceId, StoreResult};

/// Progress records held by the practice API.
pub struct HttpProgressStore {
    client: ApiClient,
}

impl HttpProgressStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

/// Some endpoints answer a write with an empty body; fall back to what was sent.
fn record_or(response: &ApiResponse, fallback: ProgressRecord) -> ProgressRecord {
    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(value) if value.get("current_token_index").is_some() => {
            serde_json::from_value(value).unwrap_or(fallback)
        }
        _ => fallback,
    }
}

impl ProgressStore for HttpProgressStore {
    fn fetch(&self, resource: &ResourceId) -> StoreResult<Option<ProgressRecord>> {
        let response = self.client.send(Method::Get, &resource.api_path(), None)?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }

    fn create(&self, resource: &ResourceId) -> StoreResult<ProgressRecord> {
        let response = self
            .client
            .send(Method::Post, &resource.api_path(), None)?
            .error_for_status()?;
        Ok(record_or(&response, ProgressRecord::default()))
    }

    fn update(
        &self,
        resource: &ResourceId,
        update: &ProgressUpdate,
    ) -> StoreResult<ProgressRecord> {
        let response = self
            .client
            .send(Method::Put, &resource.api_path(), Some(update))?
            .error_for_status()?;
        let sent = ProgressRecord {
            current_token_index: update.current_token_index,
            is_completed: update.is_completed,
            ..ProgressRecord::default()
        };
        Ok(record_or(&response, sent))
    }

    fn delete(&self, resource: &ResourceId) -> StoreResult<()> {
        let response = self
            .client
            .send(Method::Delete, &resource.api_path(), None)?;
        if response.is_not_found() {
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }
}
