use serde_json::Value;

use super::{
    client::ApiClient,
    errors::{ErrorContext, Operation},
    resources::{encode_segment, RecordId},
    types::{ApiError, RaceDetails, RACES},
};

impl ApiClient {
    /// Race with its circuit, drivers and constructors in one call.
    pub async fn race_details(&self, id: &RecordId) -> Result<RaceDetails, ApiError> {
        self.race_part(id, "details").await
    }

    pub async fn race_circuit(&self, id: &RecordId) -> Result<Value, ApiError> {
        self.race_part(id, "circuit").await
    }

    pub async fn race_drivers(&self, id: &RecordId) -> Result<Vec<Value>, ApiError> {
        self.race_part(id, "drivers").await
    }

    pub async fn race_constructors(&self, id: &RecordId) -> Result<Vec<Value>, ApiError> {
        self.race_part(id, "constructors").await
    }

    async fn race_part<T: serde::de::DeserializeOwned>(
        &self,
        id: &RecordId,
        part: &str,
    ) -> Result<T, ApiError> {
        let id_text = id.to_string();
        let ctx = ErrorContext::new(RACES, Operation::GetOne).with_id(&id_text);
        let path = format!("{}/{}/{}", RACES, encode_segment(&id_text), part);
        self.get_json(&ctx, &path, &[]).await
    }
}
