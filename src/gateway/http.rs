use std::time::Duration;

use log::error;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::GatewayConfig;

use super::client::RecordGateway;
use super::error::GatewayError;
use super::types::{
    FetchParams, FetchResponse, FieldSpec, GetResponse, RecordResult, WriteResponse,
};

#[derive(Serialize)]
struct GetBody {
    id: i64,
    fields: Vec<FieldSpec>,
}

#[derive(Serialize)]
struct RecordsBody {
    records: Vec<Value>,
}

#[derive(Serialize)]
struct DeleteBody {
    #[serde(rename = "recordIds")]
    record_ids: Vec<i64>,
}

/// HTTP client for the record store. One POST endpoint per verb under
/// `/api/records/{entity}/`, bearer-authenticated.
#[derive(Debug, Clone)]
pub struct HttpRecordGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpRecordGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        entity: &str,
        verb: &str,
        body: &B,
    ) -> Result<R, GatewayError> {
        let url = format!("{}/api/records/{}/{}", self.base_url, entity, verb);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Record store request failed: {status} - {body}");
            return Err(GatewayError::ApiError(format!(
                "{verb} {entity} failed: {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::ParseError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RecordGateway for HttpRecordGateway {
    async fn fetch_records(
        &self,
        entity: &str,
        params: FetchParams,
    ) -> Result<Vec<Value>, GatewayError> {
        let response: FetchResponse = self.post(entity, "fetch", &params).await?;
        if !response.success {
            return Err(GatewayError::ApiError(
                response.message.unwrap_or_else(|| "fetch rejected".to_string()),
            ));
        }
        Ok(response.data.unwrap_or_default())
    }

    async fn get_record_by_id(
        &self,
        entity: &str,
        id: i64,
        fields: Vec<FieldSpec>,
    ) -> Result<Option<Value>, GatewayError> {
        let response: GetResponse = self.post(entity, "get", &GetBody { id, fields }).await?;
        if !response.success {
            return Err(GatewayError::ApiError(
                response.message.unwrap_or_else(|| "get rejected".to_string()),
            ));
        }
        Ok(response.data.filter(|data| !data.is_null()))
    }

    async fn create_records(
        &self,
        entity: &str,
        records: Vec<Value>,
    ) -> Result<Vec<RecordResult>, GatewayError> {
        let response: WriteResponse = self
            .post(entity, "create", &RecordsBody { records })
            .await?;
        if !response.success {
            return Err(GatewayError::ApiError(
                response.message.unwrap_or_else(|| "create rejected".to_string()),
            ));
        }
        Ok(response.results.unwrap_or_default())
    }

    async fn update_records(
        &self,
        entity: &str,
        records: Vec<Value>,
    ) -> Result<Vec<RecordResult>, GatewayError> {
        let response: WriteResponse = self
            .post(entity, "update", &RecordsBody { records })
            .await?;
        if !response.success {
            return Err(GatewayError::ApiError(
                response.message.unwrap_or_else(|| "update rejected".to_string()),
            ));
        }
        Ok(response.results.unwrap_or_default())
    }

    async fn delete_records(
        &self,
        entity: &str,
        ids: Vec<i64>,
    ) -> Result<Vec<RecordResult>, GatewayError> {
        let response: WriteResponse = self
            .post(entity, "delete", &DeleteBody { record_ids: ids })
            .await?;
        if !response.success {
            return Err(GatewayError::ApiError(
                response.message.unwrap_or_else(|| "delete rejected".to_string()),
            ));
        }
        Ok(response.results.unwrap_or_default())
    }
}
