use async_trait::async_trait;
use serde_json::Value;

use super::error::GatewayError;
use super::types::{FetchParams, FieldSpec, RecordResult};

/// The remote record store, as the services see it. One implementation talks
/// HTTP ([`super::HttpRecordGateway`]); tests inject their own. Every method
/// is a single round trip; the store assigns ids and arbitrates concurrent
/// writers.
///
/// A top-level `success: false` envelope surfaces as `ApiError`; per-record
/// outcomes inside a write batch come back as [`RecordResult`]s for the
/// caller to judge.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn fetch_records(
        &self,
        entity: &str,
        params: FetchParams,
    ) -> Result<Vec<Value>, GatewayError>;

    /// `Ok(None)` means the store answered but has no such record.
    async fn get_record_by_id(
        &self,
        entity: &str,
        id: i64,
        fields: Vec<FieldSpec>,
    ) -> Result<Option<Value>, GatewayError>;

    async fn create_records(
        &self,
        entity: &str,
        records: Vec<Value>,
    ) -> Result<Vec<RecordResult>, GatewayError>;

    async fn update_records(
        &self,
        entity: &str,
        records: Vec<Value>,
    ) -> Result<Vec<RecordResult>, GatewayError>;

    async fn delete_records(
        &self,
        entity: &str,
        ids: Vec<i64>,
    ) -> Result<Vec<RecordResult>, GatewayError>;
}
