use std::sync::Arc;

use log::error;
use serde_json::{json, Map, Value};

use crate::gateway::{
    decode_record, decode_records, FetchParams, FieldSpec, GatewayError, RecordGateway,
    RecordResult, WhereGroup,
};
use crate::shared::{iso_now, CrmError, Notifier};

use super::types::{Company, CompanyInput};

pub const ENTITY: &str = "company";

const SEARCH_FIELDS: [&str; 3] = ["name", "industry", "size"];

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::plain("Id"),
        FieldSpec::plain("name"),
        FieldSpec::plain("industry"),
        FieldSpec::plain("size"),
        FieldSpec::plain("website"),
        FieldSpec::plain("address"),
        FieldSpec::plain("notes"),
        FieldSpec::plain("createdAt"),
    ]
}

pub struct CompaniesService {
    gateway: Arc<dyn RecordGateway>,
    notifier: Arc<dyn Notifier>,
}

impl CompaniesService {
    pub fn new(gateway: Arc<dyn RecordGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self { gateway, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Company>, CrmError> {
        let rows = self
            .gateway
            .fetch_records(ENTITY, FetchParams::with_fields(fields()))
            .await
            .map_err(|e| self.fail("fetching companies", "Failed to load companies", e))?;
        decode_records(rows)
            .map_err(|e| self.fail("decoding companies", "Failed to load companies", e))
    }

    pub async fn get(&self, id: i64) -> Result<Company, CrmError> {
        let row = self
            .gateway
            .get_record_by_id(ENTITY, id, fields())
            .await
            .map_err(|e| self.fail("fetching company", "Failed to load company", e))?;
        match row {
            Some(row) => decode_record(row)
                .map_err(|e| self.fail("decoding company", "Failed to load company", e)),
            None => Err(CrmError::NotFound),
        }
    }

    pub async fn create(&self, input: &CompanyInput) -> Result<Company, CrmError> {
        let mut record = self.encode(input, "Failed to create company")?;
        record.insert("createdAt".to_string(), json!(iso_now()));

        let results = self
            .gateway
            .create_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("creating company", "Failed to create company", e))?;
        self.first_record(results, "create company", "Failed to create company")
    }

    pub async fn update(&self, id: i64, input: &CompanyInput) -> Result<Company, CrmError> {
        let mut record = self.encode(input, "Failed to update company")?;
        record.insert("Id".to_string(), json!(id));

        let results = self
            .gateway
            .update_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("updating company", "Failed to update company", e))?;
        self.first_record(results, "update company", "Failed to update company")
    }

    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let results = self
            .gateway
            .delete_records(ENTITY, vec![id])
            .await
            .map_err(|e| self.fail("deleting company", "Failed to delete company", e))?;

        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if failed.is_empty() {
            return Ok(());
        }
        error!("Failed to delete company {id}: {} record(s) rejected", failed.len());
        Err(CrmError::Rejected(
            self.notify_failures(&failed, "Failed to delete company"),
        ))
    }

    /// Substring search across name, industry, and size. An empty query
    /// returns everything.
    pub async fn search(&self, query: &str) -> Result<Vec<Company>, CrmError> {
        let mut params = FetchParams::with_fields(fields());
        if !query.is_empty() {
            params.where_groups = vec![WhereGroup::any_contains(&SEARCH_FIELDS, query)];
        }
        let rows = self
            .gateway
            .fetch_records(ENTITY, params)
            .await
            .map_err(|e| self.fail_quiet("searching companies", e))?;
        decode_records(rows).map_err(|e| self.fail_quiet("decoding company search results", e))
    }

    fn encode(&self, input: &CompanyInput, fallback: &str) -> Result<Map<String, Value>, CrmError> {
        match serde_json::to_value(input) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                error!("Encoded company is not an object");
                self.notifier.error(fallback);
                Err(CrmError::Transport("company did not encode to an object".to_string()))
            }
            Err(e) => {
                error!("Failed to encode company: {e}");
                self.notifier.error(fallback);
                Err(CrmError::Transport(e.to_string()))
            }
        }
    }

    fn first_record(
        &self,
        results: Vec<RecordResult>,
        context: &str,
        fallback: &str,
    ) -> Result<Company, CrmError> {
        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            error!("Failed to {context}: {} record(s) rejected", failed.len());
            return Err(CrmError::Rejected(self.notify_failures(&failed, fallback)));
        }
        match results.into_iter().next().and_then(|r| r.data) {
            Some(data) => decode_record(data).map_err(|e| self.fail(context, fallback, e)),
            None => Err(CrmError::Rejected(format!("{context}: store returned no record"))),
        }
    }

    fn notify_failures(&self, failed: &[&RecordResult], fallback: &str) -> String {
        let mut messages = Vec::new();
        for result in failed {
            if let Some(message) = &result.message {
                self.notifier.error(message);
                messages.push(message.clone());
            }
        }
        if messages.is_empty() {
            self.notifier.error(fallback);
            fallback.to_string()
        } else {
            messages.join("; ")
        }
    }

    fn fail(&self, context: &str, fallback: &str, err: GatewayError) -> CrmError {
        error!("Error {context}: {err}");
        match &err {
            GatewayError::ApiError(message) => self.notifier.error(message),
            _ => self.notifier.error(fallback),
        }
        err.into()
    }

    fn fail_quiet(&self, context: &str, err: GatewayError) -> CrmError {
        error!("Error {context}: {err}");
        err.into()
    }
}
