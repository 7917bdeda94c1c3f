use std::sync::Arc;

use log::error;
use serde_json::{json, Map, Value};

use crate::gateway::{
    decode_record, decode_records, Condition, FetchParams, FieldSpec, GatewayError, RecordGateway,
    RecordResult,
};
use crate::shared::{iso_now, CrmError, Notifier};

use super::export::{self, ExportResult};
use super::types::{
    BulkDeleteOutcome, BulkUpdateOutcome, Contact, ContactInput, ContactPatch,
};

pub const ENTITY: &str = "contact";

const SEARCH_FIELDS: [&str; 4] = ["firstName", "lastName", "email", "title"];

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::plain("Id"),
        FieldSpec::plain("firstName"),
        FieldSpec::plain("lastName"),
        FieldSpec::plain("email"),
        FieldSpec::plain("phone"),
        FieldSpec::plain("title"),
        FieldSpec::plain("notes"),
        FieldSpec::plain("createdAt"),
        FieldSpec::plain("updatedAt"),
        FieldSpec::reference("companyId", "name"),
    ]
}

pub struct ContactsService {
    gateway: Arc<dyn RecordGateway>,
    notifier: Arc<dyn Notifier>,
}

impl ContactsService {
    pub fn new(gateway: Arc<dyn RecordGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self { gateway, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Contact>, CrmError> {
        let rows = self
            .gateway
            .fetch_records(ENTITY, FetchParams::with_fields(fields()))
            .await
            .map_err(|e| self.fail("fetching contacts", "Failed to load contacts", e))?;
        decode_records(rows).map_err(|e| self.fail("decoding contacts", "Failed to load contacts", e))
    }

    pub async fn get(&self, id: i64) -> Result<Contact, CrmError> {
        let row = self
            .gateway
            .get_record_by_id(ENTITY, id, fields())
            .await
            .map_err(|e| self.fail("fetching contact", "Failed to load contact", e))?;
        match row {
            Some(row) => decode_record(row)
                .map_err(|e| self.fail("decoding contact", "Failed to load contact", e)),
            None => Err(CrmError::NotFound),
        }
    }

    pub async fn create(&self, input: &ContactInput) -> Result<Contact, CrmError> {
        let mut record = self.encode(input, "contact", "Failed to create contact")?;
        let now = iso_now();
        record.insert("createdAt".to_string(), json!(now.clone()));
        record.insert("updatedAt".to_string(), json!(now));

        let results = self
            .gateway
            .create_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("creating contact", "Failed to create contact", e))?;
        self.first_record(results, "create contact", "Failed to create contact")
    }

    pub async fn update(&self, id: i64, input: &ContactInput) -> Result<Contact, CrmError> {
        let mut record = self.encode(input, "contact", "Failed to update contact")?;
        record.insert("Id".to_string(), json!(id));
        record.insert("updatedAt".to_string(), json!(iso_now()));

        let results = self
            .gateway
            .update_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("updating contact", "Failed to update contact", e))?;
        self.first_record(results, "update contact", "Failed to update contact")
    }

    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let results = self
            .gateway
            .delete_records(ENTITY, vec![id])
            .await
            .map_err(|e| self.fail("deleting contact", "Failed to delete contact", e))?;

        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if failed.is_empty() {
            return Ok(());
        }
        error!("Failed to delete contact {id}: {} record(s) rejected", failed.len());
        Err(CrmError::Rejected(
            self.notify_failures(&failed, "Failed to delete contact"),
        ))
    }

    /// Substring search across name, email, and title. An empty query returns
    /// everything.
    pub async fn search(&self, query: &str) -> Result<Vec<Contact>, CrmError> {
        let mut params = FetchParams::with_fields(fields());
        if !query.is_empty() {
            params.where_groups = vec![crate::gateway::WhereGroup::any_contains(
                &SEARCH_FIELDS,
                query,
            )];
        }
        let rows = self
            .gateway
            .fetch_records(ENTITY, params)
            .await
            .map_err(|e| self.fail_quiet("searching contacts", e))?;
        decode_records(rows).map_err(|e| self.fail_quiet("decoding contact search results", e))
    }

    /// Contacts belonging to one company, filtered store-side.
    pub async fn get_by_company(&self, company_id: i64) -> Result<Vec<Contact>, CrmError> {
        let mut params = FetchParams::with_fields(fields());
        params.where_ = vec![Condition::equal_to("companyId", json!(company_id))];
        let rows = self
            .gateway
            .fetch_records(ENTITY, params)
            .await
            .map_err(|e| self.fail_quiet("fetching contacts by company", e))?;
        decode_records(rows).map_err(|e| self.fail_quiet("decoding contacts by company", e))
    }

    /// Applies one patch to many contacts in a single store call. Per-id
    /// outcomes are independent; a store-level rejection fails every id.
    pub async fn bulk_update(&self, ids: &[i64], patch: &ContactPatch) -> BulkUpdateOutcome {
        let base = match serde_json::to_value(patch) {
            Ok(Value::Object(map)) => map,
            _ => {
                error!("Failed to encode contact patch");
                self.notifier.error("Failed to update contacts");
                return BulkUpdateOutcome::all_failed(ids.len());
            }
        };
        let now = iso_now();
        let records: Vec<Value> = ids
            .iter()
            .map(|id| {
                let mut record = base.clone();
                record.insert("Id".to_string(), json!(id));
                record.insert("updatedAt".to_string(), json!(now.clone()));
                Value::Object(record)
            })
            .collect();

        let results = match self.gateway.update_records(ENTITY, records).await {
            Ok(results) => results,
            Err(e) => {
                self.fail("bulk updating contacts", "Failed to update contacts", e);
                return BulkUpdateOutcome::all_failed(ids.len());
            }
        };

        let (succeeded, failed): (Vec<RecordResult>, Vec<RecordResult>) =
            results.into_iter().partition(|r| r.success);
        if !failed.is_empty() {
            error!("Failed to update {} contact(s)", failed.len());
            self.notify_failures(&failed.iter().collect::<Vec<_>>(), "Failed to update contacts");
        }

        let success_count = succeeded.len();
        let updated = succeeded
            .into_iter()
            .filter_map(|r| r.data)
            .filter_map(|data| decode_record(data).ok())
            .collect();
        BulkUpdateOutcome {
            updated,
            error_count: failed.len(),
            errors: failed,
            success_count,
        }
    }

    /// Deletes many contacts in a single store call, reporting per-id
    /// outcomes.
    pub async fn bulk_delete(&self, ids: &[i64]) -> BulkDeleteOutcome {
        let results = match self.gateway.delete_records(ENTITY, ids.to_vec()).await {
            Ok(results) => results,
            Err(e) => {
                self.fail("bulk deleting contacts", "Failed to delete contacts", e);
                return BulkDeleteOutcome::all_failed(ids.len());
            }
        };

        let (deleted, failed): (Vec<RecordResult>, Vec<RecordResult>) =
            results.into_iter().partition(|r| r.success);
        if !failed.is_empty() {
            error!("Failed to delete {} contact(s)", failed.len());
            self.notify_failures(&failed.iter().collect::<Vec<_>>(), "Failed to delete contacts");
        }

        BulkDeleteOutcome {
            success_count: deleted.len(),
            error_count: failed.len(),
            deleted,
            errors: failed,
        }
    }

    /// CSV export of an already-fetched contact list.
    pub fn export_csv(&self, contacts: &[Contact]) -> ExportResult {
        export::contacts_to_csv(contacts)
    }

    fn encode<T: serde::Serialize>(
        &self,
        value: &T,
        context: &str,
        fallback: &str,
    ) -> Result<Map<String, Value>, CrmError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                error!("Encoded {context} is not an object");
                self.notifier.error(fallback);
                Err(CrmError::Transport(format!("{context} did not encode to an object")))
            }
            Err(e) => {
                error!("Failed to encode {context}: {e}");
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
    ) -> Result<Contact, CrmError> {
        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            error!("Failed to {context}: {} record(s) rejected", failed.len());
            return Err(CrmError::Rejected(self.notify_failures(&failed, fallback)));
        }
        match results.into_iter().next().and_then(|r| r.data) {
            Some(data) => {
                decode_record(data).map_err(|e| self.fail(context, fallback, e))
            }
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
