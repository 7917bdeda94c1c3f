use std::sync::Arc;

use log::error;
use serde_json::{json, Map, Value};

use crate::gateway::{
    decode_record, decode_records, Condition, FetchParams, FieldSpec, GatewayError, Operator,
    OrderBy, PagingInfo, RecordGateway, RecordResult, SortType,
};
use crate::shared::{iso_now, CrmError, Notifier};

use super::types::{Activity, ActivityInput, ActivityType};

pub const ENTITY: &str = "activity";

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::plain("Id"),
        FieldSpec::plain("type"),
        FieldSpec::plain("subject"),
        FieldSpec::plain("description"),
        FieldSpec::plain("dueDate"),
        FieldSpec::plain("completed"),
        FieldSpec::plain("createdAt"),
        FieldSpec::reference("contactId", "Name"),
        FieldSpec::reference("dealId", "title"),
    ]
}

/// Field set for FK-scoped fetches: plain ids, no reference resolution.
fn fields_unresolved() -> Vec<FieldSpec> {
    vec![
        FieldSpec::plain("Id"),
        FieldSpec::plain("type"),
        FieldSpec::plain("subject"),
        FieldSpec::plain("description"),
        FieldSpec::plain("dueDate"),
        FieldSpec::plain("completed"),
        FieldSpec::plain("createdAt"),
        FieldSpec::plain("contactId"),
        FieldSpec::plain("dealId"),
    ]
}

pub struct ActivitiesService {
    gateway: Arc<dyn RecordGateway>,
    notifier: Arc<dyn Notifier>,
}

impl ActivitiesService {
    pub fn new(gateway: Arc<dyn RecordGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self { gateway, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Activity>, CrmError> {
        let rows = self
            .gateway
            .fetch_records(ENTITY, FetchParams::with_fields(fields()))
            .await
            .map_err(|e| self.fail("fetching activities", "Failed to load activities", e))?;
        decode_records(rows)
            .map_err(|e| self.fail("decoding activities", "Failed to load activities", e))
    }

    pub async fn get(&self, id: i64) -> Result<Activity, CrmError> {
        let row = self
            .gateway
            .get_record_by_id(ENTITY, id, fields())
            .await
            .map_err(|e| self.fail("fetching activity", "Failed to load activity", e))?;
        match row {
            Some(row) => decode_record(row)
                .map_err(|e| self.fail("decoding activity", "Failed to load activity", e)),
            None => Err(CrmError::NotFound),
        }
    }

    pub async fn create(&self, input: &ActivityInput) -> Result<Activity, CrmError> {
        let mut record = self.encode(input, "Failed to create activity")?;
        record.insert("createdAt".to_string(), json!(iso_now()));

        let results = self
            .gateway
            .create_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("creating activity", "Failed to create activity", e))?;
        self.first_record(results, "create activity", "Failed to create activity")
    }

    pub async fn update(&self, id: i64, input: &ActivityInput) -> Result<Activity, CrmError> {
        let mut record = self.encode(input, "Failed to update activity")?;
        record.insert("Id".to_string(), json!(id));

        let results = self
            .gateway
            .update_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("updating activity", "Failed to update activity", e))?;
        self.first_record(results, "update activity", "Failed to update activity")
    }

    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let results = self
            .gateway
            .delete_records(ENTITY, vec![id])
            .await
            .map_err(|e| self.fail("deleting activity", "Failed to delete activity", e))?;

        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if failed.is_empty() {
            return Ok(());
        }
        error!("Failed to delete activity {id}: {} record(s) rejected", failed.len());
        Err(CrmError::Rejected(
            self.notify_failures(&failed, "Failed to delete activity"),
        ))
    }

    pub async fn get_by_contact(&self, contact_id: i64) -> Result<Vec<Activity>, CrmError> {
        let mut params = FetchParams::with_fields(fields_unresolved());
        params.where_ = vec![Condition::equal_to("contactId", json!(contact_id))];
        let rows = self
            .gateway
            .fetch_records(ENTITY, params)
            .await
            .map_err(|e| self.fail_quiet("fetching activities by contact", e))?;
        decode_records(rows).map_err(|e| self.fail_quiet("decoding activities by contact", e))
    }

    pub async fn get_by_deal(&self, deal_id: i64) -> Result<Vec<Activity>, CrmError> {
        let mut params = FetchParams::with_fields(fields_unresolved());
        params.where_ = vec![Condition::equal_to("dealId", json!(deal_id))];
        let rows = self
            .gateway
            .fetch_records(ENTITY, params)
            .await
            .map_err(|e| self.fail_quiet("fetching activities by deal", e))?;
        decode_records(rows).map_err(|e| self.fail_quiet("decoding activities by deal", e))
    }

    /// Partial update flipping only the completed flag.
    pub async fn mark_completed(&self, id: i64) -> Result<Activity, CrmError> {
        let mut record = Map::new();
        record.insert("Id".to_string(), json!(id));
        record.insert("completed".to_string(), json!(true));

        let results = self
            .gateway
            .update_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("marking activity completed", "Failed to update activity", e))?;
        self.first_record(results, "mark activity completed", "Failed to update activity")
    }

    /// Incomplete activities due now or later, soonest first.
    pub async fn upcoming(&self, limit: u32) -> Result<Vec<Activity>, CrmError> {
        let params = FetchParams {
            fields: fields(),
            where_: vec![
                Condition::equal_to("completed", json!(false)),
                Condition {
                    field_name: "dueDate",
                    operator: Operator::GreaterThanOrEqualTo,
                    values: vec![json!(iso_now())],
                },
            ],
            order_by: vec![OrderBy {
                field_name: "dueDate",
                sort_type: SortType::Asc,
            }],
            paging_info: Some(PagingInfo { limit, offset: 0 }),
            ..FetchParams::default()
        };
        let rows = self
            .gateway
            .fetch_records(ENTITY, params)
            .await
            .map_err(|e| self.fail_quiet("fetching upcoming activities", e))?;
        decode_records(rows).map_err(|e| self.fail_quiet("decoding upcoming activities", e))
    }

    /// Incomplete activities whose due date has passed.
    pub async fn overdue(&self) -> Result<Vec<Activity>, CrmError> {
        let params = FetchParams {
            fields: fields(),
            where_: vec![
                Condition::equal_to("completed", json!(false)),
                Condition {
                    field_name: "dueDate",
                    operator: Operator::LessThan,
                    values: vec![json!(iso_now())],
                },
            ],
            ..FetchParams::default()
        };
        let rows = self
            .gateway
            .fetch_records(ENTITY, params)
            .await
            .map_err(|e| self.fail_quiet("fetching overdue activities", e))?;
        decode_records(rows).map_err(|e| self.fail_quiet("decoding overdue activities", e))
    }

    pub fn types(&self) -> &'static [ActivityType] {
        &ActivityType::ALL
    }

    fn encode(&self, input: &ActivityInput, fallback: &str) -> Result<Map<String, Value>, CrmError> {
        match serde_json::to_value(input) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                error!("Encoded activity is not an object");
                self.notifier.error(fallback);
                Err(CrmError::Transport("activity did not encode to an object".to_string()))
            }
            Err(e) => {
                error!("Failed to encode activity: {e}");
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
    ) -> Result<Activity, CrmError> {
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
