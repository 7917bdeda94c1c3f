use std::collections::BTreeMap;
use std::sync::Arc;

use log::error;
use serde_json::{json, Map, Value};

use crate::gateway::{
    decode_record, decode_records, FetchParams, FieldSpec, GatewayError, RecordGateway,
    RecordResult,
};
use crate::shared::{iso_now, CrmError, Notifier};

use super::types::{Deal, DealInput, DealStage};

pub const ENTITY: &str = "deal";

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::plain("Id"),
        FieldSpec::plain("title"),
        FieldSpec::plain("value"),
        FieldSpec::plain("stage"),
        FieldSpec::plain("probability"),
        FieldSpec::plain("closeDate"),
        FieldSpec::plain("notes"),
        FieldSpec::plain("createdAt"),
        FieldSpec::reference("contactId", "Name"),
        FieldSpec::reference("companyId", "name"),
    ]
}

pub struct DealsService {
    gateway: Arc<dyn RecordGateway>,
    notifier: Arc<dyn Notifier>,
}

impl DealsService {
    pub fn new(gateway: Arc<dyn RecordGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self { gateway, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Deal>, CrmError> {
        let rows = self
            .gateway
            .fetch_records(ENTITY, FetchParams::with_fields(fields()))
            .await
            .map_err(|e| self.fail("fetching deals", "Failed to load deals", e))?;
        decode_records(rows).map_err(|e| self.fail("decoding deals", "Failed to load deals", e))
    }

    pub async fn get(&self, id: i64) -> Result<Deal, CrmError> {
        let row = self
            .gateway
            .get_record_by_id(ENTITY, id, fields())
            .await
            .map_err(|e| self.fail("fetching deal", "Failed to load deal", e))?;
        match row {
            Some(row) => {
                decode_record(row).map_err(|e| self.fail("decoding deal", "Failed to load deal", e))
            }
            None => Err(CrmError::NotFound),
        }
    }

    pub async fn create(&self, input: &DealInput) -> Result<Deal, CrmError> {
        let mut record = self.encode(input, "Failed to create deal")?;
        record.insert("createdAt".to_string(), json!(iso_now()));

        let results = self
            .gateway
            .create_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("creating deal", "Failed to create deal", e))?;
        self.first_record(results, "create deal", "Failed to create deal")
    }

    pub async fn update(&self, id: i64, input: &DealInput) -> Result<Deal, CrmError> {
        let mut record = self.encode(input, "Failed to update deal")?;
        record.insert("Id".to_string(), json!(id));

        let results = self
            .gateway
            .update_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("updating deal", "Failed to update deal", e))?;
        self.first_record(results, "update deal", "Failed to update deal")
    }

    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let results = self
            .gateway
            .delete_records(ENTITY, vec![id])
            .await
            .map_err(|e| self.fail("deleting deal", "Failed to delete deal", e))?;

        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if failed.is_empty() {
            return Ok(());
        }
        error!("Failed to delete deal {id}: {} record(s) rejected", failed.len());
        Err(CrmError::Rejected(
            self.notify_failures(&failed, "Failed to delete deal"),
        ))
    }

    /// Moves a deal to a new pipeline stage. Closing stages pin probability
    /// (Closed Won to 100, Closed Lost to 0) in the same store call as the
    /// stage write; an unknown stage string fails before any round trip.
    pub async fn update_stage(&self, id: i64, stage: &str) -> Result<Deal, CrmError> {
        let Some(stage) = DealStage::parse(stage) else {
            error!("Rejected invalid deal stage {stage:?}");
            self.notifier.error("Invalid deal stage");
            return Err(CrmError::InvalidInput(format!("invalid deal stage: {stage}")));
        };

        let mut record = Map::new();
        record.insert("Id".to_string(), json!(id));
        record.insert("stage".to_string(), json!(stage.as_str()));
        if let Some(probability) = stage.probability_override() {
            record.insert("probability".to_string(), json!(probability));
        }

        let results = self
            .gateway
            .update_records(ENTITY, vec![Value::Object(record)])
            .await
            .map_err(|e| self.fail("updating deal stage", "Failed to update deal stage", e))?;
        self.first_record(results, "update deal stage", "Failed to update deal stage")
    }

    /// All deals bucketed by stage, every stage present, pipeline order.
    pub async fn deals_by_stage(&self) -> Result<BTreeMap<DealStage, Vec<Deal>>, CrmError> {
        let deals = self.list().await?;
        let mut buckets: BTreeMap<DealStage, Vec<Deal>> =
            DealStage::ALL.into_iter().map(|stage| (stage, Vec::new())).collect();
        for deal in deals {
            buckets.entry(deal.stage).or_default().push(deal);
        }
        Ok(buckets)
    }

    pub fn stages(&self) -> &'static [DealStage] {
        &DealStage::ALL
    }

    fn encode(&self, input: &DealInput, fallback: &str) -> Result<Map<String, Value>, CrmError> {
        match serde_json::to_value(input) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                error!("Encoded deal is not an object");
                self.notifier.error(fallback);
                Err(CrmError::Transport("deal did not encode to an object".to_string()))
            }
            Err(e) => {
                error!("Failed to encode deal: {e}");
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
    ) -> Result<Deal, CrmError> {
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
}
