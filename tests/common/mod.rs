use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crmlib::gateway::{FetchParams, FieldSpec, GatewayError, RecordGateway, RecordResult};
use crmlib::shared::Notifier;

/// In-memory record store. Holds one record list per entity, assigns ids,
/// merges updates, and can be scripted to reject whole calls or individual
/// record ids. Every call is journaled with its payload so tests can assert
/// what the services actually sent.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    records: HashMap<String, Vec<Value>>,
    next_id: i64,
    fail_all: Option<String>,
    fail_record_ids: Vec<i64>,
    calls: Vec<(String, Value)>,
}

impl MemoryGateway {
    pub fn seed(&self, entity: &str, mut record: Value) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        record["Id"] = json!(id);
        state.records.entry(entity.to_string()).or_default().push(record);
        id
    }

    /// Every subsequent call fails with a store-level rejection.
    pub fn fail_with(&self, message: &str) {
        self.state.lock().unwrap().fail_all = Some(message.to_string());
    }

    /// Writes touching these ids come back as per-record failures.
    pub fn fail_records(&self, ids: Vec<i64>) {
        self.state.lock().unwrap().fail_record_ids = ids;
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_call(&self) -> Option<(String, Value)> {
        self.state.lock().unwrap().calls.last().cloned()
    }

    pub fn stored(&self, entity: &str, id: i64) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .records
            .get(entity)?
            .iter()
            .find(|r| r["Id"] == json!(id))
            .cloned()
    }

    fn guard(state: &State) -> Result<(), GatewayError> {
        match &state.fail_all {
            Some(message) => Err(GatewayError::ApiError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn fetch_records(
        &self,
        entity: &str,
        params: FetchParams,
    ) -> Result<Vec<Value>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let payload = serde_json::to_value(&params).unwrap_or(Value::Null);
        state.calls.push((format!("fetch:{entity}"), payload));
        Self::guard(&state)?;
        Ok(state.records.get(entity).cloned().unwrap_or_default())
    }

    async fn get_record_by_id(
        &self,
        entity: &str,
        id: i64,
        _fields: Vec<FieldSpec>,
    ) -> Result<Option<Value>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((format!("get:{entity}"), json!({"id": id})));
        Self::guard(&state)?;
        Ok(state
            .records
            .get(entity)
            .and_then(|records| records.iter().find(|r| r["Id"] == json!(id)))
            .cloned())
    }

    async fn create_records(
        &self,
        entity: &str,
        records: Vec<Value>,
    ) -> Result<Vec<RecordResult>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push((format!("create:{entity}"), json!(records.clone())));
        Self::guard(&state)?;

        let mut results = Vec::new();
        for mut record in records {
            state.next_id += 1;
            let id = state.next_id;
            record["Id"] = json!(id);
            state
                .records
                .entry(entity.to_string())
                .or_default()
                .push(record.clone());
            results.push(RecordResult {
                success: true,
                data: Some(record),
                message: None,
            });
        }
        Ok(results)
    }

    async fn update_records(
        &self,
        entity: &str,
        records: Vec<Value>,
    ) -> Result<Vec<RecordResult>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push((format!("update:{entity}"), json!(records.clone())));
        Self::guard(&state)?;

        let rejected = state.fail_record_ids.clone();
        let mut results = Vec::new();
        for record in records {
            let id = record["Id"].as_i64().unwrap_or_default();
            if rejected.contains(&id) {
                results.push(RecordResult {
                    success: false,
                    data: None,
                    message: Some(format!("Record {id} rejected")),
                });
                continue;
            }
            let stored = state
                .records
                .entry(entity.to_string())
                .or_default()
                .iter_mut()
                .find(|r| r["Id"] == json!(id));
            match stored {
                Some(stored) => {
                    if let (Some(target), Some(patch)) = (stored.as_object_mut(), record.as_object())
                    {
                        for (key, value) in patch {
                            target.insert(key.clone(), value.clone());
                        }
                    }
                    results.push(RecordResult {
                        success: true,
                        data: Some(stored.clone()),
                        message: None,
                    });
                }
                None => results.push(RecordResult {
                    success: false,
                    data: None,
                    message: Some(format!("Record {id} does not exist")),
                }),
            }
        }
        Ok(results)
    }

    async fn delete_records(
        &self,
        entity: &str,
        ids: Vec<i64>,
    ) -> Result<Vec<RecordResult>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push((format!("delete:{entity}"), json!(ids.clone())));
        Self::guard(&state)?;

        let rejected = state.fail_record_ids.clone();
        let mut results = Vec::new();
        for id in ids {
            if rejected.contains(&id) {
                results.push(RecordResult {
                    success: false,
                    data: None,
                    message: Some(format!("Record {id} rejected")),
                });
                continue;
            }
            let records = state.records.entry(entity.to_string()).or_default();
            let before = records.len();
            records.retain(|r| r["Id"] != json!(id));
            if records.len() < before {
                results.push(RecordResult {
                    success: true,
                    data: None,
                    message: None,
                });
            } else {
                results.push(RecordResult {
                    success: false,
                    data: None,
                    message: Some(format!("Record {id} does not exist")),
                });
            }
        }
        Ok(results)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
