use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::{RecordRef, RecordResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "companyId", default)]
    pub company: Option<RecordRef>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full field set for create and update. Unknown fields are rejected instead
/// of being passed through to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactInput {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "companyId")]
    pub company_id: i64,
}

/// Partial update applied to many contacts at once. `None` fields are left
/// untouched on the store side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactPatch {
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "companyId", skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
}

/// Outcome of a bulk update: per-id results, no rollback on partial failure.
#[derive(Debug, Default)]
pub struct BulkUpdateOutcome {
    pub updated: Vec<Contact>,
    pub errors: Vec<RecordResult>,
    pub success_count: usize,
    pub error_count: usize,
}

impl BulkUpdateOutcome {
    pub fn all_failed(count: usize) -> Self {
        Self {
            error_count: count,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct BulkDeleteOutcome {
    pub deleted: Vec<RecordResult>,
    pub errors: Vec<RecordResult>,
    pub success_count: usize,
    pub error_count: usize,
}

impl BulkDeleteOutcome {
    pub fn all_failed(count: usize) -> Self {
        Self {
            error_count: count,
            ..Self::default()
        }
    }
}
