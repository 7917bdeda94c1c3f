use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::error::GatewayError;

/// A foreign-key reference as the store hands it back: either a bare numeric
/// id, or `{ "Id": n, "Name": "..." }` when the query asked for a reference
/// field. Both forms normalize here; toward the store it always serializes
/// as the bare id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    pub id: i64,
    pub label: Option<String>,
}

impl RecordRef {
    pub fn bare(id: i64) -> Self {
        Self { id, label: None }
    }

    pub fn resolved(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: Some(label.into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RefRepr {
    Bare(i64),
    Resolved {
        #[serde(rename = "Id")]
        id: i64,
        #[serde(rename = "Name", default)]
        name: Option<String>,
    },
}

impl<'de> Deserialize<'de> for RecordRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RefRepr::deserialize(deserializer)? {
            RefRepr::Bare(id) => Ok(RecordRef { id, label: None }),
            RefRepr::Resolved { id, name } => Ok(RecordRef { id, label: name }),
        }
    }
}

impl Serialize for RecordRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: &'static str,
}

/// One requested column. `reference_field` asks the store to resolve a
/// foreign key into `{ Id, Name }` using the named display column.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub field: FieldName,
    #[serde(rename = "referenceField", skip_serializing_if = "Option::is_none")]
    pub reference_field: Option<FieldName>,
}

impl FieldSpec {
    pub fn plain(name: &'static str) -> Self {
        Self {
            field: FieldName { name },
            reference_field: None,
        }
    }

    pub fn reference(name: &'static str, display: &'static str) -> Self {
        Self {
            field: FieldName { name },
            reference_field: Some(FieldName { name: display }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    EqualTo,
    GreaterThanOrEqualTo,
    LessThan,
    Contains,
}

#[derive(Debug, Clone, Serialize)]
pub struct Condition {
    #[serde(rename = "fieldName")]
    pub field_name: &'static str,
    pub operator: Operator,
    pub values: Vec<Value>,
}

impl Condition {
    pub fn equal_to(field_name: &'static str, value: Value) -> Self {
        Self {
            field_name,
            operator: Operator::EqualTo,
            values: vec![value],
        }
    }

    pub fn contains(field_name: &'static str, text: &str) -> Self {
        Self {
            field_name,
            operator: Operator::Contains,
            values: vec![Value::String(text.to_string())],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubGroup {
    pub conditions: Vec<Condition>,
    pub operator: GroupOperator,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhereGroup {
    pub operator: GroupOperator,
    #[serde(rename = "subGroups")]
    pub sub_groups: Vec<SubGroup>,
}

impl WhereGroup {
    /// OR-combined substring match over several columns, the shape every
    /// text search uses.
    pub fn any_contains(field_names: &[&'static str], text: &str) -> Self {
        Self {
            operator: GroupOperator::Or,
            sub_groups: vec![SubGroup {
                conditions: field_names
                    .iter()
                    .map(|name| Condition::contains(name, text))
                    .collect(),
                operator: GroupOperator::Or,
            }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: &'static str,
    #[serde(rename = "sortType")]
    pub sort_type: SortType,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchParams {
    pub fields: Vec<FieldSpec>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_: Vec<Condition>,
    #[serde(rename = "whereGroups", skip_serializing_if = "Vec::is_empty")]
    pub where_groups: Vec<WhereGroup>,
    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchParams {
    pub fn with_fields(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }
}

// Response envelopes.

#[derive(Debug, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct GetResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
}

/// Per-record outcome within a write batch. Bulk operations report these
/// independently; single-record operations treat any failure as total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Normalizes a raw store record into a typed entity.
pub fn decode_record<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::ParseError(e.to_string()))
}

pub fn decode_records<T: serde::de::DeserializeOwned>(
    rows: Vec<Value>,
) -> Result<Vec<T>, GatewayError> {
    rows.into_iter().map(decode_record).collect()
}
