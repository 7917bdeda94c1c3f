use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyInput {
    pub name: String,
    pub industry: String,
    pub size: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn company_decodes_sparse_record() {
        let company: Company = serde_json::from_value(json!({
            "Id": 7,
            "name": "Acme",
            "industry": "Manufacturing"
        }))
        .unwrap();
        assert_eq!(company.name, "Acme");
        assert!(company.website.is_none());
    }

    #[test]
    fn input_rejects_unknown_fields() {
        let result: Result<CompanyInput, _> = serde_json::from_value(json!({
            "name": "Acme",
            "industry": "Steel",
            "size": "51-200",
            "revenue": 12
        }));
        assert!(result.is_err());
    }
}
