use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::RecordRef;

/// Pipeline stages, in pipeline order. The ordering is load-bearing:
/// stage buckets render in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DealStage {
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl DealStage {
    pub const ALL: [DealStage; 6] = [
        DealStage::Lead,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == value)
    }

    /// The one piece of derived business logic in the pipeline: closing a
    /// deal pins its probability. Every other transition leaves probability
    /// alone.
    pub fn probability_override(&self) -> Option<i32> {
        match self {
            Self::ClosedWon => Some(100),
            Self::ClosedLost => Some(0),
            _ => None,
        }
    }
}

impl std::fmt::Display for DealStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: f64,
    pub stage: DealStage,
    #[serde(default)]
    pub probability: i32,
    #[serde(rename = "closeDate", default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "contactId", default)]
    pub contact: Option<RecordRef>,
    #[serde(rename = "companyId", default)]
    pub company: Option<RecordRef>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DealInput {
    pub title: String,
    pub value: f64,
    pub stage: DealStage,
    pub probability: i32,
    #[serde(rename = "closeDate")]
    pub close_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "contactId")]
    pub contact_id: i64,
    #[serde(rename = "companyId")]
    pub company_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stage_round_trips_display_strings() {
        for stage in DealStage::ALL {
            assert_eq!(DealStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(DealStage::parse("Bogus"), None);
        assert_eq!(DealStage::parse("closed won"), None);
    }

    #[test]
    fn closing_stages_pin_probability() {
        assert_eq!(DealStage::ClosedWon.probability_override(), Some(100));
        assert_eq!(DealStage::ClosedLost.probability_override(), Some(0));
        for stage in [
            DealStage::Lead,
            DealStage::Qualified,
            DealStage::Proposal,
            DealStage::Negotiation,
        ] {
            assert_eq!(stage.probability_override(), None);
        }
    }

    #[test]
    fn stage_serializes_with_spaces() {
        assert_eq!(serde_json::to_value(DealStage::ClosedWon).unwrap(), json!("Closed Won"));
        let stage: DealStage = serde_json::from_value(json!("Closed Lost")).unwrap();
        assert_eq!(stage, DealStage::ClosedLost);
    }

    #[test]
    fn deal_decodes_both_reference_forms() {
        let deal: Deal = serde_json::from_value(json!({
            "Id": 5,
            "title": "Annual license",
            "value": 12000.5,
            "stage": "Proposal",
            "probability": 40,
            "closeDate": "2026-09-30",
            "contactId": 11,
            "companyId": {"Id": 7, "Name": "Acme"}
        }))
        .unwrap();
        assert_eq!(deal.contact, Some(RecordRef::bare(11)));
        assert_eq!(deal.company, Some(RecordRef::resolved(7, "Acme")));
        assert_eq!(deal.close_date, Some(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap()));
    }
}
