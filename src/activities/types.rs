use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::RecordRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Task,
    Note,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::Call,
        ActivityType::Email,
        ActivityType::Meeting,
        ActivityType::Task,
        ActivityType::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::Email => "Email",
            Self::Meeting => "Meeting",
            Self::Task => "Task",
            Self::Note => "Note",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "dueDate", default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "contactId", default)]
    pub contact: Option<RecordRef>,
    #[serde(rename = "dealId", default)]
    pub deal: Option<RecordRef>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Activities may hang off a contact, a deal, both, or neither; absent
/// references serialize as nulls so the store clears them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityInput {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "contactId")]
    pub contact_id: Option<i64>,
    #[serde(rename = "dealId")]
    pub deal_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn activity_type_round_trips() {
        for activity_type in ActivityType::ALL {
            assert_eq!(ActivityType::parse(activity_type.as_str()), Some(activity_type));
        }
        assert_eq!(ActivityType::parse("Fax"), None);
    }

    #[test]
    fn activity_decodes_with_resolved_references() {
        let activity: Activity = serde_json::from_value(json!({
            "Id": 2,
            "type": "Meeting",
            "subject": "Kickoff",
            "completed": false,
            "contactId": {"Id": 11, "Name": "Ada Byron"},
            "dealId": 5
        }))
        .unwrap();
        assert_eq!(activity.activity_type, ActivityType::Meeting);
        assert_eq!(activity.contact, Some(RecordRef::resolved(11, "Ada Byron")));
        assert_eq!(activity.deal, Some(RecordRef::bare(5)));
    }

    #[test]
    fn input_serializes_absent_references_as_null() {
        let input = ActivityInput {
            activity_type: ActivityType::Call,
            subject: "Follow up".to_string(),
            description: String::new(),
            due_date: "2026-08-10T09:00:00Z".parse().unwrap(),
            completed: false,
            contact_id: None,
            deal_id: Some(5),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["contactId"], json!(null));
        assert_eq!(value["dealId"], json!(5));
    }
}
