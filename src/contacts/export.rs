use chrono::{SecondsFormat, Utc};

use super::types::Contact;

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub data: String,
    pub content_type: &'static str,
    pub filename: String,
    pub contact_count: usize,
}

const HEADER: &str = "ID,First Name,Last Name,Email,Phone,Title,Company,Created At,Updated At";

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn stamp(value: &Option<chrono::DateTime<Utc>>) -> String {
    value
        .map(|v| v.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Renders a fetched contact list as CSV. The ID column stays bare; every
/// other column is quote-wrapped, with the resolved company label when the
/// reference came back resolved.
pub fn contacts_to_csv(contacts: &[Contact]) -> ExportResult {
    let mut rows = Vec::with_capacity(contacts.len() + 1);
    rows.push(HEADER.to_string());
    for contact in contacts {
        let company = contact
            .company
            .as_ref()
            .and_then(|r| r.label.as_deref())
            .unwrap_or("");
        rows.push(
            [
                contact.id.to_string(),
                quoted(&contact.first_name),
                quoted(&contact.last_name),
                quoted(contact.email.as_deref().unwrap_or("")),
                quoted(contact.phone.as_deref().unwrap_or("")),
                quoted(contact.title.as_deref().unwrap_or("")),
                quoted(company),
                quoted(&stamp(&contact.created_at)),
                quoted(&stamp(&contact.updated_at)),
            ]
            .join(","),
        );
    }

    ExportResult {
        data: rows.join("\n"),
        content_type: "text/csv",
        filename: format!("contacts_export_{}.csv", Utc::now().format("%Y-%m-%d")),
        contact_count: contacts.len(),
    }
}
