use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::contacts::Contact;
use crate::shared::CrmError;

use super::types::{DealInput, DealStage};

/// The transient deal-form draft, holding raw string input exactly as the
/// form fields do. Owned by the open form; discarded on cancel.
#[derive(Debug, Clone, Default)]
pub struct DealForm {
    pub title: String,
    pub value: String,
    pub stage: String,
    pub contact_id: String,
    pub company_id: String,
    pub probability: String,
    pub close_date: String,
    pub notes: String,
}

impl DealForm {
    /// Field-name → error-message map; the draft is valid iff empty.
    pub fn validate(&self) -> BTreeMap<&'static str, String> {
        let mut errors = BTreeMap::new();

        if self.title.trim().is_empty() {
            errors.insert("title", "Deal title is required".to_string());
        }
        match self.value.parse::<f64>() {
            Ok(value) if value > 0.0 => {}
            _ => {
                errors.insert("value", "Please enter a valid deal value".to_string());
            }
        }
        if self.contact_id.is_empty() {
            errors.insert("contactId", "Contact is required".to_string());
        }
        if self.company_id.is_empty() {
            errors.insert("companyId", "Company is required".to_string());
        }
        match self.probability.parse::<i32>() {
            Ok(probability) if (0..=100).contains(&probability) => {}
            _ => {
                errors.insert(
                    "probability",
                    "Probability must be between 0 and 100".to_string(),
                );
            }
        }
        if self.close_date.is_empty() {
            errors.insert("closeDate", "Expected close date is required".to_string());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Coerces the validated draft into the typed service payload. Fails with
    /// the offending field when a coercion does not hold.
    pub fn to_deal_input(&self) -> Result<DealInput, CrmError> {
        let errors = self.validate();
        if let Some((field, message)) = errors.into_iter().next() {
            return Err(CrmError::InvalidInput(format!("{field}: {message}")));
        }

        let stage = DealStage::parse(&self.stage)
            .ok_or_else(|| CrmError::InvalidInput(format!("stage: invalid deal stage {:?}", self.stage)))?;
        let value = self
            .value
            .parse::<f64>()
            .map_err(|_| CrmError::InvalidInput("value: not a number".to_string()))?;
        let probability = self
            .probability
            .parse::<i32>()
            .map_err(|_| CrmError::InvalidInput("probability: not a number".to_string()))?;
        let contact_id = self
            .contact_id
            .parse::<i64>()
            .map_err(|_| CrmError::InvalidInput("contactId: not a number".to_string()))?;
        let company_id = self
            .company_id
            .parse::<i64>()
            .map_err(|_| CrmError::InvalidInput("companyId: not a number".to_string()))?;
        let close_date = NaiveDate::parse_from_str(&self.close_date, "%Y-%m-%d")
            .map_err(|_| CrmError::InvalidInput("closeDate: not a date".to_string()))?;

        Ok(DealInput {
            title: self.title.clone(),
            value,
            stage,
            probability,
            close_date,
            notes: self.notes.clone(),
            contact_id,
            company_id,
        })
    }
}

/// Dependent dropdown filter: with a company selected, only that company's
/// contacts remain (bare and resolved references both match); with none,
/// the list passes through untouched. Input order is preserved.
pub fn filter_by_company<'a>(contacts: &'a [Contact], company_id: Option<i64>) -> Vec<&'a Contact> {
    match company_id {
        None => contacts.iter().collect(),
        Some(id) => contacts
            .iter()
            .filter(|contact| contact.company.as_ref().map_or(false, |r| r.id == id))
            .collect(),
    }
}
