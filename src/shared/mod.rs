use chrono::{SecondsFormat, Utc};
use log::error;

use crate::gateway::GatewayError;

/// Failure kinds surfaced by every entity service. Callers can match on the
/// variant instead of parsing strings: `NotFound` is a missing record,
/// `Rejected` carries the store's own message, `Transport` wraps network or
/// decode failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmError {
    NotFound,
    InvalidInput(String),
    Rejected(String),
    Transport(String),
}

impl std::fmt::Display for CrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Record not found"),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::Rejected(msg) => write!(f, "Rejected by store: {msg}"),
            Self::Transport(msg) => write!(f, "Transport error: {msg}"),
        }
    }
}

impl std::error::Error for CrmError {}

impl From<GatewayError> for CrmError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ApiError(msg) => Self::Rejected(msg),
            GatewayError::NetworkError(msg) => Self::Transport(msg),
            GatewayError::ParseError(msg) => Self::Transport(msg),
        }
    }
}

/// User-facing failure reporting. The UI shell supplies its own
/// implementation (toast bar, status line); `LogNotifier` is the default for
/// headless use.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        error!("{message}");
    }
}

/// Timestamp format used for every store-bound `createdAt`/`updatedAt` stamp.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crm_error_display() {
        assert_eq!(CrmError::NotFound.to_string(), "Record not found");
        assert_eq!(
            CrmError::Rejected("duplicate email".into()).to_string(),
            "Rejected by store: duplicate email"
        );
    }

    #[test]
    fn gateway_error_mapping() {
        assert_eq!(
            CrmError::from(GatewayError::ApiError("nope".into())),
            CrmError::Rejected("nope".into())
        );
        assert_eq!(
            CrmError::from(GatewayError::NetworkError("refused".into())),
            CrmError::Transport("refused".into())
        );
        assert_eq!(
            CrmError::from(GatewayError::ParseError("bad json".into())),
            CrmError::Transport("bad json".into())
        );
    }

    #[test]
    fn iso_now_is_utc_millis() {
        let stamp = iso_now();
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "2026-01-01T00:00:00.000Z".len());
    }
}
