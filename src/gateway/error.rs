#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    NetworkError(String),
    ParseError(String),
    ApiError(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError(e) => write!(f, "Network error: {e}"),
            Self::ParseError(e) => write!(f, "Parse error: {e}"),
            Self::ApiError(e) => write!(f, "API error: {e}"),
        }
    }
}

impl std::error::Error for GatewayError {}
