use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("CRM_GATEWAY_URL")
            .context("CRM_GATEWAY_URL is not set")?
            .trim_end_matches('/')
            .to_string();
        let api_key = std::env::var("CRM_GATEWAY_KEY").unwrap_or_default();
        let timeout_secs = std::env::var("CRM_GATEWAY_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(AppConfig {
            gateway: GatewayConfig {
                base_url,
                api_key,
                timeout_secs,
            },
        })
    }
}
