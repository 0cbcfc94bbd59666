use std::time::Duration;

use clap::Args;

use crate::advisor::{GenerativeAdvisor, GenerativeAdvisorConfig};

pub const DEFAULT_ADVISOR_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ADVISOR_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    #[arg(long, env = "FINLIT_PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(long, env = "FINLIT_ADVISOR_URL", default_value = DEFAULT_ADVISOR_URL)]
    pub advisor_url: String,
    #[arg(long, env = "FINLIT_ADVISOR_MODEL", default_value = DEFAULT_ADVISOR_MODEL)]
    pub advisor_model: String,
    /// Without a key the scheme selector answers 502 and every calculator still works.
    #[arg(long, env = "FINLIT_ADVISOR_KEY", hide_env_values = true)]
    pub advisor_key: Option<String>,
    #[arg(long, env = "FINLIT_ADVISOR_TIMEOUT_SECS", default_value_t = 20)]
    pub advisor_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            advisor_url: DEFAULT_ADVISOR_URL.to_string(),
            advisor_model: DEFAULT_ADVISOR_MODEL.to_string(),
            advisor_key: None,
            advisor_timeout_secs: 20,
        }
    }
}

impl ServerConfig {
    pub fn advisor(&self) -> GenerativeAdvisor {
        if self.advisor_key.is_none() {
            log::warn!("no advisor key configured; scheme selector requests will fail");
        }
        GenerativeAdvisor::new(GenerativeAdvisorConfig {
            base_url: self.advisor_url.clone(),
            model: self.advisor_model.clone(),
            api_key: self.advisor_key.clone().filter(|key| !key.trim().is_empty()),
            timeout: Duration::from_secs(self.advisor_timeout_secs.max(1)),
        })
    }
}
