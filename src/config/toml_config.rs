use crate::adapters::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS};
use crate::core::gateway::RedirectMode;
use crate::core::GatewayConfigProvider;
use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub gateway: GatewaySection,
    #[serde(default)]
    pub urls: UrlsSection,
    pub store: Option<StoreSection>,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySection {
    pub name: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlsSection {
    pub redirect_mode: Option<String>,
    pub send_webhook_url: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub json: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"))
}

impl GatewayConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GatewayError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MOLLIE_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("gateway.api_key", &self.gateway.api_key)?;
        if env_var_pattern().is_match(&self.gateway.api_key) {
            return Err(GatewayError::ConfigValidation {
                field: "gateway.api_key".to_string(),
                message: format!(
                    "Environment variable in '{}' is not set",
                    self.gateway.api_key
                ),
            });
        }

        validate_url("gateway.base_url", self.base_url())?;

        if let Some(timeout) = self.gateway.timeout_seconds {
            validate_range("gateway.timeout_seconds", timeout, 1, 300)?;
        }

        if let Some(mode) = &self.urls.redirect_mode {
            RedirectMode::parse(mode)?;
        }

        if let Some(store) = &self.store {
            let path = validate_required_field("store.path", &store.path)?;
            validate_path("store.path", path)?;
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.gateway.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn store_path(&self) -> &str {
        self.store
            .as_ref()
            .and_then(|s| s.path.as_deref())
            .unwrap_or("./payments.json")
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl GatewayConfigProvider for GatewayConfig {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "api_key" => Some(self.gateway.api_key.as_str()),
            "base_url" => Some(self.base_url()),
            "redirect_mode" => self.urls.redirect_mode.as_deref(),
            "send_webhook_url" => self
                .urls
                .send_webhook_url
                .map(|send| if send { "true" } else { "false" }),
            _ => None,
        }
    }
}

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
