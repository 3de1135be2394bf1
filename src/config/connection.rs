use crate::core::gateway::DEFAULT_PAGE_SIZE;
use crate::utils::error::{CrmError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_required_field,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const ENV_SERVICE_URL: &str = "CRM_URL";
pub const ENV_ACCESS_TOKEN: &str = "CRM_ACCESS_TOKEN";
pub const ENV_API_VERSION: &str = "CRM_API_VERSION";
pub const ENV_TIMEOUT_SECONDS: &str = "CRM_TIMEOUT_SECONDS";
pub const ENV_PAGE_SIZE: &str = "CRM_PAGE_SIZE";

fn default_api_version() -> String {
    "v9.2".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Settings needed to reach the organization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Organization root, e.g. `https://contoso.crm.dynamics.com`
    pub service_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Pre-issued bearer token
    pub access_token: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// TOML 檔的外層結構：`[connection]` 區段
#[derive(Debug, Clone, Deserialize)]
struct TomlFile {
    connection: Option<ConnectionConfig>,
}

impl ConnectionConfig {
    pub fn new(service_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            api_version: default_api_version(),
            access_token: access_token.into(),
            timeout_seconds: default_timeout_seconds(),
            page_size: default_page_size(),
        }
    }

    /// 從環境變數讀取（通常先由 env 檔載入）
    pub fn from_env() -> Result<Self> {
        let service_url = std::env::var(ENV_SERVICE_URL).ok();
        let access_token = std::env::var(ENV_ACCESS_TOKEN).ok();

        let mut config = Self::new(
            validate_required_field(ENV_SERVICE_URL, &service_url)?.clone(),
            validate_required_field(ENV_ACCESS_TOKEN, &access_token)?.clone(),
        );

        if let Ok(version) = std::env::var(ENV_API_VERSION) {
            config.api_version = version;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECONDS) {
            config.timeout_seconds = parse_number(ENV_TIMEOUT_SECONDS, &raw)?;
        }
        if let Ok(raw) = std::env::var(ENV_PAGE_SIZE) {
            config.page_size = parse_number(ENV_PAGE_SIZE, &raw)?;
        }

        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CrmError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        let file: TomlFile = toml::from_str(&processed_content).map_err(|e| CrmError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })?;
        file.connection.ok_or_else(|| CrmError::MissingConfigError {
            field: "connection".to_string(),
        })
    }

    /// `<service_url>/api/data/<version>/`
    pub fn web_api_base(&self) -> Result<Url> {
        let raw = format!(
            "{}/api/data/{}/",
            self.service_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        );
        Url::parse(&raw).map_err(|e| CrmError::InvalidConfigValueError {
            field: "service_url".to_string(),
            value: self.service_url.clone(),
            reason: format!("Invalid URL format: {}", e),
        })
    }
}

impl Validate for ConnectionConfig {
    fn validate(&self) -> Result<()> {
        validate_url("service_url", &self.service_url)?;
        validate_non_empty_string("api_version", &self.api_version).map_err(as_config_error)?;
        validate_non_empty_string("access_token", &self.access_token).map_err(as_config_error)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        validate_positive_number("page_size", self.page_size as usize, 1)?;
        validate_range("page_size", self.page_size, 1, 5000)?;
        Ok(())
    }
}

fn as_config_error(err: CrmError) -> CrmError {
    match err {
        CrmError::ValidationError { field, message } => CrmError::InvalidConfigValueError {
            field,
            value: String::new(),
            reason: message,
        },
        other => other,
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| CrmError::InvalidConfigValueError {
            field: field.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// 替換環境變數 (例如 ${CRM_ACCESS_TOKEN})；找不到的保留原樣
fn substitute_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("substitution pattern is a valid regex");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str_with_defaults() {
        let config = ConnectionConfig::from_toml_str(
            r#"
[connection]
service_url = "https://contoso.crm.dynamics.com"
access_token = "token-123"
"#,
        )
        .unwrap();

        assert_eq!(config.api_version, "v9.2");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str_substitutes_env_vars() {
        std::env::set_var("CRM_CONSOLE_TEST_TOML_TOKEN", "from-env");
        let config = ConnectionConfig::from_toml_str(
            r#"
[connection]
service_url = "https://contoso.crm.dynamics.com"
access_token = "${CRM_CONSOLE_TEST_TOML_TOKEN}"
page_size = 50
"#,
        )
        .unwrap();

        assert_eq!(config.access_token, "from-env");
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_missing_connection_section() {
        let err = ConnectionConfig::from_toml_str("[other]\nkey = 1\n").unwrap_err();
        assert!(matches!(err, CrmError::MissingConfigError { .. }));
    }

    #[test]
    fn test_web_api_base() {
        let mut config = ConnectionConfig::new("https://contoso.crm.dynamics.com/", "t");
        assert_eq!(
            config.web_api_base().unwrap().as_str(),
            "https://contoso.crm.dynamics.com/api/data/v9.2/"
        );

        config.api_version = "v9.1".to_string();
        assert_eq!(
            config
                .web_api_base()
                .unwrap()
                .join("accounts")
                .unwrap()
                .as_str(),
            "https://contoso.crm.dynamics.com/api/data/v9.1/accounts"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ConnectionConfig::new("https://contoso.crm.dynamics.com", "");
        assert!(matches!(
            config.validate(),
            Err(CrmError::InvalidConfigValueError { .. })
        ));

        config.access_token = "token".to_string();
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());

        config.timeout_seconds = 30;
        config.page_size = 0;
        assert!(config.validate().is_err());
    }
}
