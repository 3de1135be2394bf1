//! Flat `KEY=VALUE` env file loading.
//!
//! Supported lines: `KEY=VALUE`, `export KEY=VALUE`, blank lines and `#` comments.
//! Values may be wrapped in matching single or double quotes.

use crate::utils::error::{CrmError, Result};
use std::path::Path;

pub fn parse_env_file(content: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let (key, value) = line.split_once('=').ok_or_else(|| CrmError::ConfigError {
            message: format!("env file line {}: expected KEY=VALUE", index + 1),
        })?;
        let key = key.trim();
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(CrmError::ConfigError {
                message: format!("env file line {}: invalid key '{}'", index + 1, key),
            });
        }

        pairs.push((key.to_string(), unquote(value.trim()).to_string()));
    }

    Ok(pairs)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// 載入 env 檔到行程環境變數；已存在的變數不覆蓋。回傳實際套用的數量。
pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let mut applied = 0;

    for (key, value) in parse_env_file(&content)? {
        if std::env::var_os(&key).is_some() {
            tracing::debug!("env {} already set, keeping existing value", key);
            continue;
        }
        std::env::set_var(&key, value);
        applied += 1;
    }

    tracing::debug!("Loaded {} variables from {}", applied, path.display());
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_file() {
        let content = r#"
# connection
CRM_URL=https://contoso.crm.dynamics.com
export CRM_ACCESS_TOKEN="abc def"
CRM_PAGE_SIZE = '50'
EMPTY=
"#;
        let pairs = parse_env_file(content).unwrap();
        assert_eq!(
            pairs,
            vec![
                (
                    "CRM_URL".to_string(),
                    "https://contoso.crm.dynamics.com".to_string()
                ),
                ("CRM_ACCESS_TOKEN".to_string(), "abc def".to_string()),
                ("CRM_PAGE_SIZE".to_string(), "50".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_env_file_rejects_garbage() {
        assert!(parse_env_file("NOT A PAIR").is_err());
        assert!(parse_env_file("=value").is_err());
        assert!(parse_env_file("TWO WORDS=value").is_err());
    }

    #[test]
    fn test_value_keeps_inner_equals() {
        let pairs = parse_env_file("TOKEN=a=b==").unwrap();
        assert_eq!(pairs[0].1, "a=b==");
    }
}
