//! Runtime configuration
//!
//! Values come from the environment (a `.env` file is loaded by the binaries
//! first). `from_lookup` takes any key lookup so tests never touch the real
//! process environment.

use crate::error::{Text2SqlError, Result};
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use std::path::PathBuf;

pub const DEFAULT_DATABASE_PATH: &str = "student.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct Config {
    /// Completion service credential (`GROQ_API_KEY`)
    pub api_key: Option<String>,
    pub database_path: PathBuf,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    /// Check statements and open the store read-only
    pub read_only_guard: bool,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            read_only_guard: true,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.api_key = get("GROQ_API_KEY");

        if let Some(path) = get("TEXT2SQL_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(model) = get("TEXT2SQL_MODEL") {
            config.model = model;
        }
        if let Some(url) = get("TEXT2SQL_BASE_URL") {
            config.base_url = url;
        }
        if let Some(raw) = get("TEXT2SQL_MAX_TOKENS") {
            config.max_tokens = match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Text2SqlError::Config(format!(
                        "TEXT2SQL_MAX_TOKENS must be a positive integer, got '{}'",
                        raw
                    )))
                }
            };
        }
        if let Some(raw) = get("TEXT2SQL_READ_ONLY_GUARD") {
            config.read_only_guard = parse_bool("TEXT2SQL_READ_ONLY_GUARD", &raw)?;
        }
        if let Some(addr) = get("TEXT2SQL_BIND") {
            config.bind_addr = addr;
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Text2SqlError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.database_path, PathBuf::from("student.db"));
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.max_tokens, 500);
        assert!(config.read_only_guard);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", " gsk_test "),
            ("TEXT2SQL_DATABASE", "/tmp/other.db"),
            ("TEXT2SQL_MODEL", "llama-3.1-8b-instant"),
            ("TEXT2SQL_MAX_TOKENS", "256"),
            ("TEXT2SQL_READ_ONLY_GUARD", "off"),
            ("TEXT2SQL_BIND", "0.0.0.0:9000"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.max_tokens, 256);
        assert!(!config.read_only_guard);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = Config::from_lookup(lookup_from(&[("GROQ_API_KEY", "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for (key, value) in [
            ("TEXT2SQL_MAX_TOKENS", "lots"),
            ("TEXT2SQL_MAX_TOKENS", "0"),
            ("TEXT2SQL_READ_ONLY_GUARD", "maybe"),
        ] {
            let err = Config::from_lookup(lookup_from(&[(key, value)])).unwrap_err();
            assert!(matches!(err, Text2SqlError::Config(_)), "{}={}", key, value);
        }
    }
}
