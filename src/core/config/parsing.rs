use std::env;
use std::str::FromStr;

use super::types::{ConfigError, Environment, RowStoreBackend};

const DEFAULT_CORS_ORIGINS: &[&str] =
    &["http://localhost:5173", "http://localhost:3000", "http://localhost:8080"];

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn env_flag(key: &str) -> bool {
    env_optional(key).map(|value| parse_bool(&value)).unwrap_or(false)
}

/// Reads `key` as a number, falling back to `default` when unset.
pub(super) fn env_number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_optional(key) {
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::InvalidValue { field: key, value }),
        None => Ok(default),
    }
}

pub(super) fn parse_cors_origins(value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let Some(raw) = value else {
        return Ok(default_cors_origins());
    };

    if raw.trim().is_empty() {
        return Ok(default_cors_origins());
    }

    if raw.trim_start().starts_with('[') {
        let parsed: Vec<String> =
            serde_json::from_str(&raw).map_err(|_| ConfigError::InvalidCors(raw.clone()))?;
        if parsed.is_empty() {
            return Ok(default_cors_origins());
        }
        return Ok(parsed);
    }

    let items: Vec<String> = raw
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        return Ok(default_cors_origins());
    }

    Ok(items)
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

pub(super) fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|item| item.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}

pub(super) fn parse_row_store_backend(value: String) -> Result<RowStoreBackend, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "memory" => Ok(RowStoreBackend::Memory),
        "redis" => Ok(RowStoreBackend::Redis),
        _ => Err(ConfigError::InvalidValue { field: "ROW_STORE_BACKEND", value }),
    }
}

/// Drops a trailing slash so links can be joined with `/`.
pub(super) fn normalize_base_url(value: String) -> String {
    value.trim_end_matches('/').to_string()
}

fn default_cors_origins() -> Vec<String> {
    DEFAULT_CORS_ORIGINS.iter().map(|item| item.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cors_origins_json() {
        let raw = "[\"http://a\",\"http://b\"]".to_string();
        let parsed = parse_cors_origins(Some(raw)).expect("cors json");
        assert_eq!(parsed, vec!["http://a".to_string(), "http://b".to_string()]);
    }

    #[test]
    fn parse_cors_origins_csv() {
        let raw = "http://a, http://b".to_string();
        let parsed = parse_cors_origins(Some(raw)).expect("cors csv");
        assert_eq!(parsed, vec!["http://a".to_string(), "http://b".to_string()]);
    }

    #[test]
    fn parse_cors_origins_rejects_broken_json() {
        assert!(matches!(
            parse_cors_origins(Some("[\"http://a\"".to_string())),
            Err(ConfigError::InvalidCors(_))
        ));
    }

    #[test]
    fn env_number_uses_default_and_rejects_garbage() {
        env::remove_var("EXAMDESK_PARSING_PROBE");
        assert_eq!(env_number("EXAMDESK_PARSING_PROBE", 7u32).unwrap(), 7);

        env::set_var("EXAMDESK_PARSING_PROBE", " 12 ");
        assert_eq!(env_number("EXAMDESK_PARSING_PROBE", 7u32).unwrap(), 12);

        env::set_var("EXAMDESK_PARSING_PROBE", "-1");
        assert!(matches!(
            env_number("EXAMDESK_PARSING_PROBE", 7u32),
            Err(ConfigError::InvalidValue { field: "EXAMDESK_PARSING_PROBE", .. })
        ));
        env::remove_var("EXAMDESK_PARSING_PROBE");
    }

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn parse_environment_variants() {
        assert_eq!(parse_environment(Some("prod".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("testing".to_string())), Environment::Test);
        assert_eq!(parse_environment(None), Environment::Development);
    }

    #[test]
    fn parse_row_store_backend_variants() {
        assert_eq!(parse_row_store_backend("Redis".into()).unwrap(), RowStoreBackend::Redis);
        assert_eq!(parse_row_store_backend("memory".into()).unwrap(), RowStoreBackend::Memory);
        assert!(parse_row_store_backend("sheets".into()).is_err());
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        assert_eq!(normalize_base_url("https://exams.local/".into()), "https://exams.local");
    }
}
