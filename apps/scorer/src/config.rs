use anyhow::{Context, Result};

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-3.5-turbo";
/// Upper bound on `LLM_MAX_RETRIES`; larger values are clamped.
pub const MAX_LLM_RETRIES: u32 = 10;

/// Application configuration loaded from environment variables.
/// Fails at startup if a numeric variable cannot be parsed. The API key is
/// optional so the page still loads; scoring reports the missing key per request.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    /// Sent as `HTTP-Referer` / `X-Title` for OpenRouter attribution when set.
    pub llm_app_url: Option<String>,
    pub llm_app_title: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    pub max_pdf_pages: usize,
    pub resume_max_chars: usize,
    pub jd_max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout_secs: 60,
            llm_max_retries: 3,
            llm_app_url: None,
            llm_app_title: None,
            port: 8080,
            rust_log: "info".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            max_pdf_pages: 3,
            resume_max_chars: 1000,
            jd_max_chars: 300,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            openrouter_api_key: optional("OPENROUTER_API_KEY"),
            llm_base_url: optional("LLM_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm_base_url),
            llm_model: optional("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", defaults.llm_timeout_secs)?,
            llm_max_retries: parse_or(&lookup, "LLM_MAX_RETRIES", defaults.llm_max_retries)?
                .min(MAX_LLM_RETRIES),
            llm_app_url: optional("LLM_APP_URL"),
            llm_app_title: optional("LLM_APP_TITLE"),
            port: parse_or(&lookup, "PORT", defaults.port)
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or(defaults.rust_log),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_pdf_pages: parse_or(&lookup, "MAX_PDF_PAGES", defaults.max_pdf_pages)?,
            resume_max_chars: parse_or(&lookup, "RESUME_MAX_CHARS", defaults.resume_max_chars)?,
            jd_max_chars: parse_or(&lookup, "JD_MAX_CHARS", defaults.jd_max_chars)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        _ => Ok(default),
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
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.openrouter_api_key.is_none());
        assert_eq!(config.llm_base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_pdf_pages, 3);
        assert_eq!(config.resume_max_chars, 1000);
        assert_eq!(config.jd_max_chars, 300);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("LLM_BASE_URL", "http://localhost:9000/v1/"),
            ("LLM_MODEL", "anthropic/claude-3-haiku"),
            ("PORT", "3000"),
            ("MAX_PDF_PAGES", "5"),
        ]))
        .unwrap();
        assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(config.llm_base_url, "http://localhost:9000/v1");
        assert_eq!(config.llm_model, "anthropic/claude-3-haiku");
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_pdf_pages, 5);
    }

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        let config = Config::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "  ")])).unwrap();
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_fails() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(format!("{err:#}").contains("PORT"));
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = Config::from_lookup(lookup_from(&[("JD_MAX_CHARS", "-4")])).unwrap_err();
        assert!(err.to_string().contains("JD_MAX_CHARS"));
    }

    #[test]
    fn test_retry_count_is_clamped() {
        let config = Config::from_lookup(lookup_from(&[("LLM_MAX_RETRIES", "500")])).unwrap();
        assert_eq!(config.llm_max_retries, MAX_LLM_RETRIES);

        let config = Config::from_lookup(lookup_from(&[("LLM_MAX_RETRIES", "2")])).unwrap();
        assert_eq!(config.llm_max_retries, 2);
    }
}
