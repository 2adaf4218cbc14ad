use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub app_env: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ai: AiLimits,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub max_upload_bytes: usize,
    pub anon_analyze_limit: u32,
    pub anon_analyze_window: Duration,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for client keys. Only behind a proxy that sets them.
    pub trusted_proxy: bool,
    pub redis_url: Option<String>,
    pub s3: Option<S3Config>,
    pub chrome_bin: PathBuf,
    pub tesseract_bin: PathBuf,
    pub render_timeout: Duration,
    pub prompts_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub public_url: String,
    pub frontend_url: String,
}

/// Outbound AI call limits shared by every AI-backed feature.
#[derive(Debug, Clone, Copy)]
pub struct AiLimits {
    pub max_concurrency: usize,
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` is the only
    /// production caller; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let port: u16 = parse_or(&var, "PORT", 8080)?;

        let s3 = match var("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            None => None,
        };

        let max_concurrency: usize = parse_or(&var, "AI_MAX_CONCURRENCY", 2)?;
        if max_concurrency == 0 {
            anyhow::bail!("AI_MAX_CONCURRENCY must be at least 1");
        }
        let max_attempts: u32 = parse_or(&var, "AI_MAX_ATTEMPTS", 3)?;
        if max_attempts == 0 {
            anyhow::bail!("AI_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            port,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            app_env: var("APP_ENV").unwrap_or_else(|| "development".to_string()),
            gemini_api_key: require("GEMINI_API_KEY")?,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            gemini_base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            ai: AiLimits {
                max_concurrency,
                max_attempts,
                backoff_unit: Duration::from_millis(parse_or(&var, "AI_BACKOFF_MS", 1000)?),
            },
            supabase_url: require("SUPABASE_URL")?,
            supabase_anon_key: require("SUPABASE_ANON_KEY")?,
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", 2 * 1024 * 1024)?,
            anon_analyze_limit: parse_or(&var, "ANON_ANALYZE_LIMIT", 5)?,
            anon_analyze_window: Duration::from_secs(parse_or(
                &var,
                "ANON_ANALYZE_WINDOW_SECS",
                3600,
            )?),
            trusted_proxy: parse_or(&var, "TRUSTED_PROXY", false)?,
            redis_url: var("REDIS_URL"),
            s3,
            chrome_bin: var("CHROME_BIN")
                .unwrap_or_else(|| "chromium".to_string())
                .into(),
            tesseract_bin: var("TESSERACT_BIN")
                .unwrap_or_else(|| "tesseract".to_string())
                .into(),
            render_timeout: Duration::from_secs(parse_or(&var, "RENDER_TIMEOUT_SECS", 60)?),
            prompts_dir: var("PROMPTS_DIR").map(PathBuf::from),
            templates_dir: var("TEMPLATES_DIR").map(PathBuf::from),
            public_url: var("PUBLIC_URL").unwrap_or_else(|| format!("http://localhost:{port}")),
            frontend_url: var("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/resumes"),
        ("GEMINI_API_KEY", "gemini-key"),
        ("SUPABASE_URL", "https://project.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon-key"),
    ];

    #[test]
    fn test_defaults_applied_when_only_required_vars_set() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.ai.max_concurrency, 2);
        assert_eq!(config.ai.max_attempts, 3);
        assert_eq!(config.ai.backoff_unit, Duration::from_secs(1));
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
        assert!(config.s3.is_none());
        assert!(config.redis_url.is_none());
        assert!(!config.trusted_proxy);
        assert!(!config.is_production());
        assert_eq!(config.public_url, "http://localhost:8080");
    }

    #[test]
    fn test_missing_required_var_is_an_error() {
        let err = Config::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AI_MAX_CONCURRENCY", "two"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("AI_MAX_CONCURRENCY"));
    }

    #[test]
    fn test_partial_s3_config_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("S3_BUCKET", "uploads"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_trusted_proxy_flag_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TRUSTED_PROXY", "true"));
        assert!(Config::from_lookup(lookup(&pairs)).unwrap().trusted_proxy);

        pairs.pop();
        pairs.push(("TRUSTED_PROXY", "yes"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_production_flag() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("APP_ENV", "Production"));
        assert!(Config::from_lookup(lookup(&pairs)).unwrap().is_production());
    }
}
