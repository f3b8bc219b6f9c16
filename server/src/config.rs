use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_EDIT_SESSION_LIMIT: usize = 64;
const DEFAULT_EDIT_SESSION_TTL_SECS: u64 = 30 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    /// Upper bound on concurrently open org chart edit sessions.
    pub edit_session_limit: usize,
    /// Idle time after which an open edit session may be dropped.
    pub edit_session_ttl: Duration,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cors_allowed_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let edit_session_limit = env_number("EDIT_SESSION_LIMIT", DEFAULT_EDIT_SESSION_LIMIT)?;
        let edit_session_ttl = Duration::from_secs(env_number(
            "EDIT_SESSION_TTL_SECS",
            DEFAULT_EDIT_SESSION_TTL_SECS,
        )?);

        Ok(Self {
            cors_allowed_origins,
            edit_session_limit,
            edit_session_ttl,
        })
    }
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_number(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("invalid {key} {raw:?}"))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}
