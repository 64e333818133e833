// config.rs - Client configuration loaded from the environment
use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SUMMARIZE_TIMEOUT_SECS: u64 = 240;
const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_LOADING_TICK_MS: u64 = 300;
const DEFAULT_STATE_DIR: &str = ".younote";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the YouNote server, without a trailing slash
    pub base_url: String,
    /// Hard cap on a single summarize request
    pub summarize_timeout: Duration,
    pub debounce: Duration,
    /// Interval between loading ellipsis frames
    pub loading_tick: Duration,
    pub state_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://127.0.0.1:{}", DEFAULT_PORT),
            summarize_timeout: Duration::from_secs(DEFAULT_SUMMARIZE_TIMEOUT_SECS),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            loading_tick: Duration::from_millis(DEFAULT_LOADING_TICK_MS),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl ClientConfig {
    /// Read configuration from process environment variables.
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let base_url = lookup("YOUNOTE_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", port));

        let timeout_secs: u64 = parse_var(&lookup, "YOUNOTE_SUMMARIZE_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_SUMMARIZE_TIMEOUT_SECS);
        let debounce_ms: u64 = parse_var(&lookup, "YOUNOTE_DEBOUNCE_MS")?.unwrap_or(DEFAULT_DEBOUNCE_MS);
        let tick_ms: u64 = parse_var(&lookup, "YOUNOTE_LOADING_TICK_MS")?.unwrap_or(DEFAULT_LOADING_TICK_MS);
        if tick_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "YOUNOTE_LOADING_TICK_MS",
                value: "0".to_string(),
            });
        }

        let state_dir = lookup("YOUNOTE_STATE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        Ok(Self {
            base_url,
            summarize_timeout: Duration::from_secs(timeout_secs),
            debounce: Duration::from_millis(debounce_ms),
            loading_tick: Duration::from_millis(tick_ms),
            state_dir,
        })
    }

    /// Persistent store holding the theme preference
    pub fn local_store_path(&self) -> PathBuf {
        self.state_dir.join("local.json")
    }

    /// Store holding the last summary for reload recovery
    pub fn session_store_path(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        _ => Ok(None),
    }
}
