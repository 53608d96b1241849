use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::RetryPolicy;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub pipeline: PipelineConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the search backend; `/search` is appended
    pub base_url: String,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Quiet period after a submit before the fetch starts
    pub debounce: Duration,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub page_size: usize,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub dir: PathBuf,
}

impl ApiConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            base_delay: self.retry_delay,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout: Duration::from_secs(5),
                retries: 0,
                retry_delay: Duration::from_millis(250),
            },
            pipeline: PipelineConfig {
                debounce: Duration::from_millis(250),
            },
            ui: UiConfig { page_size: 10 },
            log: LogConfig {
                dir: default_log_dir(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            api: ApiConfig {
                base_url: env::var("MEDISIA_API_URL").unwrap_or(defaults.api.base_url),
                timeout: timeout_from_secs(parse_var("MEDISIA_TIMEOUT_SECS", 5)?)
                    .context("MEDISIA_TIMEOUT_SECS")?,
                retries: parse_var("MEDISIA_RETRIES", 0)?,
                retry_delay: Duration::from_millis(parse_var("MEDISIA_RETRY_DELAY_MS", 250)?),
            },
            pipeline: PipelineConfig {
                debounce: Duration::from_millis(parse_var("MEDISIA_DEBOUNCE_MS", 250)?),
            },
            ui: UiConfig {
                page_size: parse_var("MEDISIA_PAGE_SIZE", 10)?,
            },
            log: LogConfig {
                dir: env::var("MEDISIA_LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.log.dir),
            },
        })
    }
}

/// Request timeout from whole seconds. Zero is rejected: every request would
/// time out before it is sent.
pub fn timeout_from_secs(secs: u64) -> Result<Duration> {
    anyhow::ensure!(secs > 0, "timeout must be at least 1 second, got {}", secs);
    Ok(Duration::from_secs(secs))
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medisia")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.pipeline.debounce, Duration::from_millis(250));
        assert_eq!(config.ui.page_size, 10);
        assert_eq!(config.api.retry_policy(), RetryPolicy {
            retries: 0,
            base_delay: Duration::from_millis(250),
        });
    }

    #[test]
    fn test_parse_var_reports_bad_values() {
        env::set_var("MEDISIA_TEST_PAGE_SIZE", "ten");
        let err = parse_var::<usize>("MEDISIA_TEST_PAGE_SIZE", 10).unwrap_err();
        assert!(err.to_string().contains("MEDISIA_TEST_PAGE_SIZE"));

        env::set_var("MEDISIA_TEST_PAGE_SIZE", " 25 ");
        assert_eq!(parse_var::<usize>("MEDISIA_TEST_PAGE_SIZE", 10).unwrap(), 25);
        env::remove_var("MEDISIA_TEST_PAGE_SIZE");

        assert_eq!(parse_var::<u64>("MEDISIA_TEST_UNSET", 7).unwrap(), 7);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert_eq!(timeout_from_secs(3).unwrap(), Duration::from_secs(3));
        assert!(timeout_from_secs(0).is_err());

        env::set_var("MEDISIA_TIMEOUT_SECS", "0");
        let err = Config::from_env().unwrap_err();
        env::remove_var("MEDISIA_TIMEOUT_SECS");
        assert!(format!("{:#}", err).contains("MEDISIA_TIMEOUT_SECS"));
    }
}
