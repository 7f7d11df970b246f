use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default number of concurrent import workers.
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Bulk import configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// JSON file holding the record array; stdin when `None`.
    pub input_path: Option<PathBuf>,
    /// Worker count for the batch. `0` means one worker per record.
    pub concurrency: usize,
    /// Deadline for the whole batch, if any.
    pub timeout: Option<Duration>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }
}

impl ImportConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `IMPORT_INPUT_PATH`   | stdin   |
    /// | `IMPORT_CONCURRENCY`  | `5`     |
    /// | `IMPORT_TIMEOUT_SECS` | none    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let input_path = lookup("IMPORT_INPUT_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let concurrency = match lookup("IMPORT_CONCURRENCY") {
            Some(value) => parse_number("IMPORT_CONCURRENCY", &value)?,
            None => DEFAULT_CONCURRENCY,
        };

        let timeout = lookup("IMPORT_TIMEOUT_SECS")
            .map(|value| parse_number::<u64>("IMPORT_TIMEOUT_SECS", &value))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            input_path,
            concurrency,
            timeout,
        })
    }
}

fn parse_number<N: FromStr>(var: &'static str, value: &str) -> Result<N, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })
}
