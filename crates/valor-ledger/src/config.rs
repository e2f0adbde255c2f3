//! Ledger configuration

use crate::error::ConfigError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Longest accepted rollback window (100 years)
const MAX_WINDOW_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Runtime settings of the ledger
///
/// ```
/// use valor_ledger::LedgerConfig;
///
/// let config = LedgerConfig::from_ron_str("(rollback_window_secs: 600)").unwrap();
/// assert_eq!(config.rollback_window().num_minutes(), 10);
/// assert_eq!(config.max_commit_attempts(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// How long after an allocate/learn/upgrade it may be rolled back
    rollback_window_secs: u64,
    /// How many times an operation is re-run after losing a commit race
    max_commit_attempts: u32,
}

impl LedgerConfig {
    /// Parse a RON configuration, filling in defaults for missing fields
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    pub fn with_rollback_window_secs(mut self, secs: u64) -> Self {
        self.rollback_window_secs = secs.min(MAX_WINDOW_SECS);
        self
    }

    /// The attempt count is clamped to at least 1
    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn rollback_window(&self) -> Duration {
        Duration::seconds(self.rollback_window_secs.min(MAX_WINDOW_SECS) as i64)
    }

    pub fn max_commit_attempts(&self) -> u32 {
        self.max_commit_attempts
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_commit_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_commit_attempts must be at least 1".to_string(),
            ));
        }
        if self.rollback_window_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::Invalid(format!(
                "rollback_window_secs {} exceeds {}",
                self.rollback_window_secs, MAX_WINDOW_SECS
            )));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    /// One hour rollback window
    fn default() -> Self {
        Self {
            rollback_window_secs: 60 * 60,
            max_commit_attempts: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.rollback_window(), Duration::hours(1));
        assert_eq!(config.max_commit_attempts(), 16);
        assert_eq!(LedgerConfig::from_ron_str("()").unwrap(), config);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = LedgerConfig::from_ron_str("(max_commit_attempts: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(
            LedgerConfig::default()
                .with_max_commit_attempts(0)
                .max_commit_attempts(),
            1
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.ron");
        fs::write(&path, "(rollback_window_secs: 120, max_commit_attempts: 4)").unwrap();

        let config = LedgerConfig::load(&path).unwrap();
        assert_eq!(config.rollback_window(), Duration::minutes(2));
        assert_eq!(config.max_commit_attempts(), 4);

        let err = LedgerConfig::load(dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_oversized_window_rejected() {
        let err = LedgerConfig::from_ron_str("(rollback_window_secs: 18446744073709551615)")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
