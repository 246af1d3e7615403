//! Engine configuration.
//!
//! [`BuffSystemConfig`] collects every tuning knob of the engines. It is
//! deserializable from declarative data; out-of-range values are clamped
//! into their valid range rather than rejected:
//!
//! | Knob                         | Range      | Default |
//! |------------------------------|------------|---------|
//! | `transmission.max_per_frame` | `>= 1`     | 10      |
//! | `snapshot.max_cache_size`    | `>= 1`     | 1000    |
//! | `snapshot.expire_time`       | `>= 0` s   | 300     |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of transmission requests processed per drain.
pub const DEFAULT_MAX_PER_FRAME: usize = 10;

/// Default snapshot cache bound.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

/// Default snapshot time-to-live in seconds.
pub const DEFAULT_EXPIRE_TIME: f64 = 300.0;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Transmission Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    /// Requests processed per drain, at least 1.
    pub max_per_frame: usize,
    /// Seed of the probability gate.
    pub seed: u64,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            max_per_frame: DEFAULT_MAX_PER_FRAME,
            seed: 0,
        }
    }
}

/// Snapshot Cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Cache bound, at least 1.
    pub max_cache_size: usize,
    /// Sweep expired snapshots on every tick.
    pub auto_cleanup: bool,
    /// Snapshot time-to-live in seconds, at least 0.
    pub expire_time: f64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            auto_cleanup: true,
            expire_time: DEFAULT_EXPIRE_TIME,
        }
    }
}

/// Top-level configuration for a [`BuffSystem`](crate::system::BuffSystem).
///
/// # Example
///
/// ```
/// use buffwright::config::BuffSystemConfig;
///
/// let config = BuffSystemConfig::from_json(
///     r#"{ "debug_logging": true, "transmission": { "max_per_frame": 0 } }"#,
/// )
/// .unwrap();
///
/// assert!(config.debug_logging);
/// assert_eq!(config.transmission.max_per_frame, 1);
/// assert_eq!(config.snapshot.max_cache_size, 1000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffSystemConfig {
    /// Emit `debug!` traces for engine decisions.
    pub debug_logging: bool,
    /// Transmission Engine settings.
    pub transmission: TransmissionConfig,
    /// Snapshot Cache settings.
    pub snapshot: SnapshotConfig,
}

impl BuffSystemConfig {
    /// Parses a JSON document and clamps every knob into range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Returns a copy with every knob clamped into its valid range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.transmission.max_per_frame = self.transmission.max_per_frame.max(1);
        self.snapshot.max_cache_size = self.snapshot.max_cache_size.max(1);
        self.snapshot.expire_time = self.snapshot.expire_time.max(0.0);
        self
    }

    /// Sets the transmission budget (clamped to at least 1).
    #[must_use]
    pub fn with_max_per_frame(mut self, n: usize) -> Self {
        self.transmission.max_per_frame = n.max(1);
        self
    }

    /// Sets the transmission seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.transmission.seed = seed;
        self
    }

    /// Sets the snapshot cache bound (clamped to at least 1).
    #[must_use]
    pub fn with_max_cache_size(mut self, n: usize) -> Self {
        self.snapshot.max_cache_size = n.max(1);
        self
    }

    /// Enables debug tracing.
    #[must_use]
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuffSystemConfig::default();
        assert!(!config.debug_logging);
        assert_eq!(config.transmission.max_per_frame, DEFAULT_MAX_PER_FRAME);
        assert_eq!(config.snapshot.max_cache_size, DEFAULT_MAX_CACHE_SIZE);
        assert!(config.snapshot.auto_cleanup);
        assert!((config.snapshot.expire_time - DEFAULT_EXPIRE_TIME).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = BuffSystemConfig::from_json("{}").unwrap();
        assert_eq!(config, BuffSystemConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let json = r#"{
            "transmission": { "max_per_frame": 0 },
            "snapshot": { "max_cache_size": 0, "expire_time": -5.0, "auto_cleanup": false }
        }"#;
        let config = BuffSystemConfig::from_json(json).unwrap();

        assert_eq!(config.transmission.max_per_frame, 1);
        assert_eq!(config.snapshot.max_cache_size, 1);
        assert_eq!(config.snapshot.expire_time, 0.0);
        assert!(!config.snapshot.auto_cleanup);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = BuffSystemConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn builders_clamp() {
        let config = BuffSystemConfig::default()
            .with_max_per_frame(0)
            .with_max_cache_size(0)
            .with_seed(9)
            .with_debug_logging(true);

        assert_eq!(config.transmission.max_per_frame, 1);
        assert_eq!(config.snapshot.max_cache_size, 1);
        assert_eq!(config.transmission.seed, 9);
        assert!(config.debug_logging);
    }
}
