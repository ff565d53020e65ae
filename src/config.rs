use thiserror::Error;

use crate::kernel::time::{BoundsError, IntervalBounds};

pub const DEFAULT_SPAN_NAME: &str = "span-generator";
pub const DEFAULT_SPAN_TYPE: &str = "custom";
pub const DEFAULT_SPAN_INTERVAL_MIN_MS: u64 = 1000;
pub const DEFAULT_SPAN_INTERVAL_MAX_MS: u64 = 10000;
pub const DEFAULT_ERROR_SPAN_INTERVAL_MIN_MS: u64 = 1000;
pub const DEFAULT_ERROR_SPAN_INTERVAL_MAX_MS: u64 = 30000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {which} interval: {source}")]
    Bounds {
        which: &'static str,
        #[source]
        source: BoundsError,
    },
}

/// Startup configuration. Read once; not reloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub span_name: String,
    pub span_type: String,
    pub span_interval_min_ms: u64,
    pub span_interval_max_ms: u64,
    pub error_span_interval_min_ms: u64,
    pub error_span_interval_max_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            span_name: DEFAULT_SPAN_NAME.to_string(),
            span_type: DEFAULT_SPAN_TYPE.to_string(),
            span_interval_min_ms: DEFAULT_SPAN_INTERVAL_MIN_MS,
            span_interval_max_ms: DEFAULT_SPAN_INTERVAL_MAX_MS,
            error_span_interval_min_ms: DEFAULT_ERROR_SPAN_INTERVAL_MIN_MS,
            error_span_interval_max_ms: DEFAULT_ERROR_SPAN_INTERVAL_MAX_MS,
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset, empty or unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, fallback: &str| match lookup(key) {
            Some(v) if !v.is_empty() => v,
            _ => fallback.to_string(),
        };
        let millis = |key: &str, fallback: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(fallback)
        };

        Self {
            span_name: string("SPAN_NAME", DEFAULT_SPAN_NAME),
            span_type: string("SPAN_TYPE", DEFAULT_SPAN_TYPE),
            span_interval_min_ms: millis("SPAN_INTERVAL_MIN", DEFAULT_SPAN_INTERVAL_MIN_MS),
            span_interval_max_ms: millis("SPAN_INTERVAL_MAX", DEFAULT_SPAN_INTERVAL_MAX_MS),
            error_span_interval_min_ms: millis(
                "ERROR_SPAN_INTERVAL_MIN",
                DEFAULT_ERROR_SPAN_INTERVAL_MIN_MS,
            ),
            error_span_interval_max_ms: millis(
                "ERROR_SPAN_INTERVAL_MAX",
                DEFAULT_ERROR_SPAN_INTERVAL_MAX_MS,
            ),
        }
    }

    pub fn normal_bounds(&self) -> Result<IntervalBounds, ConfigError> {
        IntervalBounds::from_millis(self.span_interval_min_ms, self.span_interval_max_ms)
            .map_err(|source| ConfigError::Bounds { which: "span", source })
    }

    pub fn error_bounds(&self) -> Result<IntervalBounds, ConfigError> {
        IntervalBounds::from_millis(
            self.error_span_interval_min_ms,
            self.error_span_interval_max_ms,
        )
        .map_err(|source| ConfigError::Bounds { which: "error span", source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = GeneratorConfig::from_lookup(|_| None);
        assert_eq!(cfg, GeneratorConfig::default());
        assert_eq!(cfg.span_name, "span-generator");
        assert_eq!(cfg.span_type, "custom");

        let normal = cfg.normal_bounds().unwrap();
        assert_eq!(normal.min(), Duration::from_millis(1000));
        assert_eq!(normal.max(), Duration::from_millis(10000));
        let error = cfg.error_bounds().unwrap();
        assert_eq!(error.max(), Duration::from_millis(30000));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = GeneratorConfig::from_lookup(lookup_from(&[
            ("SPAN_NAME", "checkout"),
            ("SPAN_TYPE", "web"),
            ("SPAN_INTERVAL_MIN", "50"),
            ("SPAN_INTERVAL_MAX", " 75 "),
            ("ERROR_SPAN_INTERVAL_MIN", "500"),
            ("ERROR_SPAN_INTERVAL_MAX", "900"),
        ]));

        assert_eq!(cfg.span_name, "checkout");
        assert_eq!(cfg.span_type, "web");
        assert_eq!(cfg.span_interval_min_ms, 50);
        assert_eq!(cfg.span_interval_max_ms, 75);
        assert_eq!(cfg.error_span_interval_min_ms, 500);
        assert_eq!(cfg.error_span_interval_max_ms, 900);
    }

    #[test]
    fn empty_and_garbage_values_fall_back() {
        let cfg = GeneratorConfig::from_lookup(lookup_from(&[
            ("SPAN_NAME", ""),
            ("SPAN_INTERVAL_MIN", "soon"),
            ("SPAN_INTERVAL_MAX", "-5"),
        ]));

        assert_eq!(cfg.span_name, DEFAULT_SPAN_NAME);
        assert_eq!(cfg.span_interval_min_ms, DEFAULT_SPAN_INTERVAL_MIN_MS);
        assert_eq!(cfg.span_interval_max_ms, DEFAULT_SPAN_INTERVAL_MAX_MS);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let cfg = GeneratorConfig::from_lookup(lookup_from(&[
            ("ERROR_SPAN_INTERVAL_MIN", "5000"),
            ("ERROR_SPAN_INTERVAL_MAX", "100"),
        ]));

        assert!(cfg.normal_bounds().is_ok());
        let err = cfg.error_bounds().unwrap_err();
        assert!(err.to_string().starts_with("invalid error span interval"));
    }
}
