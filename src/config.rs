//! Engine configuration.
//!
//! Markers are fixed per deployment, not per message. Values come from
//! [`EngineConfig::default`] and may be overridden from the environment
//! with [`EngineConfig::from_env`].

use crate::error::ConfigError;
use std::time::Duration;

/// Environment variable for the open reasoning marker.
pub const ENV_THINK_OPEN: &str = "DOCAI_THINK_OPEN";
/// Environment variable for the close reasoning marker.
pub const ENV_THINK_CLOSE: &str = "DOCAI_THINK_CLOSE";
/// Environment variable for the pacer interval in milliseconds.
pub const ENV_PACE_INTERVAL_MS: &str = "DOCAI_PACE_INTERVAL_MS";
/// Environment variable for the graphemes revealed per pacer tick.
pub const ENV_PACE_GRAPHEMES: &str = "DOCAI_PACE_GRAPHEMES";
/// Environment variable for the auto-follow threshold in rows.
pub const ENV_SCROLL_THRESHOLD: &str = "DOCAI_SCROLL_THRESHOLD";

/// Inline markers delimiting a reasoning span inside answer text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerConfig {
    /// Marker that opens a reasoning span.
    pub open: String,
    /// Marker that closes a reasoning span.
    pub close: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            open: "<think>".to_string(),
            close: "</think>".to_string(),
        }
    }
}

/// Cadence of the answer pacer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    /// Time between two reveals.
    pub interval: Duration,
    /// Grapheme clusters revealed per reveal.
    pub graphemes_per_tick: usize,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(20),
            graphemes_per_tick: 1,
        }
    }
}

/// Configuration for the [`Engine`](crate::Engine) and its parts.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reasoning markers.
    pub markers: MarkerConfig,
    /// Pacer cadence.
    pub pacing: PacingConfig,
    /// Distance from the bottom, in rows, under which the view follows output.
    pub scroll_threshold_rows: usize,
    /// Maximum rows a transcript view keeps.
    pub max_scrollback: usize,
    /// Capacity of the source → loop event channel.
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            markers: MarkerConfig::default(),
            pacing: PacingConfig::default(),
            scroll_threshold_rows: 2,
            max_scrollback: 10_000,
            channel_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `DOCAI_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// `lookup` maps a variable name to its raw value, if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(open) = lookup(ENV_THINK_OPEN) {
            config.markers.open = open;
        }
        if let Some(close) = lookup(ENV_THINK_CLOSE) {
            config.markers.close = close;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_PACE_INTERVAL_MS)? {
            config.pacing.interval = Duration::from_millis(ms);
        }
        if let Some(graphemes) = parse_var(&lookup, ENV_PACE_GRAPHEMES)? {
            config.pacing.graphemes_per_tick = graphemes;
        }
        if let Some(rows) = parse_var(&lookup, ENV_SCROLL_THRESHOLD)? {
            config.scroll_threshold_rows = rows;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markers.open.is_empty() {
            return Err(ConfigError::EmptyMarker { which: "open" });
        }
        if self.markers.close.is_empty() {
            return Err(ConfigError::EmptyMarker { which: "close" });
        }
        if self.pacing.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.pacing.graphemes_per_tick == 0 {
            return Err(ConfigError::ZeroGraphemes);
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.markers.open, "<think>");
        assert_eq!(config.markers.close, "</think>");
        assert_eq!(config.pacing.graphemes_per_tick, 1);
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_THINK_OPEN, "<reasoning>"),
            (ENV_THINK_CLOSE, "</reasoning>"),
            (ENV_PACE_INTERVAL_MS, " 35 "),
            (ENV_PACE_GRAPHEMES, "3"),
            (ENV_SCROLL_THRESHOLD, "5"),
        ]))
        .unwrap();

        assert_eq!(config.markers.open, "<reasoning>");
        assert_eq!(config.markers.close, "</reasoning>");
        assert_eq!(config.pacing.interval, Duration::from_millis(35));
        assert_eq!(config.pacing.graphemes_per_tick, 3);
        assert_eq!(config.scroll_threshold_rows, 5);
    }

    #[test]
    fn test_unparseable_env_is_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_PACE_GRAPHEMES, "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { var: ENV_PACE_GRAPHEMES, .. }
        ));
    }

    #[test]
    fn test_empty_marker_is_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_THINK_CLOSE, "")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMarker { which: "close" }));
    }

    #[test]
    fn test_zero_pacing_is_rejected() {
        let mut config = EngineConfig::default();
        config.pacing.interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));

        let mut config = EngineConfig::default();
        config.pacing.graphemes_per_tick = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroGraphemes)));
    }
}
