use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::narration::domain::speed_category::SpeedThresholds;
use crate::playback::playback_sequencer::SequencerParams;
use crate::shared::constants::{
    ASSUMED_FPS, INTER_MESSAGE_DELAY_MS, LOCAL_PHRASES_PER_CYCLE, MATCH_DISTANCE,
    MIN_SPEED_SAMPLES, REMOTE_TIMEOUT_MS, SELECTION_HISTORY, SPEECH_MS_PER_WORD, SPEED_HI_ABOVE,
    SPEED_LO_BELOW, SPEED_WINDOW, SPEED_WINDOW_RANGE, STALE_FRAMES,
};
use crate::tracking::infrastructure::centroid_tracker::{MatchStrategy, TrackerParams};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for one narration session. Every field is optional in the
/// config file; missing fields take the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub match_distance: f64,
    pub stale_frames: u64,
    pub speed_window: usize,
    pub min_speed_samples: usize,
    pub assumed_fps: f64,
    pub match_strategy: MatchStrategy,
    pub speed_lo_below: f64,
    pub speed_hi_above: f64,
    pub history_size: usize,
    pub local_phrases_per_cycle: usize,
    pub inter_message_delay_ms: u64,
    pub remote_url: Option<String>,
    pub remote_timeout_ms: u64,
    pub speech_ms_per_word: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            match_distance: MATCH_DISTANCE,
            stale_frames: STALE_FRAMES,
            speed_window: SPEED_WINDOW,
            min_speed_samples: MIN_SPEED_SAMPLES,
            assumed_fps: ASSUMED_FPS,
            match_strategy: MatchStrategy::Sequential,
            speed_lo_below: SPEED_LO_BELOW,
            speed_hi_above: SPEED_HI_ABOVE,
            history_size: SELECTION_HISTORY,
            local_phrases_per_cycle: LOCAL_PHRASES_PER_CYCLE,
            inter_message_delay_ms: INTER_MESSAGE_DELAY_MS,
            remote_url: None,
            remote_timeout_ms: REMOTE_TIMEOUT_MS,
            speech_ms_per_word: SPEECH_MS_PER_WORD,
        }
    }
}

impl SessionConfig {
    /// `<config dir>/FaceNarrator/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceNarrator").join("config.json"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.match_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "match_distance must be positive, got {}",
                self.match_distance
            )));
        }
        if !SPEED_WINDOW_RANGE.contains(&self.speed_window) {
            return Err(ConfigError::Invalid(format!(
                "speed_window must be between {} and {}, got {}",
                SPEED_WINDOW_RANGE.start(),
                SPEED_WINDOW_RANGE.end(),
                self.speed_window
            )));
        }
        if self.min_speed_samples == 0 || self.min_speed_samples > self.speed_window {
            return Err(ConfigError::Invalid(format!(
                "min_speed_samples must be between 1 and speed_window ({}), got {}",
                self.speed_window, self.min_speed_samples
            )));
        }
        if !(self.assumed_fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "assumed_fps must be positive, got {}",
                self.assumed_fps
            )));
        }
        if !(self.speed_lo_below <= self.speed_hi_above) {
            return Err(ConfigError::Invalid(format!(
                "speed_lo_below ({}) must not exceed speed_hi_above ({})",
                self.speed_lo_below, self.speed_hi_above
            )));
        }
        if let Some(url) = &self.remote_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "remote_url must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    pub fn tracker_params(&self) -> TrackerParams {
        TrackerParams {
            match_distance: self.match_distance,
            stale_frames: self.stale_frames,
            speed_window: self.speed_window,
            min_samples: self.min_speed_samples,
            assumed_fps: self.assumed_fps,
            strategy: self.match_strategy,
        }
    }

    pub fn speed_thresholds(&self) -> SpeedThresholds {
        SpeedThresholds {
            lo_below: self.speed_lo_below,
            hi_above: self.speed_hi_above,
        }
    }

    pub fn sequencer_params(&self) -> SequencerParams {
        SequencerParams {
            local_phrases_per_cycle: self.local_phrases_per_cycle,
            inter_message_delay: Duration::from_millis(self.inter_message_delay_ms),
        }
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn speech_per_word(&self) -> Duration {
        Duration::from_millis(self.speech_ms_per_word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.match_distance, 100.0);
        assert_eq!(config.stale_frames, 30);
        assert_eq!(config.local_phrases_per_cycle, 3);
        assert_eq!(config.sequencer_params().inter_message_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{"speed_window": 20, "match_strategy": "global_nearest", "remote_url": "http://localhost:8080/phrases"}"#,
        )
        .unwrap();

        let config = SessionConfig::load(Some(&path)).unwrap();
        assert_eq!(config.speed_window, 20);
        assert_eq!(config.match_strategy, MatchStrategy::GlobalNearest);
        assert_eq!(config.stale_frames, STALE_FRAMES);
        assert_eq!(config.tracker_params().speed_window, 20);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = SessionConfig::load(Some(&tmp.path().join("absent.json")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ speed_window: }").unwrap();
        assert!(matches!(
            SessionConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[rstest]
    #[case::window_too_small(SessionConfig { speed_window: 4, ..SessionConfig::default() })]
    #[case::window_too_large(SessionConfig { speed_window: 31, ..SessionConfig::default() })]
    #[case::min_samples_zero(SessionConfig { min_speed_samples: 0, ..SessionConfig::default() })]
    #[case::min_samples_exceed_window(SessionConfig { speed_window: 5, min_speed_samples: 6, ..SessionConfig::default() })]
    #[case::zero_distance(SessionConfig { match_distance: 0.0, ..SessionConfig::default() })]
    #[case::nan_fps(SessionConfig { assumed_fps: f64::NAN, ..SessionConfig::default() })]
    #[case::inverted_thresholds(SessionConfig { speed_lo_below: 2000.0, ..SessionConfig::default() })]
    #[case::bad_url(SessionConfig { remote_url: Some("ftp://x".to_string()), ..SessionConfig::default() })]
    fn test_validate_rejects(#[case] config: SessionConfig) {
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_path_mentions_app() {
        if let Some(path) = SessionConfig::default_path() {
            assert!(path.to_string_lossy().contains("FaceNarrator"));
        }
    }
}
