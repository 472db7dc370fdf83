// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editor configuration.
//!
//! Loads and saves the TOML settings file controlling per-instrument setup
//! (string counts, tunings) and surface behavior (lane height, cursor blink).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::music::{tuning_offsets, Instrument};

/// Root editor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    /// Height of one string lane in pixels
    #[serde(default = "default_lane_height")]
    pub lane_height_px: f64,
    /// Cursor blink interval in milliseconds; the render layer pairs this
    /// with `SelectionController::blink_restarted`
    #[serde(default = "default_blink_interval")]
    pub blink_interval_ms: u64,
    /// Debounce window for beats-file change detection, in milliseconds
    #[serde(default = "default_watch_debounce")]
    pub watch_debounce_ms: u64,
    /// Per-instrument setup, keyed by instrument key
    #[serde(default)]
    pub instruments: HashMap<String, InstrumentConfig>,
}

fn default_lane_height() -> f64 {
    40.0
}
fn default_blink_interval() -> u64 {
    500
}
fn default_watch_debounce() -> u64 {
    500
}

impl Default for EditorConfig {
    fn default() -> Self {
        let instruments = Instrument::ALL
            .iter()
            .map(|&inst| (inst.key().to_string(), InstrumentConfig::for_instrument(inst)))
            .collect();
        Self {
            lane_height_px: default_lane_height(),
            blink_interval_ms: default_blink_interval(),
            watch_debounce_ms: default_watch_debounce(),
            instruments,
        }
    }
}

impl EditorConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = self.to_toml()?;
        fs::write(path.as_ref(), text)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Setup for an instrument, falling back to built-in defaults
    pub fn instrument(&self, inst: Instrument) -> InstrumentConfig {
        self.instruments
            .get(inst.key())
            .cloned()
            .unwrap_or_else(|| InstrumentConfig::for_instrument(inst))
    }

    fn validate(&self) -> Result<()> {
        if self.lane_height_px <= 0.0 {
            bail!("lane_height_px must be positive, got {}", self.lane_height_px);
        }
        for (key, inst) in &self.instruments {
            if Instrument::from_key(key).is_none() {
                bail!("unknown instrument key: {:?}", key);
            }
            if inst.strings == 0 {
                bail!("instrument {:?} has zero strings", key);
            }
            if tuning_offsets(&inst.tuning).is_none() {
                bail!("unknown tuning {:?} for instrument {:?}", inst.tuning, key);
            }
        }
        Ok(())
    }
}

/// Per-instrument setup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentConfig {
    /// Display title
    pub title: String,
    /// Number of strings
    #[serde(default = "default_strings")]
    pub strings: usize,
    /// Named tuning, resolved via the tuning table
    #[serde(default = "default_tuning")]
    pub tuning: String,
}

fn default_strings() -> usize {
    6
}
fn default_tuning() -> String {
    "E_Standard".to_string()
}

impl InstrumentConfig {
    /// Built-in setup for an instrument
    pub fn for_instrument(inst: Instrument) -> Self {
        Self {
            title: inst.title().to_string(),
            strings: inst.string_count(),
            tuning: default_tuning(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_covers_all_instruments() {
        let config = EditorConfig::default();
        for inst in Instrument::ALL {
            let setup = config.instrument(inst);
            assert_eq!(setup.strings, inst.string_count());
            assert_eq!(setup.tuning, "E_Standard");
        }
    }

    #[test]
    fn test_from_toml_with_overrides() {
        let text = r#"
            lane_height_px = 32.0

            [instruments.leadGuitar]
            title = "Lead"
            strings = 7
            tuning = "Drop_D"
        "#;
        let config = EditorConfig::from_toml(text).unwrap();
        assert_eq!(config.lane_height_px, 32.0);
        assert_eq!(config.blink_interval_ms, 500);

        let lead = config.instrument(Instrument::LeadGuitar);
        assert_eq!(lead.strings, 7);
        assert_eq!(lead.tuning, "Drop_D");
        // Missing instruments fall back to built-ins
        assert_eq!(config.instrument(Instrument::Ukulele).strings, 4);
    }

    #[test]
    fn test_rejects_unknown_tuning() {
        let text = r#"
            [instruments.bassGuitar]
            title = "Bass"
            tuning = "H_Standard"
        "#;
        assert!(EditorConfig::from_toml(text).is_err());
    }

    #[test]
    fn test_rejects_unknown_instrument_key() {
        let text = r#"
            [instruments.banjo]
            title = "Banjo"
        "#;
        assert!(EditorConfig::from_toml(text).is_err());
    }

    #[test]
    fn test_rejects_bad_lane_height() {
        assert!(EditorConfig::from_toml("lane_height_px = 0.0").is_err());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("editor.toml");

        let config = EditorConfig::default();
        config.save(&path).unwrap();

        let loaded = EditorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
