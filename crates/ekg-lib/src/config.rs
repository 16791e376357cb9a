use crate::detectors::ecg::DetectionProfile;
use crate::plot::DEFAULT_WINDOW_LEN;
use crate::signal::WaveFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-format overrides of the detector defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub min_distance_ms: Option<f64>,
}

impl ProfileOverrides {
    pub fn apply(&self, mut profile: DetectionProfile) -> DetectionProfile {
        if let Some(threshold) = self.threshold {
            profile.threshold = threshold;
        }
        if let Some(min_distance_ms) = self.min_distance_ms {
            profile.min_distance_ms = min_distance_ms;
        }
        profile
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_window_len")]
    pub window_len: usize,
}

fn default_window_len() -> usize {
    DEFAULT_WINDOW_LEN
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_len: DEFAULT_WINDOW_LEN,
        }
    }
}

/// Optional TOML settings for an analysis run.
///
/// ```toml
/// [raw]
/// threshold = 350.0
///
/// [csv]
/// threshold = 0.25
/// min_distance_ms = 300.0
///
/// [display]
/// window_len = 2500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub raw: ProfileOverrides,
    #[serde(default)]
    pub csv: ProfileOverrides,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Built-in defaults for `format` with this config's overrides applied.
    pub fn profile_for(&self, format: WaveFormat) -> DetectionProfile {
        let overrides = match format {
            WaveFormat::RawTabDelimited => &self.raw,
            WaveFormat::Csv => &self.csv,
        };
        overrides.apply(DetectionProfile::for_format(format))
    }
}
