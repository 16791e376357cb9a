use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed sample spacing assumed for tab-delimited recordings (500 Hz).
pub const RAW_SAMPLE_INTERVAL_MS: f64 = 2.0;

/// On-disk encoding of a single-lead recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveFormat {
    /// Tab-delimited matrix, voltage in column 0 (amplifier units), no time column.
    RawTabDelimited,
    /// Comma-separated with header: time in seconds, voltage in millivolts.
    Csv,
}

impl WaveFormat {
    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("txt") {
            Some(WaveFormat::RawTabDelimited)
        } else if ext.eq_ignore_ascii_case("csv") {
            Some(WaveFormat::Csv)
        } else {
            None
        }
    }

    /// Parse a caller-supplied format hint.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "raw" | "txt" | "raw_tab_delimited" | "raw-tab-delimited" => {
                Some(WaveFormat::RawTabDelimited)
            }
            "csv" => Some(WaveFormat::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for WaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveFormat::RawTabDelimited => f.write_str("raw_tab_delimited"),
            WaveFormat::Csv => f.write_str("csv"),
        }
    }
}

/// A loaded, immutable time/voltage series.
///
/// The constructors guarantee `time.len() == voltage.len()` and a
/// non-decreasing `time`; nothing mutates a waveform afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    format: WaveFormat,
    time: Vec<f64>,
    voltage: Vec<f64>,
}

impl Waveform {
    /// Build a waveform on the fixed 2 ms grid from voltage samples alone.
    pub fn from_raw_voltage(voltage: Vec<f64>) -> Self {
        let time = (0..voltage.len())
            .map(|i| i as f64 * RAW_SAMPLE_INTERVAL_MS)
            .collect();
        Self {
            format: WaveFormat::RawTabDelimited,
            time,
            voltage,
        }
    }

    /// Pair timestamps (milliseconds) with voltages. Returns `None` when the
    /// lengths differ or time runs backwards.
    pub fn from_parts(format: WaveFormat, time: Vec<f64>, voltage: Vec<f64>) -> Option<Self> {
        if time.len() != voltage.len() {
            return None;
        }
        if time.iter().any(|t| t.is_nan()) || time.windows(2).any(|w| w[1] < w[0]) {
            return None;
        }
        Some(Self {
            format,
            time,
            voltage,
        })
    }

    pub fn format(&self) -> WaveFormat {
        self.format
    }

    /// Sample timestamps in milliseconds.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    pub fn sample_count(&self) -> usize {
        self.voltage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }

    /// Elapsed time between the first and last sample, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Accepted R-peaks as strictly increasing sample indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PeakIndices")]
pub struct PeakSet {
    indices: Vec<usize>,
}

#[derive(Deserialize)]
struct PeakIndices {
    indices: Vec<usize>,
}

impl From<PeakIndices> for PeakSet {
    fn from(raw: PeakIndices) -> Self {
        PeakSet::from_indices(raw.indices)
    }
}

impl PeakSet {
    /// Sorts and deduplicates, so the set is always strictly increasing.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
