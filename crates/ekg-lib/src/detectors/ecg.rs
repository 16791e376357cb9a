use crate::signal::{PeakSet, WaveFormat, Waveform};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Default threshold for tab-delimited recordings (amplifier units).
pub const RAW_DEFAULT_THRESHOLD: f64 = 350.0;
/// Default threshold for CSV recordings (millivolts).
pub const CSV_DEFAULT_THRESHOLD: f64 = 0.3;
/// Minimum spacing between accepted beats; caps detectable rate at 150 bpm.
pub const DEFAULT_MIN_DISTANCE_MS: f64 = 400.0;

/// How a candidate compares against its two neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborComparison {
    /// `v[i] >= v[i-1] && v[i] >= v[i+1]`; plateaus count.
    Inclusive,
    /// `v[i] > v[i-1] && v[i] > v[i+1]`; ties are not peaks.
    Strict,
}

impl NeighborComparison {
    fn is_local_max(self, prev: f64, value: f64, next: f64) -> bool {
        match self {
            NeighborComparison::Inclusive => value >= prev && value >= next,
            NeighborComparison::Strict => value > prev && value > next,
        }
    }
}

/// What the refractory distance is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBasis {
    /// Compare timestamps directly.
    TimeMs,
    /// Convert the distance to samples using the median sample interval.
    SampleCount,
}

/// Strategy record for the peak detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionProfile {
    /// Candidates must be strictly above this voltage.
    pub threshold: f64,
    /// Refractory distance between accepted peaks (milliseconds).
    pub min_distance_ms: f64,
    pub neighbor: NeighborComparison,
    pub distance_basis: DistanceBasis,
}

impl DetectionProfile {
    /// Built-in defaults for a recording format. Thresholds are in the
    /// format's own voltage units and must not be reused across formats.
    pub fn for_format(format: WaveFormat) -> Self {
        match format {
            WaveFormat::RawTabDelimited => Self {
                threshold: RAW_DEFAULT_THRESHOLD,
                min_distance_ms: DEFAULT_MIN_DISTANCE_MS,
                neighbor: NeighborComparison::Inclusive,
                distance_basis: DistanceBasis::TimeMs,
            },
            WaveFormat::Csv => Self {
                threshold: CSV_DEFAULT_THRESHOLD,
                min_distance_ms: DEFAULT_MIN_DISTANCE_MS,
                neighbor: NeighborComparison::Strict,
                distance_basis: DistanceBasis::SampleCount,
            },
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_min_distance_ms(mut self, min_distance_ms: f64) -> Self {
        self.min_distance_ms = min_distance_ms;
        self
    }
}

/// Detect peaks using the waveform format's profile with the given threshold
/// and refractory distance.
pub fn detect_peaks(waveform: &Waveform, threshold: f64, min_distance_ms: f64) -> PeakSet {
    let profile = DetectionProfile::for_format(waveform.format())
        .with_threshold(threshold)
        .with_min_distance_ms(min_distance_ms);
    detect_peaks_with_profile(waveform, &profile)
}

/// Two passes: collect thresholded local maxima, then keep them greedily left
/// to right while they respect the refractory distance.
pub fn detect_peaks_with_profile(waveform: &Waveform, profile: &DetectionProfile) -> PeakSet {
    let candidates = local_maxima(waveform.voltage(), profile);
    let peaks = match profile.distance_basis {
        DistanceBasis::TimeMs => filter_by_time(&candidates, waveform.time(), profile.min_distance_ms),
        DistanceBasis::SampleCount => {
            if waveform.sample_count() < 2 {
                return PeakSet::default();
            }
            let min_gap = min_gap_samples(waveform.time(), profile.min_distance_ms);
            filter_by_samples(&candidates, min_gap)
        }
    };
    debug!(
        "{} candidates, {} peaks accepted (threshold {}, min distance {} ms)",
        candidates.len(),
        peaks.len(),
        profile.threshold,
        profile.min_distance_ms
    );
    PeakSet::from_indices(peaks)
}

fn local_maxima(voltage: &[f64], profile: &DetectionProfile) -> Vec<usize> {
    if voltage.len() < 3 {
        return Vec::new();
    }
    (1..voltage.len() - 1)
        .filter(|&i| {
            let value = voltage[i];
            profile
                .neighbor
                .is_local_max(voltage[i - 1], value, voltage[i + 1])
                && value > profile.threshold
        })
        .collect()
}

fn filter_by_time(candidates: &[usize], time: &[f64], min_distance_ms: f64) -> Vec<usize> {
    let mut peaks = Vec::new();
    let mut last_time: Option<f64> = None;
    for &idx in candidates {
        let t = time[idx];
        if last_time.map_or(true, |last| t - last >= min_distance_ms) {
            peaks.push(idx);
            last_time = Some(t);
        }
    }
    peaks
}

fn filter_by_samples(candidates: &[usize], min_gap: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    let mut last_idx: Option<usize> = None;
    for &idx in candidates {
        if last_idx.map_or(true, |last| idx - last >= min_gap) {
            peaks.push(idx);
            last_idx = Some(idx);
        }
    }
    peaks
}

fn min_gap_samples(time: &[f64], min_distance_ms: f64) -> usize {
    let step = median_interval(time);
    if step.is_nan() || step <= 0.0 {
        warn!("median sample interval is {step} ms; refractory distance falls back to 1 sample");
        return 1;
    }
    (min_distance_ms / step).round().max(1.0) as usize
}

/// Median of consecutive time deltas; robust to jitter and dropped samples.
pub fn median_interval(time: &[f64]) -> f64 {
    let mut deltas: Vec<f64> = time.windows(2).map(|w| w[1] - w[0]).collect();
    if deltas.is_empty() {
        return 0.0;
    }
    deltas.sort_by(|a, b| a.total_cmp(b));
    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 0 {
        (deltas[mid - 1] + deltas[mid]) / 2.0
    } else {
        deltas[mid]
    }
}
