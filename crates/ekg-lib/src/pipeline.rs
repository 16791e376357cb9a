use crate::{
    detectors::ecg::{detect_peaks_with_profile, DetectionProfile},
    error::LoadError,
    io::WaveformSource,
    metrics::heart_rate::heart_rate,
    signal::{PeakSet, WaveFormat, Waveform},
};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// Detection and heart-rate summary for one waveform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub format: WaveFormat,
    pub sample_count: usize,
    pub duration_ms: f64,
    pub threshold: f64,
    pub min_distance_ms: f64,
    pub peaks: PeakSet,
    pub peak_count: usize,
    pub heart_rate_bpm: f64,
}

impl Analysis {
    pub fn from_peaks(waveform: &Waveform, profile: &DetectionProfile, peaks: PeakSet) -> Self {
        let heart_rate_bpm = heart_rate(waveform, &peaks);
        Self {
            format: waveform.format(),
            sample_count: waveform.sample_count(),
            duration_ms: waveform.duration_ms(),
            threshold: profile.threshold,
            min_distance_ms: profile.min_distance_ms,
            peak_count: peaks.len(),
            peaks,
            heart_rate_bpm,
        }
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_ms / 1000.0 / 60.0
    }
}

/// Run detection then rate estimation on a loaded waveform.
pub fn analyze(waveform: &Waveform, profile: &DetectionProfile) -> Analysis {
    let peaks = detect_peaks_with_profile(waveform, profile);
    Analysis::from_peaks(waveform, profile, peaks)
}

/// A recorded test: identity plus a waveform that is read on first use.
///
/// Not `Sync`; give each thread its own recordings.
#[derive(Debug)]
pub struct Recording {
    pub id: String,
    pub date: Option<String>,
    source: WaveformSource,
    waveform: OnceCell<Waveform>,
}

impl Recording {
    pub fn new(id: impl Into<String>, date: Option<String>, source: WaveformSource) -> Self {
        Self {
            id: id.into(),
            date,
            source,
            waveform: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &WaveformSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.waveform.get().is_some()
    }

    /// Load on first call; later calls return the cached waveform. A failed
    /// load caches nothing, so the next call reads the file again.
    pub fn waveform(&self) -> Result<&Waveform, LoadError> {
        if let Some(waveform) = self.waveform.get() {
            return Ok(waveform);
        }
        let loaded = self.source.load()?;
        Ok(self.waveform.get_or_init(|| loaded))
    }

    pub fn analyze(&self, profile: &DetectionProfile) -> Result<Analysis, LoadError> {
        Ok(analyze(self.waveform()?, profile))
    }
}
