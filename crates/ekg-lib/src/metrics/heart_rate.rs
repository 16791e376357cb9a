use crate::signal::{PeakSet, Waveform};

/// Heart rate in beats per minute over the span from the first to the last peak.
///
/// The rate is the peak count divided by that span, so `n` beats are counted
/// over `n - 1` intervals. Returns `0.0` with fewer than two peaks or a zero span.
pub fn heart_rate(waveform: &Waveform, peaks: &PeakSet) -> f64 {
    let (first, last) = match (peaks.indices().first(), peaks.indices().last()) {
        (Some(&first), Some(&last)) if peaks.len() >= 2 => (first, last),
        _ => return 0.0,
    };
    let time = waveform.time();
    let (start, end) = match (time.get(first), time.get(last)) {
        (Some(&start), Some(&end)) => (start, end),
        _ => return 0.0,
    };
    let elapsed_min = (end - start) / 1000.0 / 60.0;
    if elapsed_min > 0.0 {
        peaks.len() as f64 / elapsed_min
    } else {
        0.0
    }
}
