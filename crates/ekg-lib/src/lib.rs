pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod plot;
pub mod signal;

pub use detectors::ecg::{detect_peaks, detect_peaks_with_profile, DetectionProfile};
pub use error::LoadError;
pub use io::{load, WaveformSource};
pub use metrics::heart_rate::heart_rate;
pub use pipeline::{analyze, Analysis, Recording};
pub use plot::{project_for_display, Projection, WindowRequest};
pub use signal::*;
