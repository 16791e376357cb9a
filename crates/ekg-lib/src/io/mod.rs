//! Waveform loading: format resolution plus the per-format parsers.

pub mod csv;
pub mod raw;

use crate::error::LoadError;
use crate::signal::{WaveFormat, Waveform};
use log::debug;
use std::path::{Path, PathBuf};

/// An unloaded recording: where it lives and how to parse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformSource {
    path: PathBuf,
    format: WaveFormat,
}

impl WaveformSource {
    /// Resolve the format from `hint` if given, otherwise from the file extension.
    pub fn new(path: impl Into<PathBuf>, hint: Option<&str>) -> Result<Self, LoadError> {
        let path = path.into();
        let format = match hint {
            Some(hint) => {
                WaveFormat::from_hint(hint).ok_or_else(|| LoadError::UnsupportedFormat {
                    path: path.clone(),
                    detail: format!("unknown format hint '{hint}'"),
                })?
            }
            None => resolve_extension(&path)?,
        };
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> WaveFormat {
        self.format
    }

    /// Read and parse the file. Either a full waveform comes back or an error.
    pub fn load(&self) -> Result<Waveform, LoadError> {
        let waveform = match self.format {
            WaveFormat::RawTabDelimited => raw::read_raw_waveform(&self.path)?,
            WaveFormat::Csv => csv::read_csv_waveform(&self.path)?,
        };
        debug!(
            "loaded {} ({}): {} samples over {:.0} ms",
            self.path.display(),
            self.format,
            waveform.sample_count(),
            waveform.duration_ms()
        );
        Ok(waveform)
    }
}

fn resolve_extension(path: &Path) -> Result<WaveFormat, LoadError> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    WaveFormat::from_extension(ext).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.to_path_buf(),
        detail: if ext.is_empty() {
            "file has no extension".to_string()
        } else {
            format!("unrecognized extension '.{ext}'")
        },
    })
}

/// Load a recording in one step.
pub fn load(path: impl AsRef<Path>, hint: Option<&str>) -> Result<Waveform, LoadError> {
    WaveformSource::new(path.as_ref(), hint)?.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recording.dat");
        fs::write(&path, "1\n2\n").unwrap();
        let err = load(&path, None).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
        assert_eq!(err.kind(), "unsupported_format");
    }

    #[test]
    fn unknown_hint_is_unsupported() {
        let err = WaveformSource::new("recording.txt", Some("edf")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_file_is_io_failure() {
        let dir = tempdir().unwrap();
        let err = load(dir.path().join("missing.txt"), None).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }

    #[test]
    fn ragged_raw_file_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.txt");
        fs::write(&path, "400\t1\n420\n440\t3\n").unwrap();
        assert!(matches!(
            load(&path, None),
            Err(LoadError::MalformedData { .. })
        ));
    }

    #[test]
    fn hint_overrides_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.dat");
        fs::write(&path, "time,voltage\n0,0.1\n0.002,0.2\n").unwrap();
        let wf = load(&path, Some("csv")).unwrap();
        assert_eq!(wf.format(), WaveFormat::Csv);
        assert_eq!(wf.time(), &[0.0, 2.0]);
    }

    #[test]
    fn loaded_waveforms_keep_time_and_voltage_aligned() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("a.txt");
        let csv = dir.path().join("b.csv");
        fs::write(&raw, "0\n400\n0\n0\n420\n").unwrap();
        fs::write(&csv, "t,v\n0,0\n0.004,0.5\n0.004,0.1\n0.008,0\n").unwrap();
        for path in [&raw, &csv] {
            let wf = load(path, None).unwrap();
            assert_eq!(wf.time().len(), wf.voltage().len());
            assert!(wf.time().windows(2).all(|w| w[1] >= w[0]));
        }
    }
}
