use crate::error::LoadError;
use crate::signal::{WaveFormat, Waveform};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parse a headered CSV with time (seconds) in column 0 and voltage (mV) in column 1.
///
/// Time is rescaled to milliseconds. Extra columns are ignored, but every record
/// must have as many fields as the header.
pub fn parse_csv_waveform<R: Read>(reader: R, path: &Path) -> Result<Waveform, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| LoadError::malformed(path, format!("reading header: {e}")))?
        .clone();
    if headers.len() < 2 {
        return Err(LoadError::malformed(
            path,
            format!("expected at least 2 columns, found {}", headers.len()),
        ));
    }

    let mut time = Vec::new();
    let mut voltage = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record =
            record.map_err(|e| LoadError::malformed(path, format!("record {line}: {e}")))?;
        let seconds = parse_cell(&record, 0, line, path)?;
        let value = parse_cell(&record, 1, line, path)?;
        let ms = seconds * 1000.0;
        if let Some(&prev) = time.last() {
            if ms < prev {
                return Err(LoadError::malformed(
                    path,
                    format!("record {line}: time goes backwards ({ms} ms after {prev} ms)"),
                ));
            }
        }
        time.push(ms);
        voltage.push(value);
    }
    Waveform::from_parts(WaveFormat::Csv, time, voltage)
        .ok_or_else(|| LoadError::malformed(path, "time and voltage columns disagree"))
}

fn parse_cell(
    record: &csv::StringRecord,
    column: usize,
    line: usize,
    path: &Path,
) -> Result<f64, LoadError> {
    let cell = record
        .get(column)
        .ok_or_else(|| LoadError::malformed(path, format!("record {line}: missing column {column}")))?;
    let value = cell.parse::<f64>().map_err(|_| {
        LoadError::malformed(path, format!("record {line}: '{cell}' is not numeric"))
    })?;
    if value.is_nan() {
        return Err(LoadError::malformed(path, format!("record {line}: NaN sample")));
    }
    Ok(value)
}

/// Read a CSV recording from disk.
pub fn read_csv_waveform(path: &Path) -> Result<Waveform, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv_waveform(file, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Waveform, LoadError> {
        parse_csv_waveform(text.as_bytes(), Path::new("sample.csv"))
    }

    #[test]
    fn rescales_seconds_to_milliseconds() {
        let wf = parse("time,voltage\n0,0\n0.5,0.4\n1.0,0\n1.5,0.5\n2.0,0\n").unwrap();
        assert_eq!(wf.format(), WaveFormat::Csv);
        assert_eq!(wf.time(), &[0.0, 500.0, 1000.0, 1500.0, 2000.0]);
        assert_eq!(wf.voltage(), &[0.0, 0.4, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn single_column_is_malformed() {
        assert!(matches!(
            parse("voltage\n0.1\n0.2\n"),
            Err(LoadError::MalformedData { .. })
        ));
    }

    #[test]
    fn ragged_records_are_malformed() {
        assert!(matches!(
            parse("time,voltage\n0,0.1\n0.002\n"),
            Err(LoadError::MalformedData { .. })
        ));
    }

    #[test]
    fn non_numeric_cells_are_malformed() {
        let err = parse("time,voltage\n0,0.1\n0.002,abc\n").unwrap_err();
        assert!(err.to_string().contains("record 3"));
    }

    #[test]
    fn backwards_time_is_malformed() {
        assert!(matches!(
            parse("time,voltage\n1.0,0.1\n0.5,0.2\n"),
            Err(LoadError::MalformedData { .. })
        ));
    }

    #[test]
    fn header_only_yields_empty_waveform() {
        let wf = parse("time,voltage\n").unwrap();
        assert!(wf.is_empty());
    }
}
