use crate::error::LoadError;
use crate::signal::Waveform;
use std::path::Path;

/// Parse a tab/whitespace-delimited numeric matrix and keep column 0 as voltage.
///
/// Blank lines and `#` comments are skipped. Every data row must have the same
/// number of columns.
pub fn parse_raw_voltage(text: &str, path: &Path) -> Result<Vec<f64>, LoadError> {
    let mut voltage = Vec::new();
    let mut width: Option<usize> = None;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cells: Vec<&str> = trimmed.split_whitespace().collect();
        match width {
            None => width = Some(cells.len()),
            Some(expected) if expected != cells.len() => {
                return Err(LoadError::malformed(
                    path,
                    format!(
                        "line {} has {} columns, expected {}",
                        idx + 1,
                        cells.len(),
                        expected
                    ),
                ));
            }
            Some(_) => {}
        }
        for cell in &cells[1..] {
            cell.parse::<f64>().map_err(|_| {
                LoadError::malformed(path, format!("line {} is not numeric: {}", idx + 1, cell))
            })?;
        }
        let value = cells[0].parse::<f64>().map_err(|_| {
            LoadError::malformed(path, format!("line {} is not numeric: {}", idx + 1, cells[0]))
        })?;
        voltage.push(value);
    }
    if voltage.is_empty() {
        return Err(LoadError::malformed(path, "no numeric samples found"));
    }
    Ok(voltage)
}

/// Read a tab-delimited recording; time is synthesized on the 2 ms grid.
pub fn read_raw_waveform(path: &Path) -> Result<Waveform, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let voltage = parse_raw_voltage(&text, path)?;
    Ok(Waveform::from_raw_voltage(voltage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<f64>, LoadError> {
        parse_raw_voltage(text, Path::new("sample.txt"))
    }

    #[test]
    fn keeps_first_column() {
        let voltage = parse("400\t12\n420\t14\n\n# trailing note\n440\t16\n").unwrap();
        assert_eq!(voltage, vec![400.0, 420.0, 440.0]);
    }

    #[test]
    fn single_column_is_fine() {
        assert_eq!(parse("1\n2\n3\n").unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let err = parse("1\t2\n3\n").unwrap_err();
        match err {
            LoadError::MalformedData { reason, .. } => assert!(reason.contains("line 2")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_cells_are_malformed() {
        assert!(matches!(
            parse("1\t2\nabc\t4\n"),
            Err(LoadError::MalformedData { .. })
        ));
        assert!(matches!(
            parse("1\t2\n3\tx\n"),
            Err(LoadError::MalformedData { .. })
        ));
    }

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(parse("\n\n"), Err(LoadError::MalformedData { .. })));
    }
}
