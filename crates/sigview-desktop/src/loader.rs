//! Series files: plain text, one sample per line

use sigview_core::{SigError, SigResult};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a two-column `time value` file. Columns may be separated by a
/// comma or whitespace. Blank lines and lines starting with `#` are
/// skipped.
pub fn load_series(path: &Path) -> SigResult<(Vec<f64>, Vec<f64>)> {
    let text = read(path)?;
    let mut times = Vec::new();
    let mut values = Vec::new();

    for (number, fields) in rows(&text) {
        match fields.as_slice() {
            [time, value] => {
                times.push(parse_field(path, number, time)?);
                values.push(parse_field(path, number, value)?);
            }
            _ => {
                return Err(load_error(
                    path,
                    format!("line {}: expected 2 columns, found {}", number, fields.len()),
                ))
            }
        }
    }

    if times.is_empty() {
        return Err(load_error(path, "no samples".to_string()));
    }
    debug!(path = %path.display(), samples = times.len(), "loaded series file");
    Ok((times, values))
}

/// Read a single-column file of values for the circular display
pub fn load_circular_series(path: &Path) -> SigResult<Vec<f64>> {
    let text = read(path)?;
    let mut values = Vec::new();

    for (number, fields) in rows(&text) {
        match fields.as_slice() {
            [value] => values.push(parse_field(path, number, value)?),
            _ => {
                return Err(load_error(
                    path,
                    format!("line {}: expected 1 column, found {}", number, fields.len()),
                ))
            }
        }
    }

    if values.is_empty() {
        return Err(load_error(path, "no samples".to_string()));
    }
    debug!(path = %path.display(), samples = values.len(), "loaded circular file");
    Ok(values)
}

fn read(path: &Path) -> SigResult<String> {
    fs::read_to_string(path).map_err(|e| load_error(path, e.to_string()))
}

/// Non-empty, non-comment lines with their 1-based line numbers
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            let fields = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            (number, fields)
        })
}

fn parse_field(path: &Path, line: usize, field: &str) -> SigResult<f64> {
    match field.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(load_error(
            path,
            format!("line {}: '{}' is not a finite number", line, field),
        )),
    }
}

fn load_error(path: &Path, reason: String) -> SigError {
    SigError::LoadError {
        path: path.display().to_string(),
        reason,
    }
}
