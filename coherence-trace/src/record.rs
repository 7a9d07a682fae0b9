//! Trace record parsing.

use std::io::BufRead;
use std::path::Path;

use crate::error::TraceError;

/// One line of a trace file, decoded into the operation it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceRecord {
    /// A processor load at this byte address.
    Load(u32),
    /// A processor store at this byte address.
    Store(u32),
    /// Non-memory work that simply burns this many cycles.
    Compute(u32),
}

const LABEL_LOAD: &str = "0";
const LABEL_STORE: &str = "1";
const LABEL_OTHERS: &str = "2";

fn parse_hex(value: &str) -> Option<u32> {
    let trimmed = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value);
    u32::from_str_radix(trimmed, 16).ok()
}

fn parse_line(line: &str) -> Option<TraceRecord> {
    let mut fields = line.split_whitespace();
    let label = fields.next()?;
    let value = fields.next()?;
    let value = parse_hex(value)?;

    match label {
        LABEL_LOAD => Some(TraceRecord::Load(value)),
        LABEL_STORE => Some(TraceRecord::Store(value)),
        LABEL_OTHERS => Some(TraceRecord::Compute(value)),
        _ => None,
    }
}

/// Load every well-formed record out of a trace file.
///
/// A line that fails to parse (wrong arity, unknown label, bad hex) is
/// logged and skipped rather than aborting the whole load — a single
/// malformed line should not sink an otherwise-usable trace.
///
/// # Errors
///
/// Returns [`TraceError::Open`] if the file cannot be opened, or
/// [`TraceError::Read`] if a line cannot be read from it.
pub fn load_trace(path: &Path) -> Result<Vec<TraceRecord>, TraceError> {
    let file = std::fs::File::open(path).map_err(|source| TraceError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TraceError::Read {
            path: path.display().to_string(),
            line: line_no + 1,
            source,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(record) => records.push(record),
            None => log::warn!("{}:{}: skipping malformed trace line {line:?}", path.display(), line_no + 1),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_load_with_0x_prefix() {
        assert_eq!(parse_line("0 0x40"), Some(TraceRecord::Load(0x40)));
    }

    #[test]
    fn parses_store_without_prefix() {
        assert_eq!(parse_line("1 40"), Some(TraceRecord::Store(0x40)));
    }

    #[test]
    fn parses_compute() {
        assert_eq!(parse_line("2 a"), Some(TraceRecord::Compute(0xa)));
    }

    #[test]
    fn rejects_unknown_label() {
        assert_eq!(parse_line("9 0x1"), None);
    }

    #[test]
    fn rejects_missing_value() {
        assert_eq!(parse_line("0"), None);
    }

    #[test]
    fn rejects_non_hex_value() {
        assert_eq!(parse_line("0 not-hex"), None);
    }
}
