use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Raw bulk dataset as delivered by the download service: one composite
/// dimension-key column plus one column per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    pub dimension_names: Vec<String>,
    pub periods: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub key: Vec<String>,
    pub cells: Vec<String>,
}

pub const KEY_DELIMITER: char = ',';

/// Parses the bulk-export TSV encoding. The first header cell names the key
/// dimensions, e.g. `unit,vehicle,geo\time`; the remaining header cells are
/// period labels; each data row starts with a comma-delimited composite key.
pub fn parse_tsv(text: &str) -> Result<RawDataset, FetchError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| FetchError::MalformedBulk("empty bulk file".to_string()))?;

    let mut fields = header.split('\t');
    let composite = fields.next().unwrap_or_default();
    let dimension_names = composite
        .split('\\')
        .next()
        .unwrap_or_default()
        .split(KEY_DELIMITER)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>();
    let periods = fields
        .map(|label| label.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let mut fields = line.split('\t');
        let key = fields
            .next()
            .unwrap_or_default()
            .split(KEY_DELIMITER)
            .map(|part| part.trim().to_string())
            .collect::<Vec<_>>();
        let cells = fields
            .map(|cell| cell.trim().to_string())
            .collect::<Vec<_>>();
        if cells.len() != periods.len() {
            return Err(FetchError::MalformedBulk(format!(
                "row {} has {} value cells, expected {}",
                index + 2,
                cells.len(),
                periods.len()
            )));
        }
        rows.push(RawRow { key, cells });
    }

    Ok(RawDataset {
        dimension_names,
        periods,
        rows,
    })
}

/// Parses an observation cell. Flag markers after the number are stripped
/// (`"9.9 p"` -> 9.9); `:`, `NA`, and empty cells are missing.
pub fn parse_value(cell: &str) -> Option<f64> {
    let token = cell.split_whitespace().next()?;
    let token = token.trim_end_matches(|ch: char| ch.is_ascii_alphabetic());
    if token.is_empty() || token == ":" {
        return None;
    }
    token.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_bulk_header_and_rows() {
        let text = "unit,vehicle,geo\\time\t1990\t1991\t1992\nPC,BUS_TOT,AT\tNA\tNA\t9.9\n";
        let raw = parse_tsv(text).unwrap();
        assert_eq!(raw.dimension_names, vec!["unit", "vehicle", "geo"]);
        assert_eq!(raw.periods, vec!["1990", "1991", "1992"]);
        assert_eq!(raw.rows.len(), 1);
        assert_eq!(raw.rows[0].key, vec!["PC", "BUS_TOT", "AT"]);
        assert_eq!(raw.rows[0].cells, vec!["NA", "NA", "9.9"]);
    }

    #[test]
    fn parse_bulk_header_only() {
        let raw = parse_tsv("unit,geo\\time\t2020\t2021\n").unwrap();
        assert_eq!(raw.periods.len(), 2);
        assert!(raw.rows.is_empty());
    }

    #[test]
    fn parse_bulk_empty_fails() {
        assert_matches!(parse_tsv("\n\n"), Err(FetchError::MalformedBulk(_)));
    }

    #[test]
    fn parse_bulk_ragged_row_fails() {
        let text = "unit,geo\\time\t2020\t2021\nPC,AT\t1.0\n";
        let err = parse_tsv(text).unwrap_err();
        assert_matches!(err, FetchError::MalformedBulk(message) if message.contains("row 2"));
    }

    #[test]
    fn parse_cell_values() {
        assert_eq!(parse_value("9.9"), Some(9.9));
        assert_eq!(parse_value("9.9 p"), Some(9.9));
        assert_eq!(parse_value("12 ep"), Some(12.0));
        assert_eq!(parse_value(": "), None);
        assert_eq!(parse_value(":"), None);
        assert_eq!(parse_value("NA"), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("-3.5"), Some(-3.5));
    }
}
