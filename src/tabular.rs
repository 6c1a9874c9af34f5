use std::collections::HashMap;

use csv::StringRecord;

/// Canonical lowercase-underscore form of an upstream column header:
/// punctuation stripped, whitespace runs collapsed to single underscores.
/// Downstream code addresses columns by this form only, so cosmetic header
/// drift in a published file does not ripple past the parser.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Normalized header name -> column index for one delimited file.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    indices: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let indices = headers
            .iter()
            .enumerate()
            .map(|(index, raw)| (normalize_header(raw), index))
            .collect();
        Self { indices }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Resolves a required column, reporting the missing name so the
    /// caller can wrap it in its dataset-specific format error.
    pub fn require(&self, name: &str) -> Result<usize, String> {
        self.get(name)
            .ok_or_else(|| format!("missing column `{name}`"))
    }
}

/// Field accessor tolerant of ragged trailing columns.
pub fn field<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(normalize_header("  Area   Title "), "area_title");
        assert_eq!(normalize_header("Civilian Labor Force"), "civilian_labor_force");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(normalize_header("Unemployment Rate (%)"), "unemployment_rate");
        assert_eq!(normalize_header("area_fips"), "area_fips");
        assert_eq!(normalize_header("Own.Code"), "own_code");
    }

    #[test]
    fn column_map_resolves_normalized_names() {
        let headers = StringRecord::from(vec!["Area FIPS", "Agglvl Code", "Year"]);
        let map = ColumnMap::from_headers(&headers);
        assert_eq!(map.get("area_fips"), Some(0));
        assert_eq!(map.get("agglvl_code"), Some(1));
        assert_eq!(map.require("year").unwrap(), 2);
        assert!(map.require("qtr").is_err());
    }

    #[test]
    fn field_tolerates_missing_trailing_columns() {
        let record = StringRecord::from(vec!["a", " b "]);
        assert_eq!(field(&record, 1), "b");
        assert_eq!(field(&record, 9), "");
    }
}
