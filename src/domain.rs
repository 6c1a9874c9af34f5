use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FieldstatError;

/// Two-digit state FIPS fragment, zero-padded on parse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateFips(String);

impl StateFips {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateFips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StateFips {
    type Err = FieldstatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_numeric = !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_digit());
        if !is_numeric || trimmed.len() > 2 {
            return Err(FieldstatError::InvalidFips(value.to_string()));
        }
        Ok(Self(format!("{trimmed:0>2}")))
    }
}

/// Three-digit county FIPS fragment, zero-padded on parse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountyFips(String);

impl CountyFips {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountyFips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CountyFips {
    type Err = FieldstatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_numeric = !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_digit());
        if !is_numeric || trimmed.len() > 3 {
            return Err(FieldstatError::InvalidFips(value.to_string()));
        }
        Ok(Self(format!("{trimmed:0>3}")))
    }
}

/// Combined five-digit county identifier: zero-padded state fragment
/// followed by the zero-padded county fragment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaFips(String);

impl AreaFips {
    pub fn from_parts(state: &StateFips, county: &CountyFips) -> Self {
        Self(format!("{}{}", state.as_str(), county.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaFips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AreaFips {
    type Err = FieldstatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = trimmed.len() == 5 && trimmed.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(FieldstatError::InvalidFips(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// One cache slot per published extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    Laus,
    Qcew,
    OewsSeries,
    OewsData,
    CesSeries,
    CesData,
}

impl Dataset {
    /// Whether `query` sums constituent counties by default. Only LAUS
    /// carries county-keyed flow values that are meaningful to sum.
    pub fn default_aggregate(&self) -> bool {
        matches!(self, Dataset::Laus)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Laus => "laus",
            Dataset::Qcew => "qcew",
            Dataset::OewsSeries => "oews-series",
            Dataset::OewsData => "oews-data",
            Dataset::CesSeries => "ces-series",
            Dataset::CesData => "ces-data",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = FieldstatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "laus" => Ok(Dataset::Laus),
            "qcew" => Ok(Dataset::Qcew),
            "oews-series" => Ok(Dataset::OewsSeries),
            "oews-data" | "oews" => Ok(Dataset::OewsData),
            "ces-series" => Ok(Dataset::CesSeries),
            "ces-data" | "ces" => Ok(Dataset::CesData),
            _ => Err(FieldstatError::InvalidDataset(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfficeKind {
    District,
    Regional,
}

impl fmt::Display for OfficeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfficeKind::District => write!(f, "district"),
            OfficeKind::Regional => write!(f, "regional"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_state_fips_pads() {
        let fips: StateFips = "1".parse().unwrap();
        assert_eq!(fips.as_str(), "01");
    }

    #[test]
    fn parse_state_fips_invalid() {
        let err = "AL".parse::<StateFips>().unwrap_err();
        assert_matches!(err, FieldstatError::InvalidFips(_));
        let err = "123".parse::<StateFips>().unwrap_err();
        assert_matches!(err, FieldstatError::InvalidFips(_));
    }

    #[test]
    fn parse_county_fips_pads() {
        let fips: CountyFips = "3".parse().unwrap();
        assert_eq!(fips.as_str(), "003");
    }

    #[test]
    fn combined_fips_from_parts() {
        let state: StateFips = "01".parse().unwrap();
        let county: CountyFips = "3".parse().unwrap();
        assert_eq!(AreaFips::from_parts(&state, &county).as_str(), "01003");
    }

    #[test]
    fn parse_area_fips_rejects_short() {
        let err = "1003".parse::<AreaFips>().unwrap_err();
        assert_matches!(err, FieldstatError::InvalidFips(_));
    }

    #[test]
    fn parse_dataset_names() {
        assert_eq!("laus".parse::<Dataset>().unwrap(), Dataset::Laus);
        assert_eq!("oews_data".parse::<Dataset>().unwrap(), Dataset::OewsData);
        assert_eq!("ces".parse::<Dataset>().unwrap(), Dataset::CesData);
        assert_matches!(
            "payroll".parse::<Dataset>(),
            Err(FieldstatError::InvalidDataset(_))
        );
    }

    #[test]
    fn default_aggregation() {
        assert!(Dataset::Laus.default_aggregate());
        assert!(!Dataset::Qcew.default_aggregate());
        assert!(!Dataset::OewsData.default_aggregate());
    }
}
