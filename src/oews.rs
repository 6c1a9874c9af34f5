use std::time::Duration;

use csv::ReaderBuilder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::debug;

use crate::error::FieldstatError;
use crate::geography::Geography;
use crate::tabular::{ColumnMap, field};

pub const OEWS_SERIES_URL: &str = "https://download.bls.gov/pub/time.series/oe/oe.series";
pub const OEWS_DATA_URL: &str = "https://download.bls.gov/pub/time.series/oe/oe.data.0.Current";

/// Area type code for metropolitan statistical areas in the series file.
const METRO_AREATYPE: &str = "M";

#[derive(Debug, Clone, Serialize)]
pub struct OewsSeriesRow {
    pub series_id: String,
    pub area_code: String,
    pub occupation_code: String,
    pub datatype_code: String,
    /// Every district office serving the series' metro area. Shared MSAs
    /// fan out to all of their offices rather than one arbitrary pick.
    pub district_offices: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OewsDataRow {
    pub series_id: String,
    pub year: u16,
    pub period: String,
    pub value: Option<f64>,
}

pub trait OewsClient: Send + Sync {
    fn fetch_series(&self) -> Result<String, FieldstatError>;
    fn fetch_data(&self) -> Result<String, FieldstatError>;
}

#[derive(Clone)]
pub struct OewsHttpClient {
    client: Client,
    series_url: String,
    data_url: String,
}

impl OewsHttpClient {
    pub fn new(series_url: &str, data_url: &str) -> Result<Self, FieldstatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fieldstat/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FieldstatError::OewsHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| FieldstatError::OewsHttp(err.to_string()))?;
        Ok(Self {
            client,
            series_url: series_url.to_string(),
            data_url: data_url.to_string(),
        })
    }

    fn fetch(&self, url: &str) -> Result<String, FieldstatError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FieldstatError::OewsHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "OEWS request failed".to_string());
            return Err(FieldstatError::OewsStatus { status, message });
        }
        response
            .text()
            .map_err(|err| FieldstatError::OewsHttp(err.to_string()))
    }
}

impl OewsClient for OewsHttpClient {
    fn fetch_series(&self) -> Result<String, FieldstatError> {
        self.fetch(&self.series_url)
    }

    fn fetch_data(&self) -> Result<String, FieldstatError> {
        self.fetch(&self.data_url)
    }
}

/// Fetches the series file, keeps metro-area series and annotates each
/// with the district offices serving its MSA. Series outside the MSA
/// reference enumeration are dropped.
pub fn load_series<C: OewsClient>(
    client: &C,
    geography: &Geography,
) -> Result<Vec<OewsSeriesRow>, FieldstatError> {
    let text = client.fetch_series()?;
    let rows = parse_series(&text, geography)?;
    debug!(rows = rows.len(), "OEWS series loaded");
    Ok(rows)
}

pub fn load_data<C: OewsClient>(client: &C) -> Result<Vec<OewsDataRow>, FieldstatError> {
    let text = client.fetch_data()?;
    let rows = parse_data(&text)?;
    debug!(rows = rows.len(), "OEWS observations loaded");
    Ok(rows)
}

pub fn parse_series(
    text: &str,
    geography: &Geography,
) -> Result<Vec<OewsSeriesRow>, FieldstatError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| FieldstatError::OewsFormat(err.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let series_id = columns
        .require("series_id")
        .map_err(FieldstatError::OewsFormat)?;
    let areatype_code = columns
        .require("areatype_code")
        .map_err(FieldstatError::OewsFormat)?;
    let area_code = columns
        .require("area_code")
        .map_err(FieldstatError::OewsFormat)?;
    let occupation_code = columns
        .require("occupation_code")
        .map_err(FieldstatError::OewsFormat)?;
    let datatype_code = columns
        .require("datatype_code")
        .map_err(FieldstatError::OewsFormat)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FieldstatError::OewsFormat(err.to_string()))?;
        if field(&record, areatype_code) != METRO_AREATYPE {
            continue;
        }
        let code = normalize_area_code(field(&record, area_code));
        let Some(offices) = geography.metro_area_offices(&code) else {
            continue;
        };
        rows.push(OewsSeriesRow {
            series_id: field(&record, series_id).to_string(),
            area_code: code,
            occupation_code: field(&record, occupation_code).to_string(),
            datatype_code: field(&record, datatype_code).to_string(),
            district_offices: offices.iter().cloned().collect(),
        });
    }
    Ok(rows)
}

pub fn parse_data(text: &str) -> Result<Vec<OewsDataRow>, FieldstatError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| FieldstatError::OewsFormat(err.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let series_id = columns
        .require("series_id")
        .map_err(FieldstatError::OewsFormat)?;
    let year = columns.require("year").map_err(FieldstatError::OewsFormat)?;
    let period = columns
        .require("period")
        .map_err(FieldstatError::OewsFormat)?;
    let value = columns
        .require("value")
        .map_err(FieldstatError::OewsFormat)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FieldstatError::OewsFormat(err.to_string()))?;
        rows.push(OewsDataRow {
            series_id: field(&record, series_id).to_string(),
            year: field(&record, year)
                .parse()
                .map_err(|_| {
                    FieldstatError::OewsFormat(format!(
                        "non-numeric year: {}",
                        field(&record, year)
                    ))
                })?,
            period: field(&record, period).to_string(),
            value: parse_value(field(&record, value))?,
        });
    }
    Ok(rows)
}

/// The series file zero-pads metro codes to seven characters; the MSA
/// reference table carries the bare five-digit CBSA form.
pub fn normalize_area_code(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.len() == 7 && trimmed.starts_with("00") {
        trimmed[2..].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Data values carry stray whitespace; suppressed cells are dashes or
/// empty.
fn parse_value(raw: &str) -> Result<Option<f64>, FieldstatError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FieldstatError::OewsFormat(format!("non-numeric value: {raw}")))
}
