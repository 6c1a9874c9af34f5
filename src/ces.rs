use std::time::Duration;

use csv::ReaderBuilder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::debug;

use crate::error::FieldstatError;
use crate::geography::Geography;
use crate::oews::normalize_area_code;
use crate::tabular::{ColumnMap, field};

pub const CES_SERIES_URL: &str = "https://download.bls.gov/pub/time.series/sm/sm.series";
pub const CES_DATA_URL: &str = "https://download.bls.gov/pub/time.series/sm/sm.data.1.AllData";

#[derive(Debug, Clone, Serialize)]
pub struct CesSeriesRow {
    pub series_id: String,
    pub state_code: String,
    pub area_code: String,
    pub industry_code: String,
    pub data_type_code: String,
    pub district_offices: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CesDataRow {
    pub series_id: String,
    pub year: u16,
    pub period: String,
    pub value: Option<f64>,
}

pub trait CesClient: Send + Sync {
    fn fetch_series(&self) -> Result<String, FieldstatError>;
    fn fetch_data(&self) -> Result<String, FieldstatError>;
}

#[derive(Clone)]
pub struct CesHttpClient {
    client: Client,
    series_url: String,
    data_url: String,
}

impl CesHttpClient {
    pub fn new(series_url: &str, data_url: &str) -> Result<Self, FieldstatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fieldstat/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FieldstatError::CesHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| FieldstatError::CesHttp(err.to_string()))?;
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
            .map_err(|err| FieldstatError::CesHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "CES request failed".to_string());
            return Err(FieldstatError::CesStatus { status, message });
        }
        response
            .text()
            .map_err(|err| FieldstatError::CesHttp(err.to_string()))
    }
}

impl CesClient for CesHttpClient {
    fn fetch_series(&self) -> Result<String, FieldstatError> {
        self.fetch(&self.series_url)
    }

    fn fetch_data(&self) -> Result<String, FieldstatError> {
        self.fetch(&self.data_url)
    }
}

/// Fetches the series file and drops every series whose area code does
/// not resolve to at least one district office; the join never sees an
/// unmapped series.
pub fn load_series<C: CesClient>(
    client: &C,
    geography: &Geography,
) -> Result<Vec<CesSeriesRow>, FieldstatError> {
    let text = client.fetch_series()?;
    let rows = parse_series(&text, geography)?;
    debug!(rows = rows.len(), "CES series loaded");
    Ok(rows)
}

pub fn load_data<C: CesClient>(client: &C) -> Result<Vec<CesDataRow>, FieldstatError> {
    let text = client.fetch_data()?;
    let rows = parse_data(&text)?;
    debug!(rows = rows.len(), "CES observations loaded");
    Ok(rows)
}

pub fn parse_series(
    text: &str,
    geography: &Geography,
) -> Result<Vec<CesSeriesRow>, FieldstatError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| FieldstatError::CesFormat(err.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let series_id = columns
        .require("series_id")
        .map_err(FieldstatError::CesFormat)?;
    let state_code = columns
        .require("state_code")
        .map_err(FieldstatError::CesFormat)?;
    let area_code = columns
        .require("area_code")
        .map_err(FieldstatError::CesFormat)?;
    let industry_code = columns
        .require("industry_code")
        .map_err(FieldstatError::CesFormat)?;
    let data_type_code = columns
        .require("data_type_code")
        .map_err(FieldstatError::CesFormat)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FieldstatError::CesFormat(err.to_string()))?;
        let code = normalize_area_code(field(&record, area_code));
        let offices = match geography.metro_area_offices(&code) {
            Some(offices) if !offices.is_empty() => offices.iter().cloned().collect(),
            _ => continue,
        };
        rows.push(CesSeriesRow {
            series_id: field(&record, series_id).to_string(),
            state_code: field(&record, state_code).to_string(),
            area_code: code,
            industry_code: field(&record, industry_code).to_string(),
            data_type_code: field(&record, data_type_code).to_string(),
            district_offices: offices,
        });
    }
    Ok(rows)
}

pub fn parse_data(text: &str) -> Result<Vec<CesDataRow>, FieldstatError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| FieldstatError::CesFormat(err.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let series_id = columns
        .require("series_id")
        .map_err(FieldstatError::CesFormat)?;
    let year = columns.require("year").map_err(FieldstatError::CesFormat)?;
    let period = columns.require("period").map_err(FieldstatError::CesFormat)?;
    let value = columns.require("value").map_err(FieldstatError::CesFormat)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FieldstatError::CesFormat(err.to_string()))?;
        rows.push(CesDataRow {
            series_id: field(&record, series_id).to_string(),
            year: field(&record, year).parse().map_err(|_| {
                FieldstatError::CesFormat(format!("non-numeric year: {}", field(&record, year)))
            })?,
            period: field(&record, period).to_string(),
            value: parse_value(field(&record, value))?,
        });
    }
    Ok(rows)
}

fn parse_value(raw: &str) -> Result<Option<f64>, FieldstatError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FieldstatError::CesFormat(format!("non-numeric value: {raw}")))
}
