use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::debug;

use crate::domain::{AreaFips, CountyFips, StateFips};
use crate::error::FieldstatError;

/// Current-month county extract: pipe-delimited with a fixed-size prose
/// header and footnote footer.
pub const LAUS_FEED_URL: &str = "https://www.bls.gov/web/metro/laucntycur14.txt";

const HEADER_LINES: usize = 6;
const FOOTER_LINES: usize = 3;
const COLUMN_COUNT: usize = 9;

#[derive(Debug, Clone, Serialize)]
pub struct LausRow {
    pub laus_area_code: String,
    pub fips: AreaFips,
    pub area_title: String,
    pub period: NaiveDate,
    pub civilian_labor_force: u64,
    pub employed: u64,
    pub unemployed: u64,
}

pub trait LausClient: Send + Sync {
    fn fetch_feed(&self) -> Result<String, FieldstatError>;
}

#[derive(Clone)]
pub struct LausHttpClient {
    client: Client,
    url: String,
}

impl LausHttpClient {
    pub fn new(url: &str) -> Result<Self, FieldstatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fieldstat/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FieldstatError::LausHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| FieldstatError::LausHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl LausClient for LausHttpClient {
    fn fetch_feed(&self) -> Result<String, FieldstatError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| FieldstatError::LausHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "LAUS request failed".to_string());
            return Err(FieldstatError::LausStatus { status, message });
        }
        response
            .text()
            .map_err(|err| FieldstatError::LausHttp(err.to_string()))
    }
}

/// Fetches and normalizes the feed into one row per county per period.
pub fn load_laus<C: LausClient>(client: &C) -> Result<Vec<LausRow>, FieldstatError> {
    let text = client.fetch_feed()?;
    let rows = parse_feed(&text)?;
    debug!(rows = rows.len(), "LAUS feed loaded");
    Ok(rows)
}

pub fn parse_feed(text: &str) -> Result<Vec<LausRow>, FieldstatError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= HEADER_LINES + FOOTER_LINES {
        return Err(FieldstatError::LausFormat(format!(
            "feed has {} lines, shorter than its fixed header and footer",
            lines.len()
        )));
    }
    let period_re = Regex::new(r"^([A-Za-z]{3})-(\d{2})$").unwrap();

    let body = &lines[HEADER_LINES..lines.len() - FOOTER_LINES];
    let mut rows = Vec::with_capacity(body.len());
    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() != COLUMN_COUNT {
            return Err(FieldstatError::LausFormat(format!(
                "expected {COLUMN_COUNT} columns, got {}",
                fields.len()
            )));
        }

        let state_fips: StateFips = fields[1].parse()?;
        let county_fips: CountyFips = fields[2].parse()?;
        let fips = AreaFips::from_parts(&state_fips, &county_fips);

        // The upstream rate column is ignored: the engine re-derives the
        // rate from the counts so summed and row-wise results agree.
        rows.push(LausRow {
            laus_area_code: fields[0].to_string(),
            fips,
            area_title: fields[3].to_string(),
            period: parse_period_with(&period_re, fields[4])?,
            civilian_labor_force: parse_count(fields[5])?,
            employed: parse_count(fields[6])?,
            unemployed: parse_count(fields[7])?,
        });
    }
    Ok(rows)
}

/// `Mon-YY` with an optional trailing `(p)` preliminary marker, mapped to
/// the calendar end of that month.
pub fn parse_period(value: &str) -> Result<NaiveDate, FieldstatError> {
    let period_re = Regex::new(r"^([A-Za-z]{3})-(\d{2})$").unwrap();
    parse_period_with(&period_re, value)
}

fn parse_period_with(period_re: &Regex, value: &str) -> Result<NaiveDate, FieldstatError> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_suffix("(p)").unwrap_or(trimmed).trim();
    let captures = period_re
        .captures(stripped)
        .ok_or_else(|| FieldstatError::InvalidPeriod(value.to_string()))?;
    let month = month_number(&captures[1])
        .ok_or_else(|| FieldstatError::InvalidPeriod(value.to_string()))?;
    let year = 2000
        + captures[2]
            .parse::<i32>()
            .map_err(|_| FieldstatError::InvalidPeriod(value.to_string()))?;
    end_of_month(year, month).ok_or_else(|| FieldstatError::InvalidPeriod(value.to_string()))
}

fn month_number(abbreviation: &str) -> Option<u32> {
    match abbreviation.to_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

fn end_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.and_then(|date| date.pred_opt())
}

/// Counts may carry thousands separators in the published extract.
fn parse_count(value: &str) -> Result<u64, FieldstatError> {
    let cleaned = value.replace(',', "");
    cleaned
        .parse::<u64>()
        .map_err(|_| FieldstatError::LausFormat(format!("non-numeric count: {value}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn period_end_of_month() {
        let date = parse_period("Aug-23").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 8, 31).unwrap());
        let feb = parse_period("Feb-24").unwrap();
        assert_eq!(feb, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let dec = parse_period("Dec-23").unwrap();
        assert_eq!(dec, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn period_strips_preliminary_marker() {
        let date = parse_period("Aug-23(p)").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 8, 31).unwrap());
    }

    #[test]
    fn period_rejects_garbage() {
        assert_matches!(
            parse_period("August 2023"),
            Err(FieldstatError::InvalidPeriod(_))
        );
        assert_matches!(parse_period("Xyz-23"), Err(FieldstatError::InvalidPeriod(_)));
    }

    #[test]
    fn counts_allow_thousands_separators() {
        assert_eq!(parse_count("1,234,567").unwrap(), 1_234_567);
        assert_matches!(parse_count("n/a"), Err(FieldstatError::LausFormat(_)));
    }
}
