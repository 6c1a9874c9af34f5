use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use csv::ReaderBuilder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::debug;

use crate::domain::AreaFips;
use crate::error::FieldstatError;
use crate::fs_util;
use crate::tabular::{ColumnMap, field};

/// Quarterly single-file release: one zip holding one large csv.
pub const QCEW_ARCHIVE_URL: &str =
    "https://data.bls.gov/cew/data/files/2024/csv/2024_qtrly_singlefile.zip";

/// County aggregation-level codes. Codes below this range are national,
/// state or MSA roll-ups; codes above slice counties by establishment
/// size.
const COUNTY_AGGLVL_RANGE: std::ops::RangeInclusive<u8> = 70..=78;

#[derive(Debug, Clone, Serialize)]
pub struct QcewRow {
    pub area_fips: AreaFips,
    pub own_code: String,
    pub industry_code: String,
    pub agglvl_code: u8,
    pub year: u16,
    pub qtr: String,
    pub qtrly_estabs: u64,
    pub month3_emplvl: u64,
    pub total_qtrly_wages: u64,
    pub avg_wkly_wage: u64,
}

pub trait QcewClient: Send + Sync {
    fn download_archive(&self, destination: &Path) -> Result<(), FieldstatError>;
}

#[derive(Clone)]
pub struct QcewHttpClient {
    client: Client,
    url: String,
}

impl QcewHttpClient {
    pub fn new(url: &str) -> Result<Self, FieldstatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fieldstat/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FieldstatError::QcewHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| FieldstatError::QcewHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl QcewClient for QcewHttpClient {
    fn download_archive(&self, destination: &Path) -> Result<(), FieldstatError> {
        let mut response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| FieldstatError::QcewHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "QCEW request failed".to_string());
            return Err(FieldstatError::QcewStatus { status, message });
        }
        let mut file = File::create(destination)
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

/// Downloads the archive into a tempfile, pulls the csv member out and
/// keeps only county-level rows. The tempfile is removed when this
/// returns, success or not.
pub fn load_qcew<C: QcewClient>(client: &C) -> Result<Vec<QcewRow>, FieldstatError> {
    let archive = tempfile::Builder::new()
        .prefix("fieldstat-qcew")
        .suffix(".zip")
        .tempfile()
        .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
    client.download_archive(archive.path())?;
    fs_util::validate_zip(archive.path())?;
    let content = fs_util::read_zip_member(archive.path(), ".csv")?.ok_or_else(|| {
        FieldstatError::QcewFormat("archive contains no csv member".to_string())
    })?;
    let rows = parse_rows(&content)?;
    debug!(rows = rows.len(), "QCEW archive loaded");
    Ok(rows)
}

pub fn parse_rows(content: &str) -> Result<Vec<QcewRow>, FieldstatError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| FieldstatError::QcewFormat(err.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let area_fips = columns.require("area_fips").map_err(FieldstatError::QcewFormat)?;
    let own_code = columns.require("own_code").map_err(FieldstatError::QcewFormat)?;
    let industry_code = columns
        .require("industry_code")
        .map_err(FieldstatError::QcewFormat)?;
    let agglvl_code = columns
        .require("agglvl_code")
        .map_err(FieldstatError::QcewFormat)?;
    let year = columns.require("year").map_err(FieldstatError::QcewFormat)?;
    let qtr = columns.require("qtr").map_err(FieldstatError::QcewFormat)?;
    let qtrly_estabs = columns
        .require("qtrly_estabs")
        .map_err(FieldstatError::QcewFormat)?;
    let month3_emplvl = columns
        .require("month3_emplvl")
        .map_err(FieldstatError::QcewFormat)?;
    let total_qtrly_wages = columns
        .require("total_qtrly_wages")
        .map_err(FieldstatError::QcewFormat)?;
    let avg_wkly_wage = columns
        .require("avg_wkly_wage")
        .map_err(FieldstatError::QcewFormat)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FieldstatError::QcewFormat(err.to_string()))?;

        let agglvl: u8 = match field(&record, agglvl_code).parse() {
            Ok(code) => code,
            Err(_) => {
                return Err(FieldstatError::QcewFormat(format!(
                    "non-numeric agglvl_code: {}",
                    field(&record, agglvl_code)
                )));
            }
        };
        if !COUNTY_AGGLVL_RANGE.contains(&agglvl) {
            continue;
        }
        // MSA and CSA rows carry letter-prefixed area codes at other
        // aggregation levels; a county row must have a numeric FIPS.
        let Ok(fips) = AreaFips::from_str(field(&record, area_fips)) else {
            continue;
        };

        rows.push(QcewRow {
            area_fips: fips,
            own_code: field(&record, own_code).to_string(),
            industry_code: field(&record, industry_code).to_string(),
            agglvl_code: agglvl,
            year: parse_number(field(&record, year))?,
            qtr: field(&record, qtr).to_string(),
            qtrly_estabs: parse_number(field(&record, qtrly_estabs))?,
            month3_emplvl: parse_number(field(&record, month3_emplvl))?,
            total_qtrly_wages: parse_number(field(&record, total_qtrly_wages))?,
            avg_wkly_wage: parse_number(field(&record, avg_wkly_wage))?,
        });
    }
    Ok(rows)
}

fn parse_number<T: FromStr>(value: &str) -> Result<T, FieldstatError> {
    value
        .parse::<T>()
        .map_err(|_| FieldstatError::QcewFormat(format!("non-numeric field: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
area_fips,own_code,industry_code,agglvl_code,size_code,year,qtr,qtrly_estabs,month3_emplvl,total_qtrly_wages,avg_wkly_wage
US000,0,10,10,0,2024,1,11000000,150000000,3000000000000,1500
01000,0,10,50,0,2024,1,120000,2000000,40000000000,1400
C1018,0,10,40,0,2024,1,5000,90000,1800000000,1350
01003,0,10,70,0,2024,1,6000,95000,1600000000,1250
01003,5,10,71,0,2024,1,5000,80000,1300000000,1200";

    #[test]
    fn keeps_only_county_levels() {
        let rows = parse_rows(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.area_fips.as_str() == "01003"));
        assert!(
            rows.iter()
                .all(|row| COUNTY_AGGLVL_RANGE.contains(&row.agglvl_code))
        );
    }

    #[test]
    fn missing_column_is_a_format_error() {
        let err = parse_rows("area_fips,year\n01003,2024").unwrap_err();
        assert!(matches!(err, FieldstatError::QcewFormat(_)));
    }
}
