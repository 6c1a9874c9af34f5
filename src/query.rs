use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::ces::{CesDataRow, CesSeriesRow};
use crate::domain::AreaFips;
use crate::geography::Office;
use crate::laus::LausRow;
use crate::oews::{OewsDataRow, OewsSeriesRow};
use crate::qcew::QcewRow;

/// One LAUS row per county per period, rate re-derived from the row's
/// own counts.
#[derive(Debug, Clone, Serialize)]
pub struct LausAreaRow {
    pub fips: AreaFips,
    pub area_title: String,
    pub period: NaiveDate,
    pub civilian_labor_force: u64,
    pub employed: u64,
    pub unemployed: u64,
    pub unemployment_rate: f64,
}

/// One LAUS row per period, counts summed over the office's counties and
/// the rate derived from the sums. Averaging the per-county rates would
/// overweight small counties.
#[derive(Debug, Clone, Serialize)]
pub struct LausSummaryRow {
    pub period: NaiveDate,
    pub civilian_labor_force: u64,
    pub employed: u64,
    pub unemployed: u64,
    pub unemployment_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OewsObservation {
    pub series_id: String,
    pub area_code: String,
    pub occupation_code: String,
    pub datatype_code: String,
    pub district_offices: Vec<String>,
    pub year: Option<u16>,
    pub period: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CesObservation {
    pub series_id: String,
    pub state_code: String,
    pub area_code: String,
    pub industry_code: String,
    pub data_type_code: String,
    pub district_offices: Vec<String>,
    pub year: Option<u16>,
    pub period: Option<String>,
    pub value: Option<f64>,
}

/// Query output: typed rows behind one rendering surface. Serializes to
/// a plain JSON row array.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Table {
    LausAreas(Vec<LausAreaRow>),
    LausSummary(Vec<LausSummaryRow>),
    Qcew(Vec<QcewRow>),
    OewsSeries(Vec<OewsSeriesRow>),
    OewsData(Vec<OewsObservation>),
    CesSeries(Vec<CesSeriesRow>),
    CesData(Vec<CesObservation>),
}

impl Table {
    pub fn len(&self) -> usize {
        match self {
            Table::LausAreas(rows) => rows.len(),
            Table::LausSummary(rows) => rows.len(),
            Table::Qcew(rows) => rows.len(),
            Table::OewsSeries(rows) => rows.len(),
            Table::OewsData(rows) => rows.len(),
            Table::CesSeries(rows) => rows.len(),
            Table::CesData(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn truncate(&mut self, limit: usize) {
        match self {
            Table::LausAreas(rows) => rows.truncate(limit),
            Table::LausSummary(rows) => rows.truncate(limit),
            Table::Qcew(rows) => rows.truncate(limit),
            Table::OewsSeries(rows) => rows.truncate(limit),
            Table::OewsData(rows) => rows.truncate(limit),
            Table::CesSeries(rows) => rows.truncate(limit),
            Table::CesData(rows) => rows.truncate(limit),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::LausAreas(_) => &[
                "fips",
                "area_title",
                "period",
                "civilian_labor_force",
                "employed",
                "unemployed",
                "unemployment_rate",
            ],
            Table::LausSummary(_) => &[
                "period",
                "civilian_labor_force",
                "employed",
                "unemployed",
                "unemployment_rate",
            ],
            Table::Qcew(_) => &[
                "area_fips",
                "own_code",
                "industry_code",
                "agglvl_code",
                "year",
                "qtr",
                "qtrly_estabs",
                "month3_emplvl",
                "total_qtrly_wages",
                "avg_wkly_wage",
            ],
            Table::OewsSeries(_) => &[
                "series_id",
                "area_code",
                "occupation_code",
                "datatype_code",
                "district_offices",
            ],
            Table::OewsData(_) => &[
                "series_id",
                "area_code",
                "occupation_code",
                "datatype_code",
                "district_offices",
                "year",
                "period",
                "value",
            ],
            Table::CesSeries(_) => &[
                "series_id",
                "state_code",
                "area_code",
                "industry_code",
                "data_type_code",
                "district_offices",
            ],
            Table::CesData(_) => &[
                "series_id",
                "state_code",
                "area_code",
                "industry_code",
                "data_type_code",
                "district_offices",
                "year",
                "period",
                "value",
            ],
        }
    }

    /// Cell-rendered rows for plain-text output; missing observation
    /// fields render as empty cells.
    pub fn rows(&self) -> Vec<Vec<String>> {
        match self {
            Table::LausAreas(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.fips.to_string(),
                        row.area_title.clone(),
                        row.period.to_string(),
                        row.civilian_labor_force.to_string(),
                        row.employed.to_string(),
                        row.unemployed.to_string(),
                        format!("{:.2}", row.unemployment_rate),
                    ]
                })
                .collect(),
            Table::LausSummary(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.period.to_string(),
                        row.civilian_labor_force.to_string(),
                        row.employed.to_string(),
                        row.unemployed.to_string(),
                        format!("{:.2}", row.unemployment_rate),
                    ]
                })
                .collect(),
            Table::Qcew(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.area_fips.to_string(),
                        row.own_code.clone(),
                        row.industry_code.clone(),
                        row.agglvl_code.to_string(),
                        row.year.to_string(),
                        row.qtr.clone(),
                        row.qtrly_estabs.to_string(),
                        row.month3_emplvl.to_string(),
                        row.total_qtrly_wages.to_string(),
                        row.avg_wkly_wage.to_string(),
                    ]
                })
                .collect(),
            Table::OewsSeries(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.series_id.clone(),
                        row.area_code.clone(),
                        row.occupation_code.clone(),
                        row.datatype_code.clone(),
                        row.district_offices.join("; "),
                    ]
                })
                .collect(),
            Table::OewsData(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.series_id.clone(),
                        row.area_code.clone(),
                        row.occupation_code.clone(),
                        row.datatype_code.clone(),
                        row.district_offices.join("; "),
                        render_opt(row.year),
                        row.period.clone().unwrap_or_default(),
                        render_opt(row.value),
                    ]
                })
                .collect(),
            Table::CesSeries(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.series_id.clone(),
                        row.state_code.clone(),
                        row.area_code.clone(),
                        row.industry_code.clone(),
                        row.data_type_code.clone(),
                        row.district_offices.join("; "),
                    ]
                })
                .collect(),
            Table::CesData(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        row.series_id.clone(),
                        row.state_code.clone(),
                        row.area_code.clone(),
                        row.industry_code.clone(),
                        row.data_type_code.clone(),
                        row.district_offices.join("; "),
                        render_opt(row.year),
                        row.period.clone().unwrap_or_default(),
                        render_opt(row.value),
                    ]
                })
                .collect(),
        }
    }
}

fn render_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|inner| inner.to_string()).unwrap_or_default()
}

/// Rate in percent from raw counts. A zero labor force yields a zero
/// rate rather than a division error.
pub fn derive_unemployment_rate(unemployed: u64, civilian_labor_force: u64) -> f64 {
    if civilian_labor_force == 0 {
        return 0.0;
    }
    unemployed as f64 / civilian_labor_force as f64 * 100.0
}

pub fn query_laus(rows: &[LausRow], office: &Office, aggregate: bool) -> Table {
    let fips = office.county_fips_codes();
    let filtered: Vec<&LausRow> = rows.iter().filter(|row| fips.contains(&row.fips)).collect();
    if aggregate {
        Table::LausSummary(aggregate_laus(&filtered))
    } else {
        Table::LausAreas(
            filtered
                .iter()
                .map(|row| LausAreaRow {
                    fips: row.fips.clone(),
                    area_title: row.area_title.clone(),
                    period: row.period,
                    civilian_labor_force: row.civilian_labor_force,
                    employed: row.employed,
                    unemployed: row.unemployed,
                    unemployment_rate: derive_unemployment_rate(
                        row.unemployed,
                        row.civilian_labor_force,
                    ),
                })
                .collect(),
        )
    }
}

fn aggregate_laus(rows: &[&LausRow]) -> Vec<LausSummaryRow> {
    let mut periods: BTreeMap<NaiveDate, (u64, u64, u64)> = BTreeMap::new();
    for row in rows {
        let entry = periods.entry(row.period).or_default();
        entry.0 += row.civilian_labor_force;
        entry.1 += row.employed;
        entry.2 += row.unemployed;
    }
    periods
        .into_iter()
        .map(
            |(period, (civilian_labor_force, employed, unemployed))| LausSummaryRow {
                period,
                civilian_labor_force,
                employed,
                unemployed,
                unemployment_rate: derive_unemployment_rate(unemployed, civilian_labor_force),
            },
        )
        .collect()
}

pub fn query_qcew(rows: &[QcewRow], office: &Office) -> Table {
    let fips = office.county_fips_codes();
    Table::Qcew(
        rows.iter()
            .filter(|row| fips.contains(&row.area_fips))
            .cloned()
            .collect(),
    )
}

pub fn query_oews_series(rows: &[OewsSeriesRow], office: &Office) -> Table {
    Table::OewsSeries(filter_oews_series(rows, office))
}

/// Left join of the office-filtered series against the full observation
/// table: a series without observations keeps one row with empty value
/// fields, an observation without a filtered series contributes nothing.
pub fn query_oews_data(
    series: &[OewsSeriesRow],
    data: &[OewsDataRow],
    office: &Office,
) -> Table {
    let filtered = filter_oews_series(series, office);
    let mut by_series: HashMap<&str, Vec<&OewsDataRow>> = HashMap::new();
    for row in data {
        by_series.entry(row.series_id.as_str()).or_default().push(row);
    }

    let mut joined = Vec::new();
    for series_row in &filtered {
        match by_series.get(series_row.series_id.as_str()) {
            Some(observations) => {
                for observation in observations {
                    joined.push(OewsObservation {
                        series_id: series_row.series_id.clone(),
                        area_code: series_row.area_code.clone(),
                        occupation_code: series_row.occupation_code.clone(),
                        datatype_code: series_row.datatype_code.clone(),
                        district_offices: series_row.district_offices.clone(),
                        year: Some(observation.year),
                        period: Some(observation.period.clone()),
                        value: observation.value,
                    });
                }
            }
            None => joined.push(OewsObservation {
                series_id: series_row.series_id.clone(),
                area_code: series_row.area_code.clone(),
                occupation_code: series_row.occupation_code.clone(),
                datatype_code: series_row.datatype_code.clone(),
                district_offices: series_row.district_offices.clone(),
                year: None,
                period: None,
                value: None,
            }),
        }
    }
    Table::OewsData(joined)
}

pub fn query_ces_series(rows: &[CesSeriesRow], office: &Office) -> Table {
    Table::CesSeries(filter_ces_series(rows, office))
}

pub fn query_ces_data(series: &[CesSeriesRow], data: &[CesDataRow], office: &Office) -> Table {
    let filtered = filter_ces_series(series, office);
    let mut by_series: HashMap<&str, Vec<&CesDataRow>> = HashMap::new();
    for row in data {
        by_series.entry(row.series_id.as_str()).or_default().push(row);
    }

    let mut joined = Vec::new();
    for series_row in &filtered {
        match by_series.get(series_row.series_id.as_str()) {
            Some(observations) => {
                for observation in observations {
                    joined.push(CesObservation {
                        series_id: series_row.series_id.clone(),
                        state_code: series_row.state_code.clone(),
                        area_code: series_row.area_code.clone(),
                        industry_code: series_row.industry_code.clone(),
                        data_type_code: series_row.data_type_code.clone(),
                        district_offices: series_row.district_offices.clone(),
                        year: Some(observation.year),
                        period: Some(observation.period.clone()),
                        value: observation.value,
                    });
                }
            }
            None => joined.push(CesObservation {
                series_id: series_row.series_id.clone(),
                state_code: series_row.state_code.clone(),
                area_code: series_row.area_code.clone(),
                industry_code: series_row.industry_code.clone(),
                data_type_code: series_row.data_type_code.clone(),
                district_offices: series_row.district_offices.clone(),
                year: None,
                period: None,
                value: None,
            }),
        }
    }
    Table::CesData(joined)
}

fn filter_oews_series(rows: &[OewsSeriesRow], office: &Office) -> Vec<OewsSeriesRow> {
    let areas = office.metro_area_codes();
    rows.iter()
        .filter(|row| areas.contains(&row.area_code))
        .cloned()
        .collect()
}

fn filter_ces_series(rows: &[CesSeriesRow], office: &Office) -> Vec<CesSeriesRow> {
    let areas = office.metro_area_codes();
    rows.iter()
        .filter(|row| areas.contains(&row.area_code))
        .cloned()
        .collect()
}
