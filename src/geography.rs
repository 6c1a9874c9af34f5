use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::sync::Arc;

use camino::Utf8Path;
use csv::ReaderBuilder;
use serde::Serialize;
use tracing::debug;

use crate::domain::{AreaFips, CountyFips, OfficeKind, StateFips};
use crate::error::FieldstatError;
use crate::tabular::{ColumnMap, field};

/// Raw county assignment row as it appears in the county reference table.
#[derive(Debug, Clone)]
pub struct CountyRow {
    pub name: String,
    pub state_abbreviation: String,
    pub state_fips: String,
    pub county_fips: String,
    pub district_office: String,
    pub region: String,
}

/// Raw MSA membership row. A row with no office records the metro area in
/// the enumeration without assigning it anywhere.
#[derive(Debug, Clone)]
pub struct MsaRow {
    pub area_code: String,
    pub district_office: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct County {
    pub name: String,
    pub state_abbreviation: String,
    pub state_fips: StateFips,
    pub county_fips: CountyFips,
    pub fips: AreaFips,
    pub district_office: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetroArea {
    pub area_code: String,
    pub district_offices: BTreeSet<String>,
}

#[derive(Debug)]
pub struct DistrictOffice {
    pub name: String,
    pub region: String,
    pub counties: Vec<County>,
    pub metro_areas: Vec<MetroArea>,
}

impl DistrictOffice {
    pub fn county_fips_codes(&self) -> BTreeSet<AreaFips> {
        self.counties.iter().map(|county| county.fips.clone()).collect()
    }

    pub fn metro_area_codes(&self) -> BTreeSet<String> {
        self.metro_areas
            .iter()
            .map(|msa| msa.area_code.clone())
            .collect()
    }
}

#[derive(Debug)]
pub struct RegionalOffice {
    pub name: String,
    pub district_offices: Vec<Arc<DistrictOffice>>,
}

impl RegionalOffice {
    /// Set union across constituents. Shared metro areas collapse to a
    /// single entry, so a region never double-counts an area two of its
    /// district offices both serve.
    pub fn county_fips_codes(&self) -> BTreeSet<AreaFips> {
        self.district_offices
            .iter()
            .flat_map(|office| office.county_fips_codes())
            .collect()
    }

    pub fn metro_area_codes(&self) -> BTreeSet<String> {
        self.district_offices
            .iter()
            .flat_map(|office| office.metro_area_codes())
            .collect()
    }
}

/// An office of either kind, as handed out by the registry. All query
/// paths go through the shared `county_fips_codes`/`metro_area_codes`
/// views instead of branching on the concrete type.
#[derive(Debug, Clone)]
pub enum Office {
    District(Arc<DistrictOffice>),
    Regional(Arc<RegionalOffice>),
}

impl Office {
    pub fn name(&self) -> &str {
        match self {
            Office::District(office) => &office.name,
            Office::Regional(office) => &office.name,
        }
    }

    pub fn kind(&self) -> OfficeKind {
        match self {
            Office::District(_) => OfficeKind::District,
            Office::Regional(_) => OfficeKind::Regional,
        }
    }

    pub fn county_fips_codes(&self) -> BTreeSet<AreaFips> {
        match self {
            Office::District(office) => office.county_fips_codes(),
            Office::Regional(office) => office.county_fips_codes(),
        }
    }

    pub fn metro_area_codes(&self) -> BTreeSet<String> {
        match self {
            Office::District(office) => office.metro_area_codes(),
            Office::Regional(office) => office.metro_area_codes(),
        }
    }
}

/// The validated, immutable entity graph. Built once at process start;
/// no mutation API exists afterwards.
#[derive(Debug)]
pub struct Geography {
    counties: Vec<County>,
    metro_areas: Vec<MetroArea>,
    district_offices: BTreeMap<String, Arc<DistrictOffice>>,
    regional_offices: BTreeMap<String, Arc<RegionalOffice>>,
}

impl Geography {
    pub fn build(
        county_rows: &[CountyRow],
        msa_rows: &[MsaRow],
    ) -> Result<Self, FieldstatError> {
        let counties = build_counties(county_rows)?;
        let metro_areas = build_metro_areas(msa_rows);
        let district_offices = build_district_offices(county_rows, &counties, &metro_areas)?;

        for msa in &metro_areas {
            for office in &msa.district_offices {
                if !district_offices.contains_key(office) {
                    return Err(FieldstatError::MissingReference(format!(
                        "metro area {} is assigned to unknown district office {office}",
                        msa.area_code
                    )));
                }
            }
        }

        let regional_offices = build_regional_offices(&district_offices);

        debug!(
            counties = counties.len(),
            metro_areas = metro_areas.len(),
            district_offices = district_offices.len(),
            regional_offices = regional_offices.len(),
            "geography built"
        );

        Ok(Self {
            counties,
            metro_areas,
            district_offices,
            regional_offices,
        })
    }

    /// Loads and validates the graph from the two reference CSV tables.
    pub fn from_reference_files(
        county_path: &Utf8Path,
        msa_path: &Utf8Path,
    ) -> Result<Self, FieldstatError> {
        let county_rows = read_county_reference(county_path)?;
        let msa_rows = read_msa_reference(msa_path)?;
        Self::build(&county_rows, &msa_rows)
    }

    pub fn counties(&self) -> &[County] {
        &self.counties
    }

    /// Every metro area in the reference enumeration, including those
    /// assigned to no office.
    pub fn metro_areas(&self) -> &[MetroArea] {
        &self.metro_areas
    }

    pub fn district_offices(&self) -> impl Iterator<Item = &Arc<DistrictOffice>> {
        self.district_offices.values()
    }

    pub fn regional_offices(&self) -> impl Iterator<Item = &Arc<RegionalOffice>> {
        self.regional_offices.values()
    }

    pub fn district_office(&self, name: &str) -> Option<&Arc<DistrictOffice>> {
        self.district_offices.get(name)
    }

    pub fn regional_office(&self, name: &str) -> Option<&Arc<RegionalOffice>> {
        self.regional_offices.get(name)
    }

    /// District offices serving a metro area, by reference area code.
    pub fn metro_area_offices(&self, area_code: &str) -> Option<&BTreeSet<String>> {
        self.metro_areas
            .iter()
            .find(|msa| msa.area_code == area_code)
            .map(|msa| &msa.district_offices)
    }
}

fn build_counties(rows: &[CountyRow]) -> Result<Vec<County>, FieldstatError> {
    let mut counties = Vec::with_capacity(rows.len());
    for row in rows {
        if row.district_office.trim().is_empty() {
            return Err(FieldstatError::MissingReference(format!(
                "county {} has no district office assignment",
                row.name
            )));
        }
        if row.region.trim().is_empty() {
            return Err(FieldstatError::MissingReference(format!(
                "county {} ({}) has no regional office assignment",
                row.name, row.district_office
            )));
        }
        let state_fips: StateFips = row.state_fips.parse()?;
        let county_fips: CountyFips = row.county_fips.parse()?;
        let fips = AreaFips::from_parts(&state_fips, &county_fips);
        counties.push(County {
            name: row.name.trim().to_string(),
            state_abbreviation: row.state_abbreviation.trim().to_string(),
            state_fips,
            county_fips,
            fips,
            district_office: row.district_office.trim().to_string(),
        });
    }
    Ok(counties)
}

fn build_metro_areas(rows: &[MsaRow]) -> Vec<MetroArea> {
    let mut memberships: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in rows {
        let entry = memberships.entry(row.area_code.trim().to_string()).or_default();
        if let Some(office) = &row.district_office {
            let office = office.trim();
            if !office.is_empty() {
                entry.insert(office.to_string());
            }
        }
    }
    memberships
        .into_iter()
        .map(|(area_code, district_offices)| MetroArea {
            area_code,
            district_offices,
        })
        .collect()
}

fn build_district_offices(
    rows: &[CountyRow],
    counties: &[County],
    metro_areas: &[MetroArea],
) -> Result<BTreeMap<String, Arc<DistrictOffice>>, FieldstatError> {
    // Region assignment rides on the county rows; all counties grouped
    // under one district office must agree on it.
    let mut regions: BTreeMap<String, String> = BTreeMap::new();
    for row in rows {
        let office = row.district_office.trim();
        let region = row.region.trim();
        match regions.get(office) {
            None => {
                regions.insert(office.to_string(), region.to_string());
            }
            Some(existing) if existing != region => {
                return Err(FieldstatError::DataIntegrity(format!(
                    "district office {office} is assigned to both {existing} and {region}"
                )));
            }
            Some(_) => {}
        }
    }

    let mut grouped: BTreeMap<String, Vec<County>> = BTreeMap::new();
    for county in counties {
        grouped
            .entry(county.district_office.clone())
            .or_default()
            .push(county.clone());
    }

    let mut offices = BTreeMap::new();
    for (name, counties) in grouped {
        let region = regions
            .get(&name)
            .cloned()
            .ok_or_else(|| {
                FieldstatError::MissingReference(format!(
                    "district office {name} has no regional office assignment"
                ))
            })?;
        let metro_areas: Vec<MetroArea> = metro_areas
            .iter()
            .filter(|msa| msa.district_offices.contains(&name))
            .cloned()
            .collect();
        offices.insert(
            name.clone(),
            Arc::new(DistrictOffice {
                name,
                region,
                counties,
                metro_areas,
            }),
        );
    }
    Ok(offices)
}

fn build_regional_offices(
    district_offices: &BTreeMap<String, Arc<DistrictOffice>>,
) -> BTreeMap<String, Arc<RegionalOffice>> {
    let mut grouped: BTreeMap<String, Vec<Arc<DistrictOffice>>> = BTreeMap::new();
    for office in district_offices.values() {
        grouped
            .entry(office.region.clone())
            .or_default()
            .push(Arc::clone(office));
    }
    grouped
        .into_iter()
        .map(|(name, district_offices)| {
            (
                name.clone(),
                Arc::new(RegionalOffice {
                    name,
                    district_offices,
                }),
            )
        })
        .collect()
}

fn read_county_reference(path: &Utf8Path) -> Result<Vec<CountyRow>, FieldstatError> {
    let file = File::open(path.as_std_path())
        .map_err(|_| FieldstatError::ReferenceRead(path.as_std_path().to_path_buf()))?;
    let mut reader = ReaderBuilder::new().delimiter(b',').from_reader(file);
    let headers = reader
        .headers()
        .map_err(|err| FieldstatError::ReferenceFormat(err.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let name = columns
        .require("county_name")
        .map_err(FieldstatError::ReferenceFormat)?;
    let state = columns
        .require("state_abbreviation")
        .map_err(FieldstatError::ReferenceFormat)?;
    let state_fips = columns
        .require("state_fips")
        .map_err(FieldstatError::ReferenceFormat)?;
    let county_fips = columns
        .require("county_fips")
        .map_err(FieldstatError::ReferenceFormat)?;
    let district_office = columns
        .require("district_office")
        .map_err(FieldstatError::ReferenceFormat)?;
    let region = columns
        .require("regional_office")
        .map_err(FieldstatError::ReferenceFormat)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FieldstatError::ReferenceFormat(err.to_string()))?;
        rows.push(CountyRow {
            name: field(&record, name).to_string(),
            state_abbreviation: field(&record, state).to_string(),
            state_fips: field(&record, state_fips).to_string(),
            county_fips: field(&record, county_fips).to_string(),
            district_office: field(&record, district_office).to_string(),
            region: field(&record, region).to_string(),
        });
    }
    Ok(rows)
}

fn read_msa_reference(path: &Utf8Path) -> Result<Vec<MsaRow>, FieldstatError> {
    let file = File::open(path.as_std_path())
        .map_err(|_| FieldstatError::ReferenceRead(path.as_std_path().to_path_buf()))?;
    let mut reader = ReaderBuilder::new().delimiter(b',').from_reader(file);
    let headers = reader
        .headers()
        .map_err(|err| FieldstatError::ReferenceFormat(err.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let area_code = columns
        .require("area_code")
        .map_err(FieldstatError::ReferenceFormat)?;
    let district_office = columns
        .require("district_office")
        .map_err(FieldstatError::ReferenceFormat)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| FieldstatError::ReferenceFormat(err.to_string()))?;
        let office = field(&record, district_office);
        rows.push(MsaRow {
            area_code: field(&record, area_code).to_string(),
            district_office: (!office.is_empty()).then(|| office.to_string()),
        });
    }
    Ok(rows)
}
