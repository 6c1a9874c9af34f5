use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::DatasetCache;
use crate::ces::{self, CesClient, CesDataRow, CesSeriesRow};
use crate::domain::{Dataset, OfficeKind};
use crate::error::FieldstatError;
use crate::geography::{Geography, Office};
use crate::laus::{self, LausClient, LausRow};
use crate::oews::{self, OewsClient, OewsDataRow, OewsSeriesRow};
use crate::qcew::{self, QcewClient, QcewRow};
use crate::query::{self, Table};
use crate::registry::{OfficeListing, OfficeRegistry};

/// Resolution summary handed to callers that want office details without
/// walking the entity graph.
#[derive(Debug, Clone, Serialize)]
pub struct OfficeInfo {
    pub name: String,
    pub kind: OfficeKind,
    pub region: Option<String>,
    pub district_offices: Vec<String>,
    pub counties: usize,
    pub metro_areas: usize,
}

impl From<&Office> for OfficeInfo {
    fn from(office: &Office) -> Self {
        match office {
            Office::District(district) => Self {
                name: district.name.clone(),
                kind: OfficeKind::District,
                region: Some(district.region.clone()),
                district_offices: Vec::new(),
                counties: district.counties.len(),
                metro_areas: district.metro_areas.len(),
            },
            Office::Regional(regional) => Self {
                name: regional.name.clone(),
                kind: OfficeKind::Regional,
                region: None,
                district_offices: regional
                    .district_offices
                    .iter()
                    .map(|district| district.name.clone())
                    .collect(),
                counties: regional.county_fips_codes().len(),
                metro_areas: regional.metro_area_codes().len(),
            },
        }
    }
}

/// The public query surface: owns the immutable geography, the office
/// registry, the dataset cache and the four retrieval clients. Clients
/// are generic so tests can count fetches with doubles.
pub struct App<L: LausClient, Q: QcewClient, O: OewsClient, C: CesClient> {
    geography: Geography,
    registry: OfficeRegistry,
    cache: DatasetCache,
    laus: L,
    qcew: Q,
    oews: O,
    ces: C,
}

impl<L: LausClient, Q: QcewClient, O: OewsClient, C: CesClient> App<L, Q, O, C> {
    pub fn new(
        geography: Geography,
        laus: L,
        qcew: Q,
        oews: O,
        ces: C,
    ) -> Result<Self, FieldstatError> {
        let registry = OfficeRegistry::new(&geography)?;
        Ok(Self {
            geography,
            registry,
            cache: DatasetCache::default(),
            laus,
            qcew,
            oews,
            ces,
        })
    }

    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    pub fn resolve_office(&self, name: &str) -> Result<Office, FieldstatError> {
        self.registry.resolve(name)
    }

    pub fn list_offices(&self) -> OfficeListing {
        self.registry.list()
    }

    /// Runs a query against an already-resolved office. `aggregate`
    /// falls back to the dataset's default; only LAUS supports summing.
    pub fn query(
        &self,
        dataset: Dataset,
        office: &Office,
        aggregate: Option<bool>,
    ) -> Result<Table, FieldstatError> {
        let aggregate = aggregate.unwrap_or_else(|| dataset.default_aggregate());
        if aggregate && dataset != Dataset::Laus {
            return Err(FieldstatError::UnsupportedAggregation(dataset.to_string()));
        }
        debug!(dataset = %dataset, office = office.name(), aggregate, "query");

        match dataset {
            Dataset::Laus => {
                let rows = self.ensure_laus()?;
                Ok(query::query_laus(&rows, office, aggregate))
            }
            Dataset::Qcew => {
                let rows = self.ensure_qcew()?;
                Ok(query::query_qcew(&rows, office))
            }
            Dataset::OewsSeries => {
                let series = self.ensure_oews_series()?;
                Ok(query::query_oews_series(&series, office))
            }
            Dataset::OewsData => {
                let series = self.ensure_oews_series()?;
                let data = self.ensure_oews_data()?;
                Ok(query::query_oews_data(&series, &data, office))
            }
            Dataset::CesSeries => {
                let series = self.ensure_ces_series()?;
                Ok(query::query_ces_series(&series, office))
            }
            Dataset::CesData => {
                let series = self.ensure_ces_series()?;
                let data = self.ensure_ces_data()?;
                Ok(query::query_ces_data(&series, &data, office))
            }
        }
    }

    /// Resolves the office name first; an unknown name surfaces the
    /// suggestion error before any dataset is fetched.
    pub fn query_by_name(
        &self,
        dataset: Dataset,
        office_name: &str,
        aggregate: Option<bool>,
    ) -> Result<Table, FieldstatError> {
        let office = self.resolve_office(office_name)?;
        self.query(dataset, &office, aggregate)
    }

    pub fn ensure_laus(&self) -> Result<Arc<Vec<LausRow>>, FieldstatError> {
        self.cache.laus.get_or_load(|| laus::load_laus(&self.laus))
    }

    pub fn ensure_qcew(&self) -> Result<Arc<Vec<QcewRow>>, FieldstatError> {
        self.cache.qcew.get_or_load(|| qcew::load_qcew(&self.qcew))
    }

    pub fn ensure_oews_series(&self) -> Result<Arc<Vec<OewsSeriesRow>>, FieldstatError> {
        self.cache
            .oews_series
            .get_or_load(|| oews::load_series(&self.oews, &self.geography))
    }

    pub fn ensure_oews_data(&self) -> Result<Arc<Vec<OewsDataRow>>, FieldstatError> {
        self.cache.oews_data.get_or_load(|| oews::load_data(&self.oews))
    }

    pub fn ensure_ces_series(&self) -> Result<Arc<Vec<CesSeriesRow>>, FieldstatError> {
        self.cache
            .ces_series
            .get_or_load(|| ces::load_series(&self.ces, &self.geography))
    }

    pub fn ensure_ces_data(&self) -> Result<Arc<Vec<CesDataRow>>, FieldstatError> {
        self.cache.ces_data.get_or_load(|| ces::load_data(&self.ces))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::geography::CountyRow;

    struct StaticLaus(&'static str);

    impl LausClient for StaticLaus {
        fn fetch_feed(&self) -> Result<String, FieldstatError> {
            Ok(self.0.to_string())
        }
    }

    struct NopQcew;

    impl QcewClient for NopQcew {
        fn download_archive(&self, _destination: &Path) -> Result<(), FieldstatError> {
            Err(FieldstatError::QcewHttp("not configured".to_string()))
        }
    }

    struct NopOews;

    impl OewsClient for NopOews {
        fn fetch_series(&self) -> Result<String, FieldstatError> {
            Err(FieldstatError::OewsHttp("not configured".to_string()))
        }

        fn fetch_data(&self) -> Result<String, FieldstatError> {
            Err(FieldstatError::OewsHttp("not configured".to_string()))
        }
    }

    struct NopCes;

    impl CesClient for NopCes {
        fn fetch_series(&self) -> Result<String, FieldstatError> {
            Err(FieldstatError::CesHttp("not configured".to_string()))
        }

        fn fetch_data(&self) -> Result<String, FieldstatError> {
            Err(FieldstatError::CesHttp("not configured".to_string()))
        }
    }

    fn county(name: &str, county_fips: &str, office: &str) -> CountyRow {
        CountyRow {
            name: name.to_string(),
            state_abbreviation: "AL".to_string(),
            state_fips: "01".to_string(),
            county_fips: county_fips.to_string(),
            district_office: office.to_string(),
            region: "Southeast Region".to_string(),
        }
    }

    const FEED: &str = "\
LAUS Area Code | State FIPS | County FIPS | Area Title | Period | CLF | Employed | Unemployed | Rate
---
---
---
---
---
CN0100300000000|01|003|Baldwin County, AL|Aug-23|100000|97000|3000|3.0
CN0100500000000|01|005|Barbour County, AL|Aug-23|50000|48000|2000|4.0
footer
footer
footer";

    #[test]
    fn laus_query_aggregates_by_default() {
        let geography = Geography::build(
            &[
                county("Baldwin County", "003", "Mobile District Office"),
                county("Barbour County", "005", "Mobile District Office"),
            ],
            &[],
        )
        .unwrap();
        let app = App::new(geography, StaticLaus(FEED), NopQcew, NopOews, NopCes).unwrap();

        let office = app.resolve_office("Mobile District Office").unwrap();
        let table = app.query(Dataset::Laus, &office, None).unwrap();
        match table {
            Table::LausSummary(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].civilian_labor_force, 150_000);
                assert_eq!(rows[0].unemployed, 5_000);
            }
            other => panic!("expected summary table, got {other:?}"),
        }
    }

    #[test]
    fn aggregation_outside_laus_is_rejected() {
        let geography = Geography::build(
            &[county("Baldwin County", "003", "Mobile District Office")],
            &[],
        )
        .unwrap();
        let app = App::new(geography, StaticLaus(FEED), NopQcew, NopOews, NopCes).unwrap();
        let office = app.resolve_office("Mobile District Office").unwrap();

        let err = app.query(Dataset::Qcew, &office, Some(true)).unwrap_err();
        assert!(matches!(err, FieldstatError::UnsupportedAggregation(_)));
    }
}
