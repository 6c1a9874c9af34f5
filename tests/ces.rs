use assert_matches::assert_matches;

use fieldstat::ces::{parse_data, parse_series};
use fieldstat::error::FieldstatError;
use fieldstat::geography::{CountyRow, Geography, MsaRow};

fn geography() -> Geography {
    let counties = vec![CountyRow {
        name: "Dallas County".to_string(),
        state_abbreviation: "TX".to_string(),
        state_fips: "48".to_string(),
        county_fips: "113".to_string(),
        district_office: "Dallas District Office".to_string(),
        region: "Southwest Region".to_string(),
    }];
    let msas = vec![
        MsaRow {
            area_code: "19100".to_string(),
            district_office: Some("Dallas District Office".to_string()),
        },
        // Enumerated but assigned to no office.
        MsaRow {
            area_code: "99999".to_string(),
            district_office: None,
        },
    ];
    Geography::build(&counties, &msas).unwrap()
}

const SERIES: &str = "\
series_id\tstate_code\tarea_code\tsupersector_code\tindustry_code\tdata_type_code\tseasonal
SMU48191000000000001\t48\t19100\t00\t00000000\t01\tU
SMU48999990000000001\t48\t99999\t00\t00000000\t01\tU
SMU48264200000000001\t48\t26420\t00\t00000000\t01\tU";

#[test]
fn series_without_office_mapping_are_dropped_before_join() {
    let rows = parse_series(SERIES, &geography()).unwrap();
    // The zero-office MSA and the unknown area both drop out.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].series_id, "SMU48191000000000001");
    assert_eq!(rows[0].area_code, "19100");
    assert_eq!(
        rows[0].district_offices,
        vec!["Dallas District Office".to_string()]
    );
}

#[test]
fn data_rows_parse_with_suppressed_values() {
    let data = "\
series_id\tyear\tperiod\tvalue\tfootnote_codes
SMU48191000000000001\t2024\tM01\t1234.5\t
SMU48191000000000001\t2024\tM02\t \t";
    let rows = parse_data(data).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value, Some(1234.5));
    assert_eq!(rows[0].period, "M01");
    assert_eq!(rows[1].value, None);
}

#[test]
fn missing_column_is_a_format_error() {
    let err = parse_series("series_id\tarea_code\nX\t19100", &geography()).unwrap_err();
    assert_matches!(err, FieldstatError::CesFormat(_));
}

#[test]
fn non_numeric_year_is_a_format_error() {
    let data = "\
series_id\tyear\tperiod\tvalue\tfootnote_codes
SMU48191000000000001\tlast\tM01\t1.0\t";
    let err = parse_data(data).unwrap_err();
    assert_matches!(err, FieldstatError::CesFormat(_));
}
