use assert_matches::assert_matches;

use fieldstat::domain::{AreaFips, CountyFips, Dataset, StateFips};
use fieldstat::error::FieldstatError;

#[test]
fn fips_fragments_concatenate_zero_padded() {
    let state: StateFips = "1".parse().unwrap();
    let county: CountyFips = "73".parse().unwrap();
    let combined = AreaFips::from_parts(&state, &county);
    assert_eq!(combined.as_str(), "01073");
}

#[test]
fn fips_fragments_reject_wrong_widths() {
    assert_matches!("481".parse::<StateFips>(), Err(FieldstatError::InvalidFips(_)));
    assert_matches!("1130".parse::<CountyFips>(), Err(FieldstatError::InvalidFips(_)));
    assert_matches!("4811".parse::<AreaFips>(), Err(FieldstatError::InvalidFips(_)));
    assert_matches!("4811a".parse::<AreaFips>(), Err(FieldstatError::InvalidFips(_)));
}

#[test]
fn dataset_names_round_trip() {
    for dataset in [
        Dataset::Laus,
        Dataset::Qcew,
        Dataset::OewsSeries,
        Dataset::OewsData,
        Dataset::CesSeries,
        Dataset::CesData,
    ] {
        assert_eq!(dataset.as_str().parse::<Dataset>().unwrap(), dataset);
    }
}

#[test]
fn unknown_dataset_is_rejected() {
    assert_matches!(
        "jolts".parse::<Dataset>(),
        Err(FieldstatError::InvalidDataset(_))
    );
}
