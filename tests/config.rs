use assert_matches::assert_matches;

use fieldstat::config::ConfigLoader;
use fieldstat::error::FieldstatError;

#[test]
fn explicit_config_file_is_loaded() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("fieldstat.json");
    std::fs::write(
        &path,
        r#"{
            "county_reference": "reference/county_offices.csv",
            "endpoints": { "laus": "http://localhost:9000/laucntycur14.txt" }
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.county_reference, "reference/county_offices.csv");
    assert_eq!(resolved.msa_reference, "msa_offices.csv");
    assert_eq!(resolved.laus_url, "http://localhost:9000/laucntycur14.txt");
    assert!(resolved.qcew_url.contains("qtrly_singlefile.zip"));
}

#[test]
fn explicit_missing_path_is_an_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/fieldstat.json")).unwrap_err();
    assert_matches!(err, FieldstatError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("fieldstat.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, FieldstatError::ConfigParse(_));
}
