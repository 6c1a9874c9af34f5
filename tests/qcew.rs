use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use fieldstat::error::FieldstatError;
use fieldstat::qcew::{QcewClient, load_qcew};

const SINGLEFILE: &str = "\
area_fips,own_code,industry_code,agglvl_code,size_code,year,qtr,qtrly_estabs,month3_emplvl,total_qtrly_wages,avg_wkly_wage
US000,0,10,10,0,2024,1,11000000,150000000,3000000000000,1500
01000,0,10,50,0,2024,1,120000,2000000,40000000000,1400
C1018,5,10,42,0,2024,1,4000,80000,1500000000,1300
01003,0,10,70,0,2024,1,6000,95000,1600000000,1250
01003,5,102,74,0,2024,1,3000,40000,700000000,1150
48113,5,10,71,0,2024,1,70000,1300000,30000000000,1700";

/// Serves a zip built on the fly; counts downloads.
#[derive(Clone)]
struct ArchiveQcew {
    member_name: &'static str,
    calls: Arc<Mutex<usize>>,
}

impl ArchiveQcew {
    fn new(member_name: &'static str) -> Self {
        Self {
            member_name,
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

impl QcewClient for ArchiveQcew {
    fn download_archive(&self, destination: &Path) -> Result<(), FieldstatError> {
        *self.calls.lock().unwrap() += 1;
        let file = File::create(destination)
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        let mut writer = ZipWriter::new(file);
        writer
            .start_file(self.member_name, SimpleFileOptions::default())
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        writer
            .write_all(SINGLEFILE.as_bytes())
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        writer
            .finish()
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[test]
fn archive_parses_to_county_rows_only() {
    let client = ArchiveQcew::new("2024.q1.singlefile.csv");
    let rows = load_qcew(&client).unwrap();

    // National, state and MSA roll-ups are filtered out.
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| (70..=78).contains(&row.agglvl_code)));
    assert_eq!(rows[0].area_fips.as_str(), "01003");
    assert_eq!(rows[2].area_fips.as_str(), "48113");
    assert_eq!(rows[2].total_qtrly_wages, 30_000_000_000);
    assert_eq!(*client.calls.lock().unwrap(), 1);
}

#[test]
fn archive_without_csv_member_is_a_format_error() {
    let client = ArchiveQcew::new("readme.txt");
    let err = load_qcew(&client).unwrap_err();
    assert_matches!(err, FieldstatError::QcewFormat(_));
}

struct FailingQcew;

impl QcewClient for FailingQcew {
    fn download_archive(&self, _destination: &Path) -> Result<(), FieldstatError> {
        Err(FieldstatError::QcewStatus {
            status: 503,
            message: "maintenance window".to_string(),
        })
    }
}

#[test]
fn transport_failure_surfaces_unchanged() {
    let err = load_qcew(&FailingQcew).unwrap_err();
    assert_matches!(err, FieldstatError::QcewStatus { status: 503, .. });
}

struct LeakCheckQcew {
    seen_path: Arc<Mutex<Option<PathBuf>>>,
}

impl QcewClient for LeakCheckQcew {
    fn download_archive(&self, destination: &Path) -> Result<(), FieldstatError> {
        *self.seen_path.lock().unwrap() = Some(destination.to_path_buf());
        ArchiveQcew::new("data.csv").download_archive(destination)
    }
}

#[test]
fn archive_tempfile_is_removed_after_parsing() {
    let seen_path = Arc::new(Mutex::new(None));
    let client = LeakCheckQcew {
        seen_path: Arc::clone(&seen_path),
    };
    load_qcew(&client).unwrap();

    let path = seen_path.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
}
