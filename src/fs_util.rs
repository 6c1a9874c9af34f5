use std::fs;
use std::io::{self, Read};
use std::path::Path;

use zip::ZipArchive;

use crate::error::FieldstatError;

/// Walks every entry once so a truncated or corrupt archive fails before
/// any of its content is consumed.
pub fn validate_zip(zip_path: &Path) -> Result<(), FieldstatError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        FieldstatError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| FieldstatError::Filesystem(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        io::copy(&mut entry, &mut io::sink())
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

/// Reads the first file entry with the given extension into a string.
/// Returns `None` when no entry matches.
pub fn read_zip_member(
    zip_path: &Path,
    extension: &str,
) -> Result<Option<String>, FieldstatError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        FieldstatError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| FieldstatError::Filesystem(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        if entry.is_dir() || !entry.name().to_lowercase().ends_with(extension) {
            continue;
        }
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|err| FieldstatError::Filesystem(err.to_string()))?;
        return Ok(Some(content));
    }
    Ok(None)
}
