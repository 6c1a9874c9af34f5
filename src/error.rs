use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FieldstatError {
    #[error("unknown office: {name} (closest match: {suggestion})")]
    UnknownOffice { name: String, suggestion: String },

    #[error("reference data is inconsistent: {0}")]
    DataIntegrity(String),

    #[error("dangling reference in geography data: {0}")]
    MissingReference(String),

    #[error("invalid FIPS fragment: {0}")]
    InvalidFips(String),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error("unknown dataset: {0}")]
    InvalidDataset(String),

    #[error("dataset {0} cannot be aggregated across counties")]
    UnsupportedAggregation(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read reference file at {0}")]
    ReferenceRead(PathBuf),

    #[error("malformed reference table: {0}")]
    ReferenceFormat(String),

    #[error("LAUS request failed: {0}")]
    LausHttp(String),

    #[error("LAUS feed returned status {status}: {message}")]
    LausStatus { status: u16, message: String },

    #[error("malformed LAUS feed: {0}")]
    LausFormat(String),

    #[error("QCEW request failed: {0}")]
    QcewHttp(String),

    #[error("QCEW archive returned status {status}: {message}")]
    QcewStatus { status: u16, message: String },

    #[error("malformed QCEW archive: {0}")]
    QcewFormat(String),

    #[error("OEWS request failed: {0}")]
    OewsHttp(String),

    #[error("OEWS feed returned status {status}: {message}")]
    OewsStatus { status: u16, message: String },

    #[error("malformed OEWS feed: {0}")]
    OewsFormat(String),

    #[error("CES request failed: {0}")]
    CesHttp(String),

    #[error("CES feed returned status {status}: {message}")]
    CesStatus { status: u16, message: String },

    #[error("malformed CES feed: {0}")]
    CesFormat(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
