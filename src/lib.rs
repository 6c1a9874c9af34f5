//! Labor-market statistics for a field-office hierarchy.
//!
//! Counties and metropolitan statistical areas are linked to district
//! offices (grouped into regional offices); published LAUS, QCEW, OEWS
//! and CES extracts are fetched once per process, cached in memory, and
//! filtered/aggregated to whichever office a caller asks about.

pub mod app;
pub mod cache;
pub mod ces;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod geography;
pub mod laus;
pub mod oews;
pub mod output;
pub mod qcew;
pub mod query;
pub mod registry;
pub mod tabular;
