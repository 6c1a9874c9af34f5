use std::sync::{Arc, Mutex, PoisonError};

use crate::ces::{CesDataRow, CesSeriesRow};
use crate::domain::Dataset;
use crate::error::FieldstatError;
use crate::laus::LausRow;
use crate::oews::{OewsDataRow, OewsSeriesRow};
use crate::qcew::QcewRow;

/// One lazily-populated snapshot slot. The mutex is held for the whole
/// load, so concurrent callers block until the first fetch finishes and
/// at most one fetch per slot happens per process lifetime. A failed load
/// leaves the slot empty; the next call runs the loader again.
#[derive(Debug)]
pub struct Slot<T> {
    state: Mutex<Option<Arc<T>>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }
}

impl<T> Slot<T> {
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<T>, FieldstatError>
    where
        F: FnOnce() -> Result<T, FieldstatError>,
    {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = guard.as_ref() {
            return Ok(Arc::clone(snapshot));
        }
        let snapshot = Arc::new(load()?);
        *guard = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub fn is_loaded(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Six independent slots, one per published extract. Owned by the
/// application and passed to whatever needs it; there is no module-level
/// state, no expiry and no refresh — a fresh process picks up new
/// upstream data.
#[derive(Debug, Default)]
pub struct DatasetCache {
    pub laus: Slot<Vec<LausRow>>,
    pub qcew: Slot<Vec<QcewRow>>,
    pub oews_series: Slot<Vec<OewsSeriesRow>>,
    pub oews_data: Slot<Vec<OewsDataRow>>,
    pub ces_series: Slot<Vec<CesSeriesRow>>,
    pub ces_data: Slot<Vec<CesDataRow>>,
}

impl DatasetCache {
    pub fn is_loaded(&self, dataset: Dataset) -> bool {
        match dataset {
            Dataset::Laus => self.laus.is_loaded(),
            Dataset::Qcew => self.qcew.is_loaded(),
            Dataset::OewsSeries => self.oews_series.is_loaded(),
            Dataset::OewsData => self.oews_data.is_loaded(),
            Dataset::CesSeries => self.ces_series.is_loaded(),
            Dataset::CesData => self.ces_data.is_loaded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn loads_once() {
        let slot: Slot<Vec<u32>> = Slot::default();
        let mut calls = 0;
        let first = slot
            .get_or_load(|| {
                calls += 1;
                Ok(vec![1, 2, 3])
            })
            .unwrap();
        let second = slot
            .get_or_load(|| {
                calls += 1;
                Ok(vec![9])
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(*first, vec![1, 2, 3]);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_load_leaves_slot_empty() {
        let slot: Slot<Vec<u32>> = Slot::default();
        let err = slot
            .get_or_load(|| Err(FieldstatError::LausHttp("connection refused".to_string())))
            .unwrap_err();
        assert_matches!(err, FieldstatError::LausHttp(_));
        assert!(!slot.is_loaded());

        let recovered = slot.get_or_load(|| Ok(vec![7])).unwrap();
        assert_eq!(*recovered, vec![7]);
        assert!(slot.is_loaded());
    }
}
