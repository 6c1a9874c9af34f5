use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::OfficeKind;
use crate::error::FieldstatError;
use crate::geography::{Geography, Office};

/// Flat name -> office namespace across both office kinds.
#[derive(Debug)]
pub struct OfficeRegistry {
    offices: BTreeMap<String, Office>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfficeListing {
    pub regional: Vec<String>,
    pub district: Vec<String>,
}

impl OfficeRegistry {
    /// Fails if a district and a regional office share a name; the flat
    /// namespace cannot represent both.
    pub fn new(geography: &Geography) -> Result<Self, FieldstatError> {
        let mut offices = BTreeMap::new();
        for office in geography.district_offices() {
            offices.insert(office.name.clone(), Office::District(Arc::clone(office)));
        }
        for office in geography.regional_offices() {
            if offices
                .insert(office.name.clone(), Office::Regional(Arc::clone(office)))
                .is_some()
            {
                return Err(FieldstatError::DataIntegrity(format!(
                    "office name {} is used by both a district and a regional office",
                    office.name
                )));
            }
        }
        Ok(Self { offices })
    }

    /// Exact lookup. A miss reports the nearest registered name as a
    /// hint; it is never substituted for the caller's input.
    pub fn resolve(&self, name: &str) -> Result<Office, FieldstatError> {
        if let Some(office) = self.offices.get(name) {
            return Ok(office.clone());
        }
        let suggestion = self.nearest(name).unwrap_or_default();
        Err(FieldstatError::UnknownOffice {
            name: name.to_string(),
            suggestion,
        })
    }

    /// Both name lists, each lexicographically sorted. Partitioned by the
    /// entity kind carried on the office, not by name pattern.
    pub fn list(&self) -> OfficeListing {
        let mut regional = Vec::new();
        let mut district = Vec::new();
        for (name, office) in &self.offices {
            match office.kind() {
                OfficeKind::Regional => regional.push(name.clone()),
                OfficeKind::District => district.push(name.clone()),
            }
        }
        OfficeListing { regional, district }
    }

    fn nearest(&self, name: &str) -> Option<String> {
        // min_by_key keeps the first minimum; BTreeMap keys iterate in
        // lexicographic order, which fixes the tie-break.
        self.offices
            .keys()
            .min_by_key(|candidate| levenshtein(name, candidate))
            .cloned()
    }
}

/// Plain two-row edit distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ch_a) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, ch_b) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ch_a != ch_b);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("Dallas", "Dalls"), 1);
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(
            levenshtein("Atlanta District Office", "Atlanta Region"),
            levenshtein("Atlanta Region", "Atlanta District Office")
        );
    }
}
