//! Postal-code blocking to bound the fuzzy-match search space.

use std::collections::HashMap;

use crate::model::CandidateRecord;

/// Fixed blocking-key width. Zips are compared as string prefixes, never
/// numerically, so leading zeros stay significant.
pub const ZIP_WIDTH: usize = 5;

/// Normalize a raw postal value to the fixed-width blocking key.
pub fn zip5(raw: &str) -> String {
    raw.trim().chars().take(ZIP_WIDTH).collect()
}

/// Groups candidates by blocking key. A candidate lands in a bucket if
/// either its mailing or its physical-location zip matches; bucket order
/// follows source iteration order.
pub struct BlockingIndex<'a> {
    buckets: HashMap<String, Vec<&'a CandidateRecord>>,
}

impl<'a> BlockingIndex<'a> {
    pub fn build(candidates: &'a [CandidateRecord]) -> Self {
        let mut buckets: HashMap<String, Vec<&'a CandidateRecord>> = HashMap::new();

        for candidate in candidates {
            let mailing = zip5(&candidate.mailing_zip);
            let location = zip5(&candidate.location_zip);

            if !mailing.is_empty() {
                buckets.entry(mailing.clone()).or_default().push(candidate);
            }
            if !location.is_empty() && location != mailing {
                buckets.entry(location).or_default().push(candidate);
            }
        }

        Self { buckets }
    }

    /// Candidates sharing the query key. Empty when nothing blocks in,
    /// never an error.
    pub fn block(&self, zip: &str) -> &[&'a CandidateRecord] {
        self.buckets
            .get(&zip5(zip))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
