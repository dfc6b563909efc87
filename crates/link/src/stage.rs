//! Match stages: exact-key lookup against the trusted base table, and
//! blocked fuzzy matching against a candidate source.
//!
//! Every input record appears in the output exactly once, matched or not,
//! so stages chain: one stage's unmatched set is the next stage's input.

use std::collections::HashMap;

use crate::block::{zip5, BlockingIndex};
use crate::error::LinkError;
use crate::model::{
    BaseRow, CandidateRecord, MatchOutcome, MatchResult, MatchSource, SchoolRecord,
    UnmatchedReason,
};
use crate::similar::score;

/// A source of candidate blocks. Lookup failures are per-record: an `Err`
/// degrades that one record to unmatched without aborting the stage.
pub trait CandidateProvider {
    fn block(&self, zip: &str) -> Result<Vec<&CandidateRecord>, LinkError>;
}

impl CandidateProvider for BlockingIndex<'_> {
    fn block(&self, zip: &str) -> Result<Vec<&CandidateRecord>, LinkError> {
        Ok(BlockingIndex::block(self, zip).to_vec())
    }
}

/// Look each record up in the trusted base table by CEEB code. Base rows
/// missing either identifier are excluded before lookup; on duplicate base
/// keys the first row in source order wins. Matches carry no score.
pub fn match_exact_key(unmatched: &[SchoolRecord], base: &[BaseRow]) -> Vec<MatchResult> {
    let mut lookup: HashMap<&str, &BaseRow> = HashMap::new();
    for row in base {
        if row.ceeb.is_empty() || row.nces_id.is_empty() {
            continue;
        }
        lookup.entry(row.ceeb.as_str()).or_insert(row);
    }

    unmatched
        .iter()
        .map(|record| match lookup.get(record.ceeb.as_str()) {
            Some(row) => MatchResult {
                ceeb: record.ceeb.clone(),
                source: MatchSource::Base,
                outcome: MatchOutcome::Matched {
                    nces_id: row.nces_id.clone(),
                    candidate_name: row.name.clone(),
                    score: None,
                },
            },
            None => MatchResult {
                ceeb: record.ceeb.clone(),
                source: MatchSource::Unmatched,
                outcome: MatchOutcome::Unmatched(UnmatchedReason::NotInBase),
            },
        })
        .collect()
}

/// Fuzzy-match each record against its postal block. The best-scoring
/// candidate wins (ties broken by first occurrence in source order) and is
/// accepted only if its score strictly exceeds `cutoff`.
pub fn match_blocked_fuzzy(
    unmatched: &[SchoolRecord],
    provider: &impl CandidateProvider,
    source: MatchSource,
    cutoff: u8,
) -> Vec<MatchResult> {
    unmatched
        .iter()
        .map(|record| {
            let outcome = match provider.block(&zip5(&record.zip)) {
                Err(e) => MatchOutcome::Unmatched(UnmatchedReason::LookupFailed(e.to_string())),
                Ok(block) if block.is_empty() => {
                    MatchOutcome::Unmatched(UnmatchedReason::EmptyBlock)
                }
                Ok(block) => best_in_block(record, &block, cutoff),
            };
            let source = if matches!(outcome, MatchOutcome::Matched { .. }) {
                source
            } else {
                MatchSource::Unmatched
            };
            MatchResult {
                ceeb: record.ceeb.clone(),
                source,
                outcome,
            }
        })
        .collect()
}

fn best_in_block(
    record: &SchoolRecord,
    block: &[&CandidateRecord],
    cutoff: u8,
) -> MatchOutcome {
    let mut best: Option<(u8, &CandidateRecord)> = None;
    for candidate in block {
        let s = score(&record.name, &candidate.name);
        // Strict > keeps the first of tied candidates
        if best.map_or(true, |(bs, _)| s > bs) {
            best = Some((s, candidate));
        }
    }

    match best {
        Some((s, candidate)) if s > cutoff => MatchOutcome::Matched {
            nces_id: candidate.nces_id.clone(),
            candidate_name: candidate.name.clone(),
            score: Some(s),
        },
        Some((s, _)) => MatchOutcome::Unmatched(UnmatchedReason::BelowCutoff { best: s }),
        None => MatchOutcome::Unmatched(UnmatchedReason::EmptyBlock),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ceeb: &str, name: &str, zip: &str) -> SchoolRecord {
        SchoolRecord {
            ceeb: ceeb.into(),
            name: name.into(),
            city: "Boulder".into(),
            state: "CO".into(),
            zip: zip.into(),
        }
    }

    fn base_row(ceeb: &str, nces_id: &str, name: &str) -> BaseRow {
        BaseRow {
            ceeb: ceeb.into(),
            nces_id: nces_id.into(),
            name: name.into(),
            city: "Boulder".into(),
            state: "CO".into(),
            zip: "80301".into(),
        }
    }

    fn candidate(nces_id: &str, name: &str, zip: &str) -> CandidateRecord {
        CandidateRecord {
            nces_id: nces_id.into(),
            name: name.into(),
            city: "Boulder".into(),
            state: "CO".into(),
            mailing_zip: zip.into(),
            location_zip: String::new(),
        }
    }

    struct FailingProvider;

    impl CandidateProvider for FailingProvider {
        fn block(&self, _zip: &str) -> Result<Vec<&CandidateRecord>, LinkError> {
            Err(LinkError::Lookup("provider unavailable".into()))
        }
    }

    #[test]
    fn exact_key_hit_is_unscored() {
        let records = vec![record("100", "Central High School", "80301")];
        let base = vec![base_row("100", "X", "Central HS")];
        let results = match_exact_key(&records, &base);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, MatchSource::Base);
        match &results[0].outcome {
            MatchOutcome::Matched { nces_id, score, .. } => {
                assert_eq!(nces_id, "X");
                assert!(score.is_none());
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn exact_key_skips_rows_missing_identifiers() {
        let records = vec![record("100", "Central", "80301")];
        let base = vec![base_row("100", "", "Central")];
        let results = match_exact_key(&records, &base);
        assert_eq!(
            results[0].outcome,
            MatchOutcome::Unmatched(UnmatchedReason::NotInBase)
        );
    }

    #[test]
    fn exact_key_first_base_row_wins_on_duplicate_key() {
        let records = vec![record("100", "Central", "80301")];
        let base = vec![base_row("100", "FIRST", "Central"), base_row("100", "SECOND", "Central")];
        let results = match_exact_key(&records, &base);
        match &results[0].outcome {
            MatchOutcome::Matched { nces_id, .. } => assert_eq!(nces_id, "FIRST"),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn fuzzy_accepts_above_cutoff() {
        let records = vec![record("200", "Central HS", "80301")];
        let candidates = vec![candidate("X", "Central High School", "80301")];
        let index = BlockingIndex::build(&candidates);
        let results = match_blocked_fuzzy(&records, &index, MatchSource::Directory, 70);

        assert_eq!(results[0].source, MatchSource::Directory);
        assert!(results[0].is_matched());
        match &results[0].outcome {
            MatchOutcome::Matched { nces_id, score, .. } => {
                assert_eq!(nces_id, "X");
                assert!(score.unwrap() > 70);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn fuzzy_rejects_at_or_below_cutoff() {
        let records = vec![record("200", "Central", "80301")];
        let candidates = vec![candidate("X", "Pacific Maritime Institute", "80301")];
        let index = BlockingIndex::build(&candidates);
        let results = match_blocked_fuzzy(&records, &index, MatchSource::Directory, 70);

        assert_eq!(results[0].source, MatchSource::Unmatched);
        assert!(!results[0].is_matched());
        assert!(matches!(
            results[0].outcome,
            MatchOutcome::Unmatched(UnmatchedReason::BelowCutoff { .. })
        ));
    }

    #[test]
    fn fuzzy_rejects_score_exactly_at_cutoff() {
        // "washington" vs "wellington": 3 edits over 10 chars scores exactly 70
        let records = vec![record("200", "Washington High School", "80301")];
        let candidates = vec![candidate("X", "Wellington High School", "80301")];
        let index = BlockingIndex::build(&candidates);
        let results = match_blocked_fuzzy(&records, &index, MatchSource::Directory, 70);

        assert_eq!(results[0].source, MatchSource::Unmatched);
        assert_eq!(
            results[0].outcome,
            MatchOutcome::Unmatched(UnmatchedReason::BelowCutoff { best: 70 })
        );
    }

    #[test]
    fn fuzzy_empty_block_is_unmatched() {
        let records = vec![record("300", "Remote Academy", "99999")];
        let candidates = vec![candidate("X", "Central High School", "80301")];
        let index = BlockingIndex::build(&candidates);
        let results = match_blocked_fuzzy(&records, &index, MatchSource::Directory, 70);

        assert_eq!(
            results[0].outcome,
            MatchOutcome::Unmatched(UnmatchedReason::EmptyBlock)
        );
    }

    #[test]
    fn fuzzy_lookup_failure_degrades_single_record() {
        let records = vec![record("200", "Central", "80301"), record("201", "Other", "80302")];
        let results = match_blocked_fuzzy(&records, &FailingProvider, MatchSource::Locator, 70);

        assert_eq!(results.len(), 2);
        for r in &results {
            assert!(matches!(
                r.outcome,
                MatchOutcome::Unmatched(UnmatchedReason::LookupFailed(_))
            ));
        }
    }

    #[test]
    fn fuzzy_tie_broken_by_source_order() {
        let records = vec![record("200", "Central High School", "80301")];
        // Identical names, identical scores; first in source order must win
        let candidates = vec![
            candidate("FIRST", "Central High School", "80301"),
            candidate("SECOND", "Central High School", "80301"),
        ];
        let index = BlockingIndex::build(&candidates);
        let results = match_blocked_fuzzy(&records, &index, MatchSource::Directory, 70);

        match &results[0].outcome {
            MatchOutcome::Matched { nces_id, .. } => assert_eq!(nces_id, "FIRST"),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn every_input_record_yields_exactly_one_result() {
        let records: Vec<SchoolRecord> = (0..10)
            .map(|i| record(&format!("{i}"), "Some Name", "80301"))
            .collect();
        let index = BlockingIndex::build(&[]);
        let results = match_blocked_fuzzy(&records, &index, MatchSource::Directory, 70);
        assert_eq!(results.len(), records.len());

        let base: Vec<BaseRow> = vec![];
        let results = match_exact_key(&records, &base);
        assert_eq!(results.len(), records.len());
    }
}
