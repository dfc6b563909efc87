use std::collections::BTreeMap;

use crate::block::BlockingIndex;
use crate::config::LinkConfig;
use crate::crosswalk::Crosswalk;
use crate::crowd;
use crate::error::LinkError;
use crate::model::{
    BaseRow, CandidateRecord, LinkMeta, LinkResult, LinkSummary, MatchSource, SchoolRecord,
    WorkerResponse,
};
use crate::stage::{match_blocked_fuzzy, match_exact_key};

/// Pre-loaded inputs for one pipeline run. Locator candidates come from the
/// fetch cache; responses may be empty on the first pass (before the crowd
/// batch has been submitted and collected).
#[derive(Debug, Default)]
pub struct LinkInput {
    pub records: Vec<SchoolRecord>,
    pub base: Vec<BaseRow>,
    pub directory: Vec<CandidateRecord>,
    pub locator: Vec<CandidateRecord>,
    pub responses: Vec<WorkerResponse>,
}

/// Run the full linkage pipeline: base exact-key, directory blocked-fuzzy,
/// locator blocked-fuzzy, crowd consensus, then the weak-score filter and
/// duplicate resolution. Deterministic for fixed inputs.
pub fn run(config: &LinkConfig, input: &LinkInput) -> Result<LinkResult, LinkError> {
    let cutoff = config.match_cutoff;
    let mut crosswalk = Crosswalk::new();
    let mut pool: Vec<SchoolRecord> = input.records.clone();
    let total_records = pool.len();

    let results = match_exact_key(&pool, &input.base);
    pool = crosswalk.fold(pool, &results);

    let directory_index = BlockingIndex::build(&input.directory);
    let results = match_blocked_fuzzy(&pool, &directory_index, MatchSource::Directory, cutoff);
    pool = crosswalk.fold(pool, &results);

    let locator_index = BlockingIndex::build(&input.locator);
    let results = match_blocked_fuzzy(&pool, &locator_index, MatchSource::Locator, cutoff);
    pool = crosswalk.fold(pool, &results);

    let consensus = crowd::aggregate(&input.responses);
    pool = crosswalk.fold_consensus(pool, &consensus);

    crosswalk.drop_weak(cutoff);
    crosswalk.dedup();

    let summary = summarize(&crosswalk, total_records, pool.len());

    Ok(LinkResult {
        meta: LinkMeta {
            config_name: config.name.clone(),
            match_cutoff: cutoff,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        entries: crosswalk.entries,
        unresolved: pool,
    })
}

fn summarize(crosswalk: &Crosswalk, total_records: usize, unresolved: usize) -> LinkSummary {
    let mut source_counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in &crosswalk.entries {
        *source_counts.entry(entry.source.to_string()).or_insert(0) += 1;
    }

    LinkSummary {
        total_records,
        matched: crosswalk.entries.len(),
        unresolved,
        duplicate_flagged: crosswalk.duplicate_count(),
        source_counts,
    }
}
