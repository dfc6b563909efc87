use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A school as submitted on the exam-registration side. Immutable after load.
#[derive(Debug, Clone)]
pub struct SchoolRecord {
    pub ceeb: String,
    pub name: String,
    pub city: String,
    pub state: String,
    /// Normalized 5-character postal prefix. Leading zeros significant.
    pub zip: String,
}

/// A candidate school from a directory file or the locator service.
///
/// Carries two alternative blocking keys: a record blocks into a postal
/// bucket if either zip matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub nces_id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub mailing_zip: String,
    pub location_zip: String,
}

/// A row from the trusted base table (a previous run's crosswalk output).
/// Rows missing either identifier are excluded at match time, not at load.
#[derive(Debug, Clone)]
pub struct BaseRow {
    pub ceeb: String,
    pub nces_id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

// ---------------------------------------------------------------------------
// Match stage output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Base,
    Directory,
    Locator,
    Crowd,
    Unmatched,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Directory => "directory",
            Self::Locator => "locator",
            Self::Crowd => "crowd",
            Self::Unmatched => "unmatched",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a record came out of a stage without a match. Kept explicit so
/// callers can tell "no candidates" from "lookup failed" even though both
/// leave the record outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    NotInBase,
    EmptyBlock,
    BelowCutoff { best: u8 },
    LookupFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched {
        nces_id: String,
        candidate_name: String,
        /// None for trusted (unscored) sources.
        score: Option<u8>,
    },
    Unmatched(UnmatchedReason),
}

/// One result per input record per stage attempt. Superseded, not mutated,
/// by later stages.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub ceeb: String,
    pub source: MatchSource,
    pub outcome: MatchOutcome,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self.outcome, MatchOutcome::Matched { .. })
    }
}

// ---------------------------------------------------------------------------
// Crosswalk
// ---------------------------------------------------------------------------

/// One row of the accumulated crosswalk table.
#[derive(Debug, Clone, Serialize)]
pub struct CrosswalkEntry {
    pub ceeb: String,
    pub nces_id: String,
    /// Canonical name. Starts as the submitted name; overwritten with the
    /// matched candidate name when the entry lands in a duplicate group.
    pub name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub source: MatchSource,
    pub score: Option<u8>,
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Crowd resolution
// ---------------------------------------------------------------------------

/// A single worker's raw answer for one record. Transient aggregator input.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub worker_id: String,
    pub ceeb: String,
    pub answer: String,
    pub approved: bool,
}

/// Majority-vote resolution for one record. `None` means no confident
/// resolution (the "NA" sentinel); only positive identifications are
/// folded back into the crosswalk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusAnswer {
    pub ceeb: String,
    pub nces_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LinkSummary {
    pub total_records: usize,
    pub matched: usize,
    pub unresolved: usize,
    pub duplicate_flagged: usize,
    pub source_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkMeta {
    pub config_name: String,
    pub match_cutoff: u8,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkResult {
    pub meta: LinkMeta,
    pub summary: LinkSummary,
    pub entries: Vec<CrosswalkEntry>,
    /// Records still outstanding after every stage: the crowd export set.
    #[serde(skip)]
    pub unresolved: Vec<SchoolRecord>,
}
