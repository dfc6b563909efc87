//! The running crosswalk table: folds stage results in, tracks outstanding
//! records, and applies the quality filter + duplicate resolution.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{
    ConsensusAnswer, CrosswalkEntry, MatchOutcome, MatchResult, MatchSource, SchoolRecord,
};

#[derive(Debug, Default)]
pub struct Crosswalk {
    pub entries: Vec<CrosswalkEntry>,
}

impl Crosswalk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one stage's results into the table. Matched records become
    /// entries tagged with the stage's source; the rest come back as the
    /// still-outstanding pool for the next stage.
    pub fn fold(&mut self, pool: Vec<SchoolRecord>, results: &[MatchResult]) -> Vec<SchoolRecord> {
        let mut by_ceeb: HashMap<&str, &MatchResult> = HashMap::new();
        for result in results {
            by_ceeb.entry(result.ceeb.as_str()).or_insert(result);
        }

        let mut outstanding = Vec::new();
        for record in pool {
            let matched = by_ceeb.get(record.ceeb.as_str()).and_then(|r| {
                match &r.outcome {
                    MatchOutcome::Matched { nces_id, candidate_name, score } => {
                        Some((r.source, nces_id.clone(), candidate_name.clone(), *score))
                    }
                    MatchOutcome::Unmatched(_) => None,
                }
            });

            match matched {
                Some((source, nces_id, candidate_name, score)) => {
                    self.entries.push(CrosswalkEntry {
                        ceeb: record.ceeb,
                        nces_id,
                        name: record.name,
                        city: record.city,
                        state: record.state,
                        zip: record.zip,
                        source,
                        score,
                        duplicate: false,
                        matched_name: Some(candidate_name),
                    });
                }
                None => outstanding.push(record),
            }
        }
        outstanding
    }

    /// Fold crowd consensus answers in. Only positive identifications are
    /// merged; "not found" answers leave the record outstanding.
    pub fn fold_consensus(
        &mut self,
        pool: Vec<SchoolRecord>,
        answers: &[ConsensusAnswer],
    ) -> Vec<SchoolRecord> {
        let resolved: HashMap<&str, &str> = answers
            .iter()
            .filter_map(|a| a.nces_id.as_deref().map(|id| (a.ceeb.as_str(), id)))
            .collect();

        let mut outstanding = Vec::new();
        for record in pool {
            match resolved.get(record.ceeb.as_str()) {
                Some(nces_id) => {
                    self.entries.push(CrosswalkEntry {
                        ceeb: record.ceeb,
                        nces_id: (*nces_id).to_string(),
                        name: record.name,
                        city: record.city,
                        state: record.state,
                        zip: record.zip,
                        source: MatchSource::Crowd,
                        score: None,
                        duplicate: false,
                        matched_name: None,
                    });
                }
                None => outstanding.push(record),
            }
        }
        outstanding
    }

    /// Drop auxiliary-source rows whose score does not strictly exceed the
    /// cutoff. Base rows carry no score and are exempt; crowd rows are
    /// unscored and kept. Defense against a block holding only weak
    /// candidates.
    pub fn drop_weak(&mut self, cutoff: u8) {
        self.entries.retain(|entry| {
            entry.source == MatchSource::Base || entry.score.map_or(true, |s| s > cutoff)
        });
    }

    /// Duplicate resolution, applied once after all stages:
    /// group by CEEB; any group with more than one distinct (ceeb, nces_id)
    /// pair gets every member flagged and its name overwritten with the
    /// matched candidate name, then one row is kept per distinct pair.
    /// Final order is (ceeb, nces_id) for reproducible output.
    pub fn dedup(&mut self) {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            groups.entry(entry.ceeb.clone()).or_default().push(i);
        }

        for indices in groups.values() {
            let distinct: HashSet<&str> = indices
                .iter()
                .map(|&i| self.entries[i].nces_id.as_str())
                .collect();
            if distinct.len() > 1 {
                for &i in indices {
                    let entry = &mut self.entries[i];
                    entry.duplicate = true;
                    if let Some(matched) = entry.matched_name.clone() {
                        entry.name = matched;
                    }
                }
            }
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        self.entries.retain(|entry| {
            seen.insert((entry.ceeb.clone(), entry.nces_id.clone()))
        });
        self.entries
            .sort_by(|a, b| (&a.ceeb, &a.nces_id).cmp(&(&b.ceeb, &b.nces_id)));
    }

    pub fn duplicate_count(&self) -> usize {
        self.entries.iter().filter(|e| e.duplicate).count()
    }
}
