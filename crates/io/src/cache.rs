//! Locator fetch cache: one JSON file per (year, zip) query, so a partial
//! fetch can resume without re-querying the service. Results are
//! deterministic for a fixed (year, zip) pair, which makes the cache safe
//! to reuse across re-runs.

use std::path::{Path, PathBuf};

use xwalk_link::error::LinkError;
use xwalk_link::model::CandidateRecord;

pub fn cache_path(dir: &Path, year: u16, zip: &str) -> PathBuf {
    dir.join(year.to_string()).join(format!("{zip}.json"))
}

pub fn is_cached(dir: &Path, year: u16, zip: &str) -> bool {
    cache_path(dir, year, zip).is_file()
}

/// Store one zip's unioned candidate rows.
pub fn store(
    dir: &Path,
    year: u16,
    zip: &str,
    rows: &[CandidateRecord],
) -> Result<(), LinkError> {
    let path = cache_path(dir, year, zip);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| LinkError::Io(format!("cannot create {}: {e}", parent.display())))?;
    }
    let json = serde_json::to_string_pretty(rows)
        .map_err(|e| LinkError::Io(format!("cache serialization error: {e}")))?;
    std::fs::write(&path, json)
        .map_err(|e| LinkError::Io(format!("cannot write {}: {e}", path.display())))
}

/// Load every cached zip under a cache directory, in sorted path order so
/// candidate iteration order (and fuzzy tie-breaking) is reproducible.
pub fn load_all(dir: &Path) -> Result<Vec<CandidateRecord>, LinkError> {
    let mut files = Vec::new();
    collect_json_files(dir, &mut files)?;
    files.sort();

    let mut rows = Vec::new();
    for path in files {
        let data = std::fs::read_to_string(&path)
            .map_err(|e| LinkError::Io(format!("cannot read {}: {e}", path.display())))?;
        let mut batch: Vec<CandidateRecord> = serde_json::from_str(&data)
            .map_err(|e| LinkError::Io(format!("bad cache file {}: {e}", path.display())))?;
        rows.append(&mut batch);
    }
    Ok(rows)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LinkError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| LinkError::Io(format!("cannot read {}: {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| LinkError::Io(e.to_string()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}
