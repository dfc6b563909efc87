use std::collections::HashMap;
use std::path::PathBuf;

use xwalk_io::cache;
use xwalk_io::csv::read_file_as_utf8;
use xwalk_io::load::{
    load_base_rows, load_candidates, load_school_records, load_worker_responses,
};
use xwalk_io::write::{write_crosswalk, write_unresolved};
use xwalk_link::model::{CrosswalkEntry, MatchSource};
use xwalk_link::{LinkConfig, LinkInput, LinkResult};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_input(config: &LinkConfig) -> LinkInput {
    let dir = fixtures_dir();
    let mut input = LinkInput::default();

    let content = read_file_as_utf8(&dir.join(&config.inputs.records.file)).unwrap();
    input.records = load_school_records(&content, &config.inputs.records.columns)
        .unwrap()
        .rows;

    if let Some(ref base) = config.inputs.base {
        let content = read_file_as_utf8(&dir.join(&base.file)).unwrap();
        input.base = load_base_rows(&content).unwrap();
    }

    if let Some(ref directory) = config.inputs.directory {
        let content = read_file_as_utf8(&dir.join(&directory.file)).unwrap();
        input.directory = load_candidates(&content, &directory.columns, "directory")
            .unwrap()
            .rows;
    }

    if let Some(ref cache_dir) = config.inputs.locator_cache {
        input.locator = cache::load_all(&dir.join(cache_dir)).unwrap();
    }

    if let Some(ref crowd) = config.inputs.crowd {
        let content = read_file_as_utf8(&dir.join(&crowd.file)).unwrap();
        input.responses = load_worker_responses(&content, &crowd.columns).unwrap();
    }

    input
}

fn load_and_run() -> LinkResult {
    let toml = std::fs::read_to_string(fixtures_dir().join("crosswalk.toml")).unwrap();
    let config = LinkConfig::from_toml(&toml).unwrap();
    let input = load_input(&config);
    xwalk_link::run(&config, &input).unwrap()
}

fn by_ceeb(result: &LinkResult) -> HashMap<&str, &CrosswalkEntry> {
    result.entries.iter().map(|e| (e.ceeb.as_str(), e)).collect()
}

// -------------------------------------------------------------------------
// Full pipeline over fixture files
// -------------------------------------------------------------------------

#[test]
fn full_pipeline_resolves_each_record_through_its_stage() {
    let result = load_and_run();

    assert_eq!(result.summary.total_records, 5);
    assert_eq!(result.summary.matched, 4);
    assert_eq!(result.summary.unresolved, 1);

    let entries = by_ceeb(&result);

    // 100 is in the base table: exact-key match, no similarity score
    assert_eq!(entries["100"].source, MatchSource::Base);
    assert_eq!(entries["100"].nces_id, "X0001");
    assert!(entries["100"].score.is_none());

    // 200 fuzzy-matches the misspelled directory row within its zip block
    assert_eq!(entries["200"].source, MatchSource::Directory);
    assert_eq!(entries["200"].nces_id, "Y0002");
    assert!(entries["200"].score.unwrap() > 70);
    assert_eq!(entries["200"].name, "Centennial High School");
    assert_eq!(entries["200"].matched_name.as_deref(), Some("Centenial High School"));

    // 400's zip only exists in the locator cache
    assert_eq!(entries["400"].source, MatchSource::Locator);
    assert_eq!(entries["400"].nces_id, "Z0003");

    // 300 has no candidates anywhere but 3 of 4 approved workers agree
    assert_eq!(entries["300"].source, MatchSource::Crowd);
    assert_eq!(entries["300"].nces_id, "1234567");
    assert!(entries["300"].score.is_none());

    // 500's zip has no block in any source and no crowd answer
    assert_eq!(result.unresolved.len(), 1);
    assert_eq!(result.unresolved[0].ceeb, "500");
}

#[test]
fn summary_counts_by_source() {
    let result = load_and_run();
    let counts = &result.summary.source_counts;

    assert_eq!(counts.get("base"), Some(&1));
    assert_eq!(counts.get("directory"), Some(&1));
    assert_eq!(counts.get("locator"), Some(&1));
    assert_eq!(counts.get("crowd"), Some(&1));
    assert_eq!(result.summary.duplicate_flagged, 0);
}

#[test]
fn entries_sorted_by_ceeb_then_nces() {
    let result = load_and_run();
    let ceebs: Vec<&str> = result.entries.iter().map(|e| e.ceeb.as_str()).collect();
    let mut sorted = ceebs.clone();
    sorted.sort();
    assert_eq!(ceebs, sorted);
}

// -------------------------------------------------------------------------
// Output contract
// -------------------------------------------------------------------------

#[test]
fn crosswalk_output_feeds_next_run_as_base_table() {
    let result = load_and_run();

    let mut buf = Vec::new();
    write_crosswalk(&result.entries, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let base = load_base_rows(&text).unwrap();
    assert_eq!(base.len(), 4);

    // Second run against the written crosswalk alone: every previously
    // matched record resolves through the exact-key stage
    let config = LinkConfig::from_toml(
        r#"
name = "second pass"

[inputs.records]
file = "records.csv"

[inputs.base]
file = "unused.csv"
"#,
    )
    .unwrap();

    let content = read_file_as_utf8(&fixtures_dir().join("records.csv")).unwrap();
    let input = LinkInput {
        records: load_school_records(&content, &config.inputs.records.columns)
            .unwrap()
            .rows,
        base,
        ..Default::default()
    };

    let second = xwalk_link::run(&config, &input).unwrap();
    assert_eq!(second.summary.matched, 4);
    assert_eq!(second.summary.unresolved, 1);
    for entry in &second.entries {
        assert_eq!(entry.source, MatchSource::Base);
        assert!(entry.score.is_none());
    }
}

#[test]
fn identical_runs_write_identical_bytes() {
    let a = load_and_run();
    let b = load_and_run();

    let mut buf_a = Vec::new();
    let mut buf_b = Vec::new();
    write_crosswalk(&a.entries, &mut buf_a).unwrap();
    write_crosswalk(&b.entries, &mut buf_b).unwrap();
    assert_eq!(buf_a, buf_b);
}

#[test]
fn unresolved_export_is_the_crowd_submission_set() {
    let result = load_and_run();

    let mut buf = Vec::new();
    write_unresolved(&result.unresolved, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ceeb,name,city,state,zip"));
    assert_eq!(lines.next(), Some("500,Lonely Frontier School,Wisdom,MT,59761"));
    assert_eq!(lines.next(), None);
}
