//! Typed CSV loaders, one per input source. Column layouts come from the
//! run config; rows missing a required identifier are skipped and counted,
//! never fatal.

use xwalk_link::block::zip5;
use xwalk_link::config::{CandidateColumns, CrowdColumns, RecordColumns};
use xwalk_link::error::LinkError;
use xwalk_link::model::{BaseRow, CandidateRecord, SchoolRecord, WorkerResponse};

use crate::csv::sniff_delimiter;

/// Loader output: parsed rows plus the count of rows dropped for missing
/// identifiers, so callers can report without failing.
#[derive(Debug)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

fn reader_for(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn header_index(
    headers: &csv::StringRecord,
    source: &str,
    column: &str,
) -> Result<usize, LinkError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| LinkError::MissingColumn {
            source: source.into(),
            column: column.into(),
        })
}

fn field(record: &csv::StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

/// Load exam-registration records. Rows without a CEEB code are skipped.
pub fn load_school_records(
    content: &str,
    columns: &RecordColumns,
) -> Result<Loaded<SchoolRecord>, LinkError> {
    let mut reader = reader_for(content);
    let headers = reader
        .headers()
        .map_err(|e| LinkError::Io(e.to_string()))?
        .clone();

    let ceeb_idx = header_index(&headers, "records", &columns.ceeb)?;
    let name_idx = header_index(&headers, "records", &columns.name)?;
    let city_idx = header_index(&headers, "records", &columns.city)?;
    let state_idx = header_index(&headers, "records", &columns.state)?;
    let zip_idx = header_index(&headers, "records", &columns.zip)?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    for record in reader.records() {
        let record = record.map_err(|e| LinkError::Io(e.to_string()))?;
        let ceeb = field(&record, ceeb_idx);
        if ceeb.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(SchoolRecord {
            ceeb,
            name: field(&record, name_idx),
            city: field(&record, city_idx),
            state: field(&record, state_idx),
            zip: zip5(&field(&record, zip_idx)),
        });
    }

    Ok(Loaded { rows, skipped })
}

/// Load a candidate directory file. Rows without an NCES ID are skipped.
pub fn load_candidates(
    content: &str,
    columns: &CandidateColumns,
    source: &str,
) -> Result<Loaded<CandidateRecord>, LinkError> {
    let mut reader = reader_for(content);
    let headers = reader
        .headers()
        .map_err(|e| LinkError::Io(e.to_string()))?
        .clone();

    let nces_idx = header_index(&headers, source, &columns.nces_id)?;
    let name_idx = header_index(&headers, source, &columns.name)?;
    let city_idx = header_index(&headers, source, &columns.city)?;
    let state_idx = header_index(&headers, source, &columns.state)?;
    let mailing_idx = header_index(&headers, source, &columns.mailing_zip)?;
    let location_idx = header_index(&headers, source, &columns.location_zip)?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    for record in reader.records() {
        let record = record.map_err(|e| LinkError::Io(e.to_string()))?;
        let nces_id = field(&record, nces_idx);
        if nces_id.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(CandidateRecord {
            nces_id,
            name: field(&record, name_idx),
            city: field(&record, city_idx),
            state: field(&record, state_idx),
            mailing_zip: field(&record, mailing_idx),
            location_zip: field(&record, location_idx),
        });
    }

    Ok(Loaded { rows, skipped })
}

/// Load the trusted base table, a previous run's crosswalk output. Rows
/// missing either identifier stay in: the exact-key stage excludes them.
pub fn load_base_rows(content: &str) -> Result<Vec<BaseRow>, LinkError> {
    let mut reader = reader_for(content);
    let headers = reader
        .headers()
        .map_err(|e| LinkError::Io(e.to_string()))?
        .clone();

    let ceeb_idx = header_index(&headers, "base", "ceeb")?;
    let nces_idx = header_index(&headers, "base", "nces_id")?;
    let name_idx = header_index(&headers, "base", "name")?;
    let city_idx = header_index(&headers, "base", "city")?;
    let state_idx = header_index(&headers, "base", "state")?;
    let zip_idx = header_index(&headers, "base", "zip")?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LinkError::Io(e.to_string()))?;
        rows.push(BaseRow {
            ceeb: field(&record, ceeb_idx),
            nces_id: field(&record, nces_idx),
            name: field(&record, name_idx),
            city: field(&record, city_idx),
            state: field(&record, state_idx),
            zip: zip5(&field(&record, zip_idx)),
        });
    }

    Ok(rows)
}

/// Load crowd worker responses. The platform's approval flag is parsed here;
/// unapproved rows are kept but never counted by the aggregator.
pub fn load_worker_responses(
    content: &str,
    columns: &CrowdColumns,
) -> Result<Vec<WorkerResponse>, LinkError> {
    let mut reader = reader_for(content);
    let headers = reader
        .headers()
        .map_err(|e| LinkError::Io(e.to_string()))?
        .clone();

    let worker_idx = header_index(&headers, "crowd", &columns.worker_id)?;
    let ceeb_idx = header_index(&headers, "crowd", &columns.ceeb)?;
    let answer_idx = header_index(&headers, "crowd", &columns.answer)?;
    let approved_idx = header_index(&headers, "crowd", &columns.approved)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LinkError::Io(e.to_string()))?;
        rows.push(WorkerResponse {
            worker_id: field(&record, worker_idx),
            ceeb: field(&record, ceeb_idx),
            answer: record.get(answer_idx).unwrap_or("").to_string(),
            approved: is_truthy(&field(&record, approved_idx)),
        });
    }

    Ok(rows)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "approved" | "x"
    )
}
