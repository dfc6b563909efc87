//! Crosswalk export. The file written here is the system's sole durable
//! output and the next run's trusted base table, so the column set and row
//! order must stay byte-stable across runs over unchanged inputs.

use std::io::Write;
use std::path::Path;

use xwalk_link::error::LinkError;
use xwalk_link::model::{CrosswalkEntry, SchoolRecord};

const CROSSWALK_HEADER: [&str; 9] = [
    "ceeb", "nces_id", "name", "city", "state", "zip", "source", "score", "duplicate",
];

/// Write the final crosswalk table. Header is always written, even with
/// zero rows; null scores serialize as the empty string.
pub fn write_crosswalk(entries: &[CrosswalkEntry], out: impl Write) -> Result<(), LinkError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer
        .write_record(CROSSWALK_HEADER)
        .map_err(|e| LinkError::Io(format!("CSV write error: {e}")))?;

    for entry in entries {
        let score = entry.score.map(|s| s.to_string()).unwrap_or_default();
        writer
            .write_record([
                entry.ceeb.as_str(),
                entry.nces_id.as_str(),
                entry.name.as_str(),
                entry.city.as_str(),
                entry.state.as_str(),
                entry.zip.as_str(),
                entry.source.as_str(),
                score.as_str(),
                if entry.duplicate { "true" } else { "false" },
            ])
            .map_err(|e| LinkError::Io(format!("CSV write error: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| LinkError::Io(format!("CSV flush error: {e}")))
}

pub fn write_crosswalk_file(entries: &[CrosswalkEntry], path: &Path) -> Result<(), LinkError> {
    let file = std::fs::File::create(path)
        .map_err(|e| LinkError::Io(format!("cannot create {}: {e}", path.display())))?;
    write_crosswalk(entries, std::io::BufWriter::new(file))
}

/// Write the records left unresolved after every stage, the set submitted
/// to the crowd platform.
pub fn write_unresolved(records: &[SchoolRecord], out: impl Write) -> Result<(), LinkError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer
        .write_record(["ceeb", "name", "city", "state", "zip"])
        .map_err(|e| LinkError::Io(format!("CSV write error: {e}")))?;

    for record in records {
        writer
            .write_record([
                record.ceeb.as_str(),
                record.name.as_str(),
                record.city.as_str(),
                record.state.as_str(),
                record.zip.as_str(),
            ])
            .map_err(|e| LinkError::Io(format!("CSV write error: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| LinkError::Io(format!("CSV flush error: {e}")))
}

pub fn write_unresolved_file(records: &[SchoolRecord], path: &Path) -> Result<(), LinkError> {
    let file = std::fs::File::create(path)
        .map_err(|e| LinkError::Io(format!("cannot create {}: {e}", path.display())))?;
    write_unresolved(records, std::io::BufWriter::new(file))
}
