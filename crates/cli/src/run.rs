//! `xwalk run`: config-driven execution of the linkage pipeline.

use std::path::{Path, PathBuf};

use xwalk_io::cache;
use xwalk_io::csv::read_file_as_utf8;
use xwalk_link::{LinkConfig, LinkInput};

use crate::exit_codes::{EXIT_RUN_INVALID_CONFIG, EXIT_RUN_RUNTIME, EXIT_RUN_UNRESOLVED};
use crate::CliError;

fn run_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| run_err(EXIT_RUN_RUNTIME, format!("cannot read config: {e}")))?;
    let config = LinkConfig::from_toml(&config_str)
        .map_err(|e| run_err(EXIT_RUN_INVALID_CONFIG, e.to_string()))?;

    // File paths resolve relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let input = load_input(&config, base_dir)?;

    let result = xwalk_link::run(&config, &input)
        .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;

    if let Some(ref path) = config.output.crosswalk {
        let path = base_dir.join(path);
        xwalk_io::write::write_crosswalk_file(&result.entries, &path)
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = config.output.unresolved {
        let path = base_dir.join(path);
        xwalk_io::write::write_unresolved_file(&result.unresolved, &path)
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
        eprintln!("wrote {}", path.display());
    }

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| run_err(EXIT_RUN_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "crosswalk: {} records: {} matched, {} unresolved, {} flagged duplicate",
        s.total_records, s.matched, s.unresolved, s.duplicate_flagged,
    );
    for (source, count) in &s.source_counts {
        eprintln!("  {source}: {count}");
    }

    if s.unresolved > 0 {
        return Err(run_err(
            EXIT_RUN_UNRESOLVED,
            format!("{} record(s) left for crowd resolution", s.unresolved),
        ));
    }

    Ok(())
}

fn load_input(config: &LinkConfig, base_dir: &Path) -> Result<LinkInput, CliError> {
    let mut input = LinkInput::default();

    let records_path = base_dir.join(&config.inputs.records.file);
    let content = read_file_as_utf8(&records_path)
        .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
    let loaded = xwalk_io::load_school_records(&content, &config.inputs.records.columns)
        .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
    if loaded.skipped > 0 {
        eprintln!("note: skipped {} record(s) missing a CEEB code", loaded.skipped);
    }
    input.records = loaded.rows;

    if let Some(ref base) = config.inputs.base {
        let content = read_file_as_utf8(&base_dir.join(&base.file))
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
        input.base = xwalk_io::load_base_rows(&content)
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
    }

    if let Some(ref directory) = config.inputs.directory {
        let content = read_file_as_utf8(&base_dir.join(&directory.file))
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
        let loaded = xwalk_io::load_candidates(&content, &directory.columns, "directory")
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
        if loaded.skipped > 0 {
            eprintln!("note: skipped {} directory row(s) missing an NCES ID", loaded.skipped);
        }
        input.directory = loaded.rows;
    }

    if let Some(ref cache_dir) = config.inputs.locator_cache {
        input.locator = cache::load_all(&base_dir.join(cache_dir))
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
    }

    if let Some(ref crowd) = config.inputs.crowd {
        let content = read_file_as_utf8(&base_dir.join(&crowd.file))
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
        input.responses = xwalk_io::load_worker_responses(&content, &crowd.columns)
            .map_err(|e| run_err(EXIT_RUN_RUNTIME, e.to_string()))?;
    }

    Ok(input)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| run_err(EXIT_RUN_RUNTIME, format!("cannot read config: {e}")))?;

    match LinkConfig::from_toml(&config_str) {
        Ok(config) => {
            let mut sources = Vec::new();
            if config.inputs.base.is_some() {
                sources.push("base");
            }
            if config.inputs.directory.is_some() {
                sources.push("directory");
            }
            if config.inputs.locator_cache.is_some() {
                sources.push("locator");
            }
            if config.inputs.crowd.is_some() {
                sources.push("crowd");
            }
            eprintln!(
                "valid: '{}', cutoff {}, sources: {}",
                config.name,
                config.match_cutoff,
                sources.join(", "),
            );
            Ok(())
        }
        Err(e) => Err(run_err(EXIT_RUN_INVALID_CONFIG, e.to_string())),
    }
}
