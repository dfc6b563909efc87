//! `xwalk fetch`: pull candidate data from the locator service into the
//! local per-(year, zip) cache.
//!
//! The service is queried once per zip in each of its two modes (mailing
//! zip, physical-location zip); results are unioned and deduplicated by
//! NCES ID. Already-cached zips are skipped, so an interrupted fetch
//! resumes where it left off. A failing zip is reported and skipped;
//! its records simply stay unmatched downstream.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Subcommand;
use serde::Deserialize;

use xwalk_io::cache;
use xwalk_link::block::zip5;
use xwalk_link::model::CandidateRecord;

use crate::exit_codes::{
    EXIT_FETCH_RATE_LIMIT, EXIT_FETCH_UPSTREAM, EXIT_FETCH_VALIDATION,
};
use crate::CliError;

const MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = concat!("xwalk/", env!("CARGO_PKG_VERSION"));

#[derive(Subcommand)]
pub enum FetchCommands {
    /// Fetch school directory rows from the locator service, by postal code
    #[command(after_help = "\
Examples:
  xwalk fetch locator --year 2024 --zip 80301 --cache-dir locator-cache
  xwalk fetch locator --year 2024 --zips zips.txt --cache-dir locator-cache
  XWALK_LOCATOR_URL=https://locator.example/api xwalk fetch locator --year 2024 --zips zips.txt --cache-dir cache")]
    Locator {
        /// Directory year to query
        #[arg(long)]
        year: u16,

        /// Postal code to fetch (repeatable)
        #[arg(long)]
        zip: Vec<String>,

        /// File with one postal code per line
        #[arg(long)]
        zips: Option<PathBuf>,

        /// Cache directory (one JSON file per zip; cached zips are skipped)
        #[arg(long)]
        cache_dir: PathBuf,

        /// Locator service base URL
        #[arg(long, env = "XWALK_LOCATOR_URL")]
        base_url: String,

        /// Suppress progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

pub fn cmd_fetch(cmd: FetchCommands) -> Result<(), CliError> {
    match cmd {
        FetchCommands::Locator { year, zip, zips, cache_dir, base_url, quiet } => {
            cmd_fetch_locator(year, zip, zips, cache_dir, base_url, quiet)
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocatorPage {
    results: Vec<CandidateRecord>,
    #[serde(default)]
    next_page: Option<u32>,
}

fn cmd_fetch_locator(
    year: u16,
    zip_flags: Vec<String>,
    zips_file: Option<PathBuf>,
    cache_dir: PathBuf,
    base_url: String,
    quiet: bool,
) -> Result<(), CliError> {
    let mut zips: Vec<String> = zip_flags.iter().map(|z| zip5(z)).collect();
    if let Some(ref path) = zips_file {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
        zips.extend(parse_zip_list(&content));
    }
    zips.retain(|z| !z.is_empty());
    zips.dedup();

    if zips.is_empty() {
        return Err(CliError::args("no postal codes given (use --zip or --zips)"));
    }

    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CliError::io(format!("cannot build HTTP client: {e}")))?;

    let mut fetched = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for zip in &zips {
        if cache::is_cached(&cache_dir, year, zip) {
            skipped += 1;
            continue;
        }

        match fetch_zip(&http, &base_url, year, zip) {
            Ok(rows) => {
                cache::store(&cache_dir, year, zip, &rows)
                    .map_err(|e| CliError::io(e.to_string()))?;
                if !quiet {
                    eprintln!("{zip}: {} candidate(s)", rows.len());
                }
                fetched += 1;
            }
            Err(e) => {
                eprintln!("warning: {zip}: {} (skipped)", e.message);
                failed += 1;
            }
        }
    }

    if !quiet {
        eprintln!("fetched {fetched}, cached {skipped}, failed {failed}");
    }

    if failed > 0 && fetched == 0 && skipped == 0 {
        return Err(CliError {
            code: EXIT_FETCH_UPSTREAM,
            message: format!("all {failed} zip(s) failed"),
            hint: None,
        }
        .with_hint("re-run to retry; cached zips are not re-queried"));
    }

    Ok(())
}

/// Query one zip in both modes, union the pages, dedup by NCES ID
/// preserving first-seen order.
fn fetch_zip(
    http: &reqwest::blocking::Client,
    base_url: &str,
    year: u16,
    zip: &str,
) -> Result<Vec<CandidateRecord>, CliError> {
    let mut rows: Vec<CandidateRecord> = Vec::new();

    for mode in ["mailing", "location"] {
        let mut page = 1u32;
        loop {
            let body = get_with_retry(http, base_url, year, zip, mode, page)?;
            let parsed: LocatorPage = serde_json::from_str(&body).map_err(|e| CliError {
                code: EXIT_FETCH_UPSTREAM,
                message: format!("bad locator response for {zip} ({mode} p{page}): {e}"),
                hint: None,
            })?;

            for row in parsed.results {
                if !rows.iter().any(|r| r.nces_id == row.nces_id) {
                    rows.push(row);
                }
            }

            match parsed.next_page {
                Some(next) => page = next,
                None => break,
            }
        }
    }

    Ok(rows)
}

/// GET one result page with retry + exponential backoff. Retry-After is
/// honored on 429; 4xx other than 429 fails immediately.
fn get_with_retry(
    http: &reqwest::blocking::Client,
    base_url: &str,
    year: u16,
    zip: &str,
    mode: &str,
    page: u32,
) -> Result<String, CliError> {
    let mut backoff_secs = 1u64;

    for attempt in 0..=MAX_RETRIES {
        let result = http
            .get(base_url)
            .query(&[
                ("year", year.to_string()),
                ("zip", zip.to_string()),
                ("mode", mode.to_string()),
                ("page", page.to_string()),
            ])
            .send();

        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();

                if status == 400 {
                    return Err(CliError {
                        code: EXIT_FETCH_VALIDATION,
                        message: format!("locator rejected query for {zip} ({status})"),
                        hint: None,
                    });
                }

                if status >= 400 && status < 500 && status != 429 {
                    return Err(CliError {
                        code: EXIT_FETCH_UPSTREAM,
                        message: format!("locator error for {zip} ({status})"),
                        hint: None,
                    });
                }

                if status == 429 || status >= 500 {
                    if attempt == MAX_RETRIES {
                        let code = if status == 429 {
                            EXIT_FETCH_RATE_LIMIT
                        } else {
                            EXIT_FETCH_UPSTREAM
                        };
                        return Err(CliError {
                            code,
                            message: format!(
                                "locator HTTP {status} after {MAX_RETRIES} attempts"
                            ),
                            hint: None,
                        });
                    }

                    let wait = if status == 429 {
                        resp.headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(backoff_secs)
                    } else {
                        backoff_secs
                    };

                    eprintln!("warning: retry {}/{} in {}s (HTTP {})", attempt + 1, MAX_RETRIES, wait, status);
                    thread::sleep(Duration::from_secs(wait));
                    backoff_secs *= 2;
                    continue;
                }

                return resp.text().map_err(|e| CliError {
                    code: EXIT_FETCH_UPSTREAM,
                    message: format!("failed to read locator response: {e}"),
                    hint: None,
                });
            }
            Err(e) => {
                if attempt == MAX_RETRIES {
                    return Err(CliError {
                        code: EXIT_FETCH_UPSTREAM,
                        message: format!("locator unreachable after {MAX_RETRIES} attempts: {e}"),
                        hint: None,
                    });
                }
                eprintln!("warning: retry {}/{} in {}s ({})", attempt + 1, MAX_RETRIES, backoff_secs, e);
                thread::sleep(Duration::from_secs(backoff_secs));
                backoff_secs *= 2;
            }
        }
    }

    unreachable!()
}

fn parse_zip_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| zip5(line))
        .filter(|z| !z.is_empty())
        .collect()
}
