use serde::Deserialize;

use crate::error::LinkError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    /// A fuzzy match must strictly exceed this score to be accepted.
    #[serde(default = "default_cutoff")]
    pub match_cutoff: u8,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_cutoff() -> u8 {
    crate::similar::MATCH_CUTOFF
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct InputsConfig {
    /// The exam-registration records to be linked. Required.
    pub records: RecordsConfig,
    /// Trusted base table (a previous run's output). Optional on first run.
    #[serde(default)]
    pub base: Option<FileConfig>,
    /// Flat candidate directory file (source A).
    #[serde(default)]
    pub directory: Option<CandidatesConfig>,
    /// Directory of cached locator responses (source B).
    #[serde(default)]
    pub locator_cache: Option<String>,
    /// Approved crowd worker responses.
    #[serde(default)]
    pub crowd: Option<CrowdConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordsConfig {
    pub file: String,
    #[serde(default)]
    pub columns: RecordColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordColumns {
    pub ceeb: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Default for RecordColumns {
    fn default() -> Self {
        Self {
            ceeb: "ceeb".into(),
            name: "name".into(),
            city: "city".into(),
            state: "state".into(),
            zip: "zip".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CandidatesConfig {
    pub file: String,
    #[serde(default)]
    pub columns: CandidateColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateColumns {
    pub nces_id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub mailing_zip: String,
    pub location_zip: String,
}

impl Default for CandidateColumns {
    fn default() -> Self {
        Self {
            nces_id: "nces_id".into(),
            name: "name".into(),
            city: "city".into(),
            state: "state".into(),
            mailing_zip: "mailing_zip".into(),
            location_zip: "location_zip".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CrowdConfig {
    pub file: String,
    #[serde(default)]
    pub columns: CrowdColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrowdColumns {
    pub worker_id: String,
    pub ceeb: String,
    pub answer: String,
    pub approved: String,
}

impl Default for CrowdColumns {
    fn default() -> Self {
        Self {
            worker_id: "worker_id".into(),
            ceeb: "ceeb".into(),
            answer: "answer".into(),
            approved: "approved".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Crosswalk CSV path. The file written here is the next run's base table.
    #[serde(default)]
    pub crosswalk: Option<String>,
    /// CSV of records left unresolved, the crowd submission set.
    #[serde(default)]
    pub unresolved: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl LinkConfig {
    pub fn from_toml(input: &str) -> Result<Self, LinkError> {
        let config: LinkConfig =
            toml::from_str(input).map_err(|e| LinkError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        if self.match_cutoff >= 100 {
            return Err(LinkError::ConfigValidation(format!(
                "match_cutoff must be below 100, got {}",
                self.match_cutoff
            )));
        }

        let has_source = self.inputs.base.is_some()
            || self.inputs.directory.is_some()
            || self.inputs.locator_cache.is_some();
        if !has_source {
            return Err(LinkError::ConfigValidation(
                "at least one candidate source (base, directory, locator_cache) is required".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
