use std::fmt;

#[derive(Debug)]
pub enum LinkError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad cutoff, missing input section, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// External candidate lookup failed for one record.
    Lookup(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::Lookup(msg) => write!(f, "candidate lookup failed: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LinkError {}
