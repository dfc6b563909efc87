//! CLI Exit Code Registry
//!
//! Single source of truth for `xwalk` exit codes. Exit codes are part of
//! the shell contract; scripts rely on them.
//!
//! | Range | Domain    | Description                                  |
//! |-------|-----------|----------------------------------------------|
//! | 0     | Universal | Success                                      |
//! | 1     | Universal | General error (unspecified)                  |
//! | 2     | Universal | CLI usage error (bad args, missing file)     |
//! | 3-9   | run       | Pipeline run codes                           |
//! | 50-59 | fetch     | Locator service connector                    |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Runtime failure while loading inputs or writing outputs.
pub const EXIT_RUN_RUNTIME: u8 = 3;

/// Config failed to parse or validate.
pub const EXIT_RUN_INVALID_CONFIG: u8 = 4;

/// Run completed but records remain unresolved (the crowd export set is
/// non-empty). Not a failure of the pipeline itself.
pub const EXIT_RUN_UNRESOLVED: u8 = 5;

/// Locator service returned an error after retries.
pub const EXIT_FETCH_UPSTREAM: u8 = 50;

/// Locator service rate limited us past the retry limit.
pub const EXIT_FETCH_RATE_LIMIT: u8 = 51;

/// Locator request was rejected as invalid.
pub const EXIT_FETCH_VALIDATION: u8 = 52;
