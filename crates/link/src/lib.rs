//! `xwalk-link`: multi-stage school identifier record-linkage engine.
//!
//! Pure engine crate: receives pre-loaded records, returns a crosswalk
//! linking exam registration codes (CEEB) to federal statistical IDs (NCES).
//! No CLI or IO dependencies.

pub mod block;
pub mod config;
pub mod crosswalk;
pub mod crowd;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod similar;
pub mod stage;

pub use config::LinkConfig;
pub use crosswalk::Crosswalk;
pub use engine::{run, LinkInput};
pub use error::LinkError;
pub use model::{CrosswalkEntry, LinkResult, MatchResult, MatchSource, SchoolRecord};
pub use similar::MATCH_CUTOFF;
