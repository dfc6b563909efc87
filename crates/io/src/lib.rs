//! `xwalk-io`: file adapters for the linkage pipeline.
//!
//! Typed CSV loaders for each input source, the deterministic crosswalk
//! writer, and the locator fetch cache. All parse errors surface as
//! [`xwalk_link::LinkError`]; a missing or malformed input file is the one
//! fatal condition, raised here before any matching begins.

pub mod cache;
pub mod csv;
pub mod load;
pub mod write;

pub use load::{
    load_base_rows, load_candidates, load_school_records, load_worker_responses, Loaded,
};
pub use write::{write_crosswalk, write_unresolved};
