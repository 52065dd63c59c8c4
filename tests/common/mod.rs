//! Common test infrastructure
//!
//! Record generators with planted engagement patterns, plus helpers to write
//! them to disk. Tests should only import from this module.

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{
    open_params, post_records, video_records, write_json_array, write_jsonl,
};
