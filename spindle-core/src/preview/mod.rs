//! The disc preview pipeline: title-duration heuristic,
//! name-pattern detection, reconciliation, metadata lookup, extras
//! filtering, episode matching, and filename synthesis.

pub mod episode_matcher;
pub mod extras_filter;
pub mod filename;
pub mod name_pattern;
pub mod pipeline;
pub mod title_heuristic;

pub use pipeline::{PreviewConfig, PreviewPipeline};
