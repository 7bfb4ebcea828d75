//! Core pipeline for living-doc.
//!
//! Ties adapters, Markdown normalization, audit envelope construction,
//! document assembly and validation into the `normalize-issues` workflow
//! (see [`pipeline::run_service`]).

pub mod audit;
pub mod builder;
pub mod clock;
pub mod pipeline;
pub mod validate;

pub use audit::{NORMALIZATION_STEP, StepWindow, ToolIdentity, build_envelope};
pub use builder::{BuildOptions, build};
pub use clock::{Clock, FixedClock, SystemClock};
pub use pipeline::{
    NormalizeOptions, NormalizeOutcome, PipelineStage, ProgressReporter, SilentProgress,
    TOOL_NAME, TOOL_VERSION, normalize_payload, run_service,
};
pub use validate::{validate, validate_json};
