//! Shared types, error model, configuration, and JSON IO for living-doc.
//!
//! This crate is the foundation depended on by all other living-doc crates.
//! It provides:
//! - [`LivingDocError`]: the error taxonomy with exit codes
//! - Canonical types ([`Document`], [`Sections`], [`AuditEnvelope`], [`CompatibilityWarning`])
//! - Configuration ([`AppConfig`], config loading)
//! - JSON file helpers and JSON Schema export

pub mod config;
pub mod error;
pub mod io;
pub mod schema;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, NormalizeConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{LivingDocError, Result};
pub use io::{read_json, to_json_string, write_json};
pub use schema::SchemaKind;
pub use types::{
    AUDIT_SCHEMA_VERSION, AuditEnvelope, CompatibilityWarning, Content, Document, Meta, Producer,
    Run, RunContext, SCHEMA_VERSION, SectionKey, Sections, SelectionSummary, Source, Timestamps,
    TraceStep, UserStory, WarningCode,
};
