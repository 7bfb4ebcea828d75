//! Audit envelope construction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::json;

use livingdoc_adapters::AdapterMetadata;
use livingdoc_shared::{AUDIT_SCHEMA_VERSION, AuditEnvelope, CompatibilityWarning, TraceStep};

/// Trace step name recorded by this pipeline.
pub const NORMALIZATION_STEP: &str = "normalization";

/// Name and version recorded in trace steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolIdentity {
    pub name: String,
    pub version: String,
}

impl ToolIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Execution window of the normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepWindow {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Build the audit envelope for one run.
///
/// Producer, run and source are copied from the adapter metadata. Trace steps
/// recorded upstream are kept in order and exactly one `normalization` step
/// is appended. The verbatim producer metadata is stored under
/// `extensions[<adapter_name>].original_metadata`.
pub fn build_envelope(
    metadata: &AdapterMetadata,
    adapter_name: &str,
    tool: &ToolIdentity,
    warnings: Vec<CompatibilityWarning>,
    window: StepWindow,
) -> AuditEnvelope {
    let mut extensions = BTreeMap::new();
    extensions.insert(
        adapter_name.to_string(),
        json!({ "original_metadata": metadata.original_metadata.clone() }),
    );

    let mut envelope = AuditEnvelope {
        schema_version: AUDIT_SCHEMA_VERSION.to_string(),
        producer: metadata.producer.clone(),
        run: metadata.run.clone(),
        source: metadata.source.clone(),
        trace: metadata.trace.clone(),
        extensions,
    };

    envelope.push_step(TraceStep {
        step: NORMALIZATION_STEP.to_string(),
        tool: tool.name.clone(),
        tool_version: tool.version.clone(),
        started_at: Some(window.started_at),
        finished_at: Some(window.finished_at),
        warnings,
    });

    envelope
}
