//! Typed adapter output shared by every producer adapter.

use livingdoc_shared::{CompatibilityWarning, Producer, Run, Source, Timestamps, TraceStep};

/// One normalized source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterItem {
    /// Stable cross-run identifier, `<system>:<owner>/<repo>#<number>`.
    pub id: String,
    /// Non-empty title.
    pub title: String,
    /// Producer-defined state, e.g. `open` or `closed`.
    pub state: String,
    /// Labels with duplicates removed, first occurrence wins.
    pub tags: Vec<String>,
    pub url: String,
    pub timestamps: Timestamps,
    /// Raw Markdown body.
    pub body: Option<String>,
}

/// Producer metadata mapped onto the audit envelope shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterMetadata {
    pub producer: Producer,
    pub run: Run,
    pub source: Source,
    /// Trace steps recorded by earlier tools, oldest first.
    pub trace: Vec<TraceStep>,
    /// The producer's `metadata` object, verbatim.
    pub original_metadata: serde_json::Value,
}

/// Output of [`crate::SourceAdapter::parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterResult {
    /// Items in input order.
    pub items: Vec<AdapterItem>,
    pub metadata: AdapterMetadata,
    /// Warnings raised while parsing, in order.
    pub warnings: Vec<CompatibilityWarning>,
}
