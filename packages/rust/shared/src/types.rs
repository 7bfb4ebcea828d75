//! Canonical domain types: the PDF-ready document, its sections, and the
//! audit envelope that travels with it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed schema version literal for the PDF-ready document.
pub const SCHEMA_VERSION: &str = "1.0";

/// Fixed schema version literal for the audit envelope.
pub const AUDIT_SCHEMA_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Fixed vocabulary of warning codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// Producer version parsed but lies outside the confirmed range.
    VersionMismatch,
    /// Producer version is not a semantic version.
    InvalidVersion,
    /// A canonical section heading occurred more than once in an item body.
    DuplicateSection,
    /// A producer trace step could not be carried and was dropped.
    MalformedTrace,
}

impl WarningCode {
    /// The wire representation (e.g. `VERSION_MISMATCH`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VersionMismatch => "VERSION_MISMATCH",
            Self::InvalidVersion => "INVALID_VERSION",
            Self::DuplicateSection => "DUPLICATE_SECTION",
            Self::MalformedTrace => "MALFORMED_TRACE",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal condition recorded as data and merged into the audit trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompatibilityWarning {
    /// Warning code.
    pub code: WarningCode,
    /// Human-readable message.
    pub message: String,
    /// Dotted field path the warning refers to.
    #[serde(default)]
    pub context: Option<String>,
}

impl CompatibilityWarning {
    /// Create a warning with a field-path context.
    pub fn new(code: WarningCode, message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Some(context.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The seven canonical section keys, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Description,
    BusinessValue,
    Preconditions,
    AcceptanceCriteria,
    UserGuide,
    Connections,
    LastEdited,
}

impl SectionKey {
    /// All keys in canonical order.
    pub const ALL: [SectionKey; 7] = [
        SectionKey::Description,
        SectionKey::BusinessValue,
        SectionKey::Preconditions,
        SectionKey::AcceptanceCriteria,
        SectionKey::UserGuide,
        SectionKey::Connections,
        SectionKey::LastEdited,
    ];

    /// The serialized key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::BusinessValue => "business_value",
            Self::Preconditions => "preconditions",
            Self::AcceptanceCriteria => "acceptance_criteria",
            Self::UserGuide => "user_guide",
            Self::Connections => "connections",
            Self::LastEdited => "last_edited",
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized markdown sections of one user story.
///
/// Field order is the canonical key order, so serialization always emits all
/// seven keys (null when absent) in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sections {
    pub description: Option<String>,
    pub business_value: Option<String>,
    pub preconditions: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub user_guide: Option<String>,
    pub connections: Option<String>,
    pub last_edited: Option<String>,
}

impl Sections {
    /// Borrow the value stored under `key`.
    pub fn get(&self, key: SectionKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    /// Replace the value stored under `key`.
    pub fn set(&mut self, key: SectionKey, value: Option<String>) {
        *self.slot_mut(key) = value;
    }

    /// Iterate `(key, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, Option<&str>)> + '_ {
        SectionKey::ALL.into_iter().map(|key| (key, self.get(key)))
    }

    /// `true` when every key is null.
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, v)| v.is_none())
    }

    fn slot(&self, key: SectionKey) -> &Option<String> {
        match key {
            SectionKey::Description => &self.description,
            SectionKey::BusinessValue => &self.business_value,
            SectionKey::Preconditions => &self.preconditions,
            SectionKey::AcceptanceCriteria => &self.acceptance_criteria,
            SectionKey::UserGuide => &self.user_guide,
            SectionKey::Connections => &self.connections,
            SectionKey::LastEdited => &self.last_edited,
        }
    }

    fn slot_mut(&mut self, key: SectionKey) -> &mut Option<String> {
        match key {
            SectionKey::Description => &mut self.description,
            SectionKey::BusinessValue => &mut self.business_value,
            SectionKey::Preconditions => &mut self.preconditions,
            SectionKey::AcceptanceCriteria => &mut self.acceptance_criteria,
            SectionKey::UserGuide => &mut self.user_guide,
            SectionKey::Connections => &mut self.connections,
            SectionKey::LastEdited => &mut self.last_edited,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit envelope
// ---------------------------------------------------------------------------

/// Producer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Producer {
    /// Producer name (non-empty).
    pub name: String,
    /// Producer version (semver, not enforced).
    pub version: String,
    /// Build identifier.
    pub build: Option<String>,
}

/// CI run context. Every field is nullable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Run {
    pub run_id: Option<String>,
    pub run_attempt: Option<String>,
    pub actor: Option<String>,
    pub workflow: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub sha: Option<String>,
}

/// Where the input data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    /// Source systems (non-empty).
    pub systems: Vec<String>,
    /// Source repositories.
    #[serde(default)]
    pub repositories: Vec<String>,
    pub organization: Option<String>,
    pub enterprise: Option<String>,
}

/// One append-only record of a pipeline stage's execution window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceStep {
    /// Step name (e.g. `collection`, `normalization`).
    pub step: String,
    /// Tool name.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub warnings: Vec<CompatibilityWarning>,
}

/// Structured provenance record carried alongside the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditEnvelope {
    /// Always [`AUDIT_SCHEMA_VERSION`].
    pub schema_version: String,
    pub producer: Producer,
    pub run: Run,
    pub source: Source,
    /// Trace steps in chronological order.
    pub trace: Vec<TraceStep>,
    /// Namespaced opaque values, e.g. the producer's original metadata.
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl AuditEnvelope {
    /// Append a trace step. Existing steps are never touched.
    pub fn push_step(&mut self, step: TraceStep) {
        self.trace.push(step);
    }
}

// ---------------------------------------------------------------------------
// PDF-ready document
// ---------------------------------------------------------------------------

/// Creation and update instants of a user story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timestamps {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// One output item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserStory {
    /// Stable cross-run identifier, e.g. `github:owner/repo#123`.
    pub id: String,
    pub title: String,
    pub state: String,
    pub tags: Vec<String>,
    pub url: String,
    pub timestamps: Timestamps,
    pub sections: Sections,
}

/// Counts of items considered versus emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionSummary {
    pub total_items: usize,
    pub included_items: usize,
    pub excluded_items: usize,
}

impl SelectionSummary {
    /// Summary for a pass-through selection of `total` items.
    pub fn all_included(total: usize) -> Self {
        Self {
            total_items: total,
            included_items: total,
            excluded_items: 0,
        }
    }
}

/// CI context shown by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunContext {
    pub ci_run_id: Option<String>,
    pub triggered_by: Option<String>,
    pub branch: Option<String>,
    pub commit_sha: Option<String>,
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    pub document_title: String,
    pub document_version: String,
    pub generated_at: DateTime<Utc>,
    pub source_set: Vec<String>,
    pub selection_summary: SelectionSummary,
    #[serde(default)]
    pub run_context: Option<RunContext>,
    #[serde(default)]
    pub audit: Option<AuditEnvelope>,
}

/// Document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Content {
    pub user_stories: Vec<UserStory>,
}

/// The canonical PDF-ready document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Always [`SCHEMA_VERSION`].
    pub schema_version: String,
    pub meta: Meta,
    pub content: Content,
}
