//! Contract checks on the assembled document.
//!
//! A failure here means the builder produced something it should not have,
//! so every violation is collected and reported in one
//! [`LivingDocError::SchemaValidation`].

use serde_json::Value;
use tracing::debug;
use url::Url;

use livingdoc_shared::{
    AUDIT_SCHEMA_VERSION, AuditEnvelope, Document, LivingDocError, Result, SCHEMA_VERSION,
    SectionKey,
};

use crate::builder::{MAX_TITLE_LEN, MAX_VERSION_LEN};

/// Upper bound on a story title, in characters.
pub const MAX_STORY_TITLE_LEN: usize = 500;

/// Validate a typed document.
pub fn validate(document: &Document) -> Result<()> {
    let violations = collect_violations(document);
    if violations.is_empty() {
        debug!(stories = document.content.user_stories.len(), "document valid");
        return Ok(());
    }
    Err(LivingDocError::schema_validation(format!(
        "{} violation(s): {}",
        violations.len(),
        violations.join("; ")
    )))
}

/// Validate a serialized document.
///
/// Unknown fields are rejected and every story must carry all seven section
/// keys, null or not.
pub fn validate_json(value: &Value) -> Result<()> {
    let document: Document = serde_json::from_value(value.clone())
        .map_err(|e| LivingDocError::schema_validation(format!("document shape: {e}")))?;

    let mut missing = Vec::new();
    if let Some(stories) = value.pointer("/content/user_stories").and_then(Value::as_array) {
        for (i, story) in stories.iter().enumerate() {
            let sections = story.get("sections").and_then(Value::as_object);
            for key in SectionKey::ALL {
                if !sections.is_some_and(|s| s.contains_key(key.as_str())) {
                    missing.push(format!("content.user_stories[{i}].sections.{key} is missing"));
                }
            }
        }
    }
    if !missing.is_empty() {
        return Err(LivingDocError::schema_validation(missing.join("; ")));
    }

    validate(&document)
}

fn collect_violations(document: &Document) -> Vec<String> {
    let mut out = Vec::new();
    let meta = &document.meta;

    if document.schema_version != SCHEMA_VERSION {
        out.push(format!(
            "schema_version must be \"{SCHEMA_VERSION}\", found \"{}\"",
            document.schema_version
        ));
    }

    check_len(&mut out, "meta.document_title", &meta.document_title, MAX_TITLE_LEN);
    check_len(&mut out, "meta.document_version", &meta.document_version, MAX_VERSION_LEN);

    if meta.source_set.is_empty() {
        out.push("meta.source_set must not be empty".into());
    }
    for (i, source) in meta.source_set.iter().enumerate() {
        if source.trim().is_empty() {
            out.push(format!("meta.source_set[{i}] must not be empty"));
        }
    }

    let summary = &meta.selection_summary;
    if summary.total_items != summary.included_items + summary.excluded_items {
        out.push(format!(
            "meta.selection_summary: total_items {} != included_items {} + excluded_items {}",
            summary.total_items, summary.included_items, summary.excluded_items
        ));
    }
    let stories = &document.content.user_stories;
    if summary.included_items != stories.len() {
        out.push(format!(
            "meta.selection_summary.included_items {} != {} user stories",
            summary.included_items,
            stories.len()
        ));
    }

    for (i, story) in stories.iter().enumerate() {
        let path = format!("content.user_stories[{i}]");
        if story.id.trim().is_empty() {
            out.push(format!("{path}.id must not be empty"));
        }
        check_len(&mut out, &format!("{path}.title"), &story.title, MAX_STORY_TITLE_LEN);
        if story.state.trim().is_empty() {
            out.push(format!("{path}.state must not be empty"));
        }
        if let Err(e) = Url::parse(&story.url) {
            out.push(format!("{path}.url '{}' is not a valid URL: {e}", story.url));
        }
    }

    if let Some(audit) = &meta.audit {
        check_audit(&mut out, audit);
    }

    out
}

fn check_audit(out: &mut Vec<String>, audit: &AuditEnvelope) {
    if audit.schema_version != AUDIT_SCHEMA_VERSION {
        out.push(format!(
            "meta.audit.schema_version must be \"{AUDIT_SCHEMA_VERSION}\", found \"{}\"",
            audit.schema_version
        ));
    }
    if audit.producer.name.trim().is_empty() {
        out.push("meta.audit.producer.name must not be empty".into());
    }
    if audit.source.systems.is_empty() {
        out.push("meta.audit.source.systems must not be empty".into());
    }
    for (i, step) in audit.trace.iter().enumerate() {
        if step.step.trim().is_empty() {
            out.push(format!("meta.audit.trace[{i}].step must not be empty"));
        }
        if step.tool.trim().is_empty() {
            out.push(format!("meta.audit.trace[{i}].tool must not be empty"));
        }
    }
}

fn check_len(out: &mut Vec<String>, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if value.trim().is_empty() {
        out.push(format!("{field} must not be empty"));
    } else if len > max {
        out.push(format!("{field} has {len} characters, maximum is {max}"));
    }
}
