//! JSON Schema (draft 2020-12) documents for the published contracts.
//!
//! Downstream renderers validate against these files; keep them in step with
//! [`crate::types`].

use serde_json::{Value, json};

use crate::types::{AUDIT_SCHEMA_VERSION, SCHEMA_VERSION, SectionKey};

/// Which contract to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// The PDF-ready document.
    PdfReady,
    /// The audit envelope.
    Audit,
}

impl SchemaKind {
    /// Build the schema document.
    pub fn schema(self) -> Value {
        match self {
            Self::PdfReady => pdf_ready_schema(),
            Self::Audit => audit_schema(),
        }
    }
}

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

fn nullable_string() -> Value {
    json!({ "type": ["string", "null"] })
}

fn nullable_datetime() -> Value {
    json!({ "type": ["string", "null"], "format": "date-time" })
}

fn warning_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["code", "message"],
        "properties": {
            "code": {
                "enum": [
                    "VERSION_MISMATCH",
                    "INVALID_VERSION",
                    "DUPLICATE_SECTION",
                    "MALFORMED_TRACE"
                ]
            },
            "message": { "type": "string" },
            "context": nullable_string(),
        }
    })
}

fn audit_body() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["schema_version", "producer", "run", "source", "trace"],
        "properties": {
            "schema_version": { "const": AUDIT_SCHEMA_VERSION },
            "producer": {
                "type": "object",
                "additionalProperties": false,
                "required": ["name", "version"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "version": { "type": "string", "minLength": 1 },
                    "build": nullable_string(),
                }
            },
            "run": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "run_id": nullable_string(),
                    "run_attempt": nullable_string(),
                    "actor": nullable_string(),
                    "workflow": nullable_string(),
                    "ref": nullable_string(),
                    "sha": nullable_string(),
                }
            },
            "source": {
                "type": "object",
                "additionalProperties": false,
                "required": ["systems"],
                "properties": {
                    "systems": { "type": "array", "minItems": 1, "items": { "type": "string" } },
                    "repositories": { "type": "array", "items": { "type": "string" } },
                    "organization": nullable_string(),
                    "enterprise": nullable_string(),
                }
            },
            "trace": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["step", "tool", "tool_version"],
                    "properties": {
                        "step": { "type": "string", "minLength": 1 },
                        "tool": { "type": "string", "minLength": 1 },
                        "tool_version": { "type": "string", "minLength": 1 },
                        "started_at": nullable_datetime(),
                        "finished_at": nullable_datetime(),
                        "warnings": { "type": "array", "items": warning_schema() },
                    }
                }
            },
            "extensions": { "type": "object", "additionalProperties": { "type": "object" } },
        }
    })
}

/// Schema for the audit envelope.
pub fn audit_schema() -> Value {
    let mut schema = audit_body();
    schema["$schema"] = json!(DRAFT);
    schema["title"] = json!("AuditEnvelopeV1");
    schema
}

/// Schema for the PDF-ready document.
pub fn pdf_ready_schema() -> Value {
    let section_keys: Vec<&str> = SectionKey::ALL.iter().map(SectionKey::as_str).collect();
    let section_props: serde_json::Map<String, Value> = section_keys
        .iter()
        .map(|k| ((*k).to_string(), nullable_string()))
        .collect();

    json!({
        "$schema": DRAFT,
        "title": "PdfReadyV1",
        "type": "object",
        "additionalProperties": false,
        "required": ["schema_version", "meta", "content"],
        "properties": {
            "schema_version": { "const": SCHEMA_VERSION },
            "meta": {
                "type": "object",
                "additionalProperties": false,
                "required": [
                    "document_title", "document_version", "generated_at",
                    "source_set", "selection_summary"
                ],
                "properties": {
                    "document_title": { "type": "string", "minLength": 1, "maxLength": 200 },
                    "document_version": { "type": "string", "minLength": 1, "maxLength": 50 },
                    "generated_at": { "type": "string", "format": "date-time" },
                    "source_set": {
                        "type": "array",
                        "minItems": 1,
                        "items": { "type": "string", "minLength": 1 }
                    },
                    "selection_summary": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["total_items", "included_items", "excluded_items"],
                        "properties": {
                            "total_items": { "type": "integer", "minimum": 0 },
                            "included_items": { "type": "integer", "minimum": 0 },
                            "excluded_items": { "type": "integer", "minimum": 0 },
                        }
                    },
                    "run_context": {
                        "type": ["object", "null"],
                        "additionalProperties": false,
                        "properties": {
                            "ci_run_id": nullable_string(),
                            "triggered_by": nullable_string(),
                            "branch": nullable_string(),
                            "commit_sha": nullable_string(),
                        }
                    },
                    "audit": { "anyOf": [audit_body(), { "type": "null" }] },
                }
            },
            "content": {
                "type": "object",
                "additionalProperties": false,
                "required": ["user_stories"],
                "properties": {
                    "user_stories": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "additionalProperties": false,
                            "required": [
                                "id", "title", "state", "tags", "url", "timestamps", "sections"
                            ],
                            "properties": {
                                "id": { "type": "string", "minLength": 1 },
                                "title": { "type": "string", "minLength": 1, "maxLength": 500 },
                                "state": { "type": "string", "minLength": 1 },
                                "tags": { "type": "array", "items": { "type": "string" } },
                                "url": { "type": "string", "format": "uri" },
                                "timestamps": {
                                    "type": "object",
                                    "additionalProperties": false,
                                    "required": ["created", "updated"],
                                    "properties": {
                                        "created": { "type": "string", "format": "date-time" },
                                        "updated": { "type": "string", "format": "date-time" },
                                    }
                                },
                                "sections": {
                                    "type": "object",
                                    "additionalProperties": false,
                                    "required": section_keys,
                                    "properties": section_props,
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}
