//! Payload mapping for collector-gh exports.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;
use url::Url;

use livingdoc_shared::{
    CompatibilityWarning, LivingDocError, Producer, Result, Run, Source, Timestamps, TraceStep,
    WarningCode,
};

use super::{DEFAULT_SYSTEM, PRODUCER_ID};
use crate::model::{AdapterItem, AdapterMetadata, AdapterResult};

/// Repository used in item ids when the payload lists none.
const UNKNOWN_REPOSITORY: &str = "unknown/repo";

// ---------------------------------------------------------------------------
// Raw payload shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    generator: Option<RawGenerator>,
    #[serde(default)]
    run: Option<RawRun>,
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    trace: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGenerator {
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    build: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRun {
    #[serde(default, deserialize_with = "lenient_string")]
    run_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    run_attempt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    actor: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    workflow: Option<String>,
    #[serde(default, rename = "ref", deserialize_with = "lenient_string")]
    git_ref: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    sha: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    #[serde(default)]
    systems: Option<Vec<String>>,
    #[serde(default)]
    repositories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    organization: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    enterprise: Option<String>,
}

/// Producer trace step; unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct RawTraceStep {
    #[serde(default, deserialize_with = "lenient_string")]
    step: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    tool: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    tool_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    started_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    finished_at: Option<String>,
    #[serde(default)]
    warnings: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: Option<u64>,
    title: Option<String>,
    state: Option<String>,
    #[serde(default)]
    labels: Option<Vec<RawLabel>>,
    html_url: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

/// Labels arrive either as plain names or as GitHub label objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Name(String),
    Object { name: String },
}

impl RawLabel {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

/// Accept strings, numbers and booleans as text; `null` as absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar value, found {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

pub(super) fn parse_payload(payload: &Value) -> Result<AdapterResult> {
    let object = payload
        .as_object()
        .ok_or_else(|| LivingDocError::adapter("collector-gh payload must be a JSON object"))?;

    let original_metadata = match object.get("metadata") {
        Some(meta @ Value::Object(_)) => meta.clone(),
        Some(_) => return Err(LivingDocError::adapter("metadata must be a JSON object")),
        None => return Err(LivingDocError::adapter("missing metadata object")),
    };

    let raw: RawMetadata = serde_json::from_value(original_metadata.clone())
        .map_err(|e| LivingDocError::adapter(format!("malformed metadata: {e}")))?;

    let mut warnings = Vec::new();
    let metadata = map_metadata(raw, original_metadata, &mut warnings);
    let system = metadata
        .source
        .systems
        .first()
        .map_or(DEFAULT_SYSTEM, String::as_str);
    let repository = primary_repository(&metadata.source.repositories, system);

    let issues: &[Value] = match object.get("issues") {
        Some(Value::Array(issues)) => issues.as_slice(),
        Some(Value::Null) | None => &[],
        Some(_) => return Err(LivingDocError::adapter("issues must be a JSON array")),
    };

    let items = issues
        .iter()
        .enumerate()
        .map(|(index, issue)| parse_issue(index, issue, system, &repository))
        .collect::<Result<Vec<_>>>()?;

    debug!(items = items.len(), repository = %repository, "payload parsed");

    Ok(AdapterResult {
        items,
        metadata,
        warnings,
    })
}

fn map_metadata(
    raw: RawMetadata,
    original_metadata: Value,
    warnings: &mut Vec<CompatibilityWarning>,
) -> AdapterMetadata {
    let generator = raw.generator.unwrap_or_default();
    let run = raw.run.unwrap_or_default();
    let source = raw.source.unwrap_or_default();

    let systems = source
        .systems
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_SYSTEM.to_string()]);

    AdapterMetadata {
        producer: Producer {
            name: generator
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| PRODUCER_ID.to_string()),
            version: generator.version.unwrap_or_default(),
            build: generator.build,
        },
        run: Run {
            run_id: run.run_id,
            run_attempt: run.run_attempt,
            actor: run.actor,
            workflow: run.workflow,
            git_ref: run.git_ref,
            sha: run.sha,
        },
        source: Source {
            systems,
            repositories: source.repositories.unwrap_or_default(),
            organization: source.organization,
            enterprise: source.enterprise,
        },
        trace: map_trace(raw.trace, warnings),
        original_metadata,
    }
}

/// Carry the producer's trace steps. Steps that do not fit are dropped with
/// a `MALFORMED_TRACE` warning; the verbatim copy stays in `original_metadata`.
fn map_trace(trace: Option<Value>, warnings: &mut Vec<CompatibilityWarning>) -> Vec<TraceStep> {
    let steps = match trace {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(steps)) => steps,
        Some(other) => {
            warnings.push(CompatibilityWarning::new(
                WarningCode::MalformedTrace,
                format!(
                    "metadata.trace is not an array (found {}); prior trace dropped",
                    kind(&other)
                ),
                "metadata.trace",
            ));
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(steps.len());
    for (i, step) in steps.into_iter().enumerate() {
        match map_trace_step(step) {
            Ok(step) => out.push(step),
            Err(reason) => {
                debug!(index = i, %reason, "dropping producer trace step");
                warnings.push(CompatibilityWarning::new(
                    WarningCode::MalformedTrace,
                    format!("trace step dropped: {reason}"),
                    format!("metadata.trace[{i}]"),
                ));
            }
        }
    }
    out
}

fn map_trace_step(value: Value) -> std::result::Result<TraceStep, String> {
    let raw: RawTraceStep = serde_json::from_value(value).map_err(|e| e.to_string())?;

    let step = require(raw.step, "step")?;
    let tool = require(raw.tool, "tool")?;
    if step.trim().is_empty() || tool.trim().is_empty() {
        return Err("step and tool must not be empty".into());
    }

    let started_at = raw
        .started_at
        .map(|s| parse_timestamp(Some(s), "started_at"))
        .transpose()?;
    let finished_at = raw
        .finished_at
        .map(|s| parse_timestamp(Some(s), "finished_at"))
        .transpose()?;

    let warnings = raw
        .warnings
        .unwrap_or_default()
        .into_iter()
        .filter_map(|w| serde_json::from_value(w).ok())
        .collect();

    Ok(TraceStep {
        step,
        tool,
        tool_version: raw.tool_version.unwrap_or_default(),
        started_at,
        finished_at,
        warnings,
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First listed repository with any `<system>:` prefix removed.
fn primary_repository(repositories: &[String], system: &str) -> String {
    let Some(first) = repositories.first() else {
        return UNKNOWN_REPOSITORY.to_string();
    };
    let prefix = format!("{system}:");
    first.strip_prefix(&prefix).unwrap_or(first).to_string()
}

fn parse_issue(index: usize, issue: &Value, system: &str, repository: &str) -> Result<AdapterItem> {
    let label = match issue.get("number").and_then(Value::as_u64) {
        Some(number) => format!("{system}:{repository}#{number}"),
        None => format!("issues[{index}]"),
    };
    let fail = |detail: String| LivingDocError::normalization(format!("item {label}: {detail}"));

    let raw: RawIssue =
        serde_json::from_value(issue.clone()).map_err(|e| fail(format!("malformed issue: {e}")))?;

    let number = raw.number.ok_or_else(|| fail("missing field 'number'".into()))?;
    let id = format!("{system}:{repository}#{number}");

    let title = require(raw.title, "title").map_err(fail)?;
    if title.trim().is_empty() {
        return Err(fail("title is empty".into()));
    }
    let state = require(raw.state, "state").map_err(fail)?;

    let url = require(raw.html_url, "html_url").map_err(fail)?;
    Url::parse(&url).map_err(|e| fail(format!("invalid html_url '{url}': {e}")))?;

    let created = parse_timestamp(raw.created_at, "created_at").map_err(fail)?;
    let updated = parse_timestamp(raw.updated_at, "updated_at").map_err(fail)?;

    let mut tags: Vec<String> = Vec::new();
    for name in raw.labels.unwrap_or_default().into_iter().map(RawLabel::into_name) {
        if !tags.contains(&name) {
            tags.push(name);
        }
    }

    Ok(AdapterItem {
        id,
        title,
        state,
        tags,
        url,
        timestamps: Timestamps { created, updated },
        body: raw.body,
    })
}

fn require(value: Option<String>, field: &str) -> std::result::Result<String, String> {
    value.ok_or_else(|| format!("missing field '{field}'"))
}

fn parse_timestamp(
    value: Option<String>,
    field: &str,
) -> std::result::Result<DateTime<Utc>, String> {
    let raw = require(value, field)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("malformed {field} '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "metadata": {
                "generator": {
                    "name": "AbsaOSS/living-doc-collector-gh",
                    "version": "1.2.0",
                    "build": "abc123"
                },
                "run": {
                    "run_id": "123456789",
                    "run_attempt": "1",
                    "actor": "octocat",
                    "workflow": "living-doc",
                    "ref": "refs/heads/main",
                    "sha": "deadbeef"
                },
                "source": {
                    "systems": ["github"],
                    "repositories": ["owner/repo"],
                    "organization": "owner",
                    "enterprise": null
                },
                "custom_field": { "nested": [1, 2, 3] }
            },
            "issues": [
                {
                    "number": 123,
                    "title": "Login page",
                    "state": "open",
                    "labels": ["feature", { "name": "ui", "color": "ededed" }, "feature"],
                    "html_url": "https://github.com/owner/repo/issues/123",
                    "created_at": "2026-01-01T10:00:00Z",
                    "updated_at": "2026-01-02T12:30:00+02:00",
                    "body": "## Summary\nLet users log in."
                },
                {
                    "number": 7,
                    "title": "Logout",
                    "state": "closed",
                    "html_url": "https://github.com/owner/repo/issues/7",
                    "created_at": "2026-01-03T00:00:00Z",
                    "updated_at": "2026-01-03T00:00:00Z",
                    "body": null
                }
            ]
        })
    }

    #[test]
    fn maps_items_in_order() {
        let result = parse_payload(&payload()).unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].id, "github:owner/repo#123");
        assert_eq!(result.items[1].id, "github:owner/repo#7");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn maps_item_fields() {
        let result = parse_payload(&payload()).unwrap();
        let item = &result.items[0];
        assert_eq!(item.title, "Login page");
        assert_eq!(item.state, "open");
        assert_eq!(item.tags, vec!["feature".to_string(), "ui".to_string()]);
        assert_eq!(item.url, "https://github.com/owner/repo/issues/123");
        assert_eq!(item.timestamps.updated.to_rfc3339(), "2026-01-02T10:30:00+00:00");
        assert_eq!(item.body.as_deref(), Some("## Summary\nLet users log in."));
        assert!(result.items[1].tags.is_empty());
        assert!(result.items[1].body.is_none());
    }

    #[test]
    fn maps_metadata_fields() {
        let result = parse_payload(&payload()).unwrap();
        let meta = &result.metadata;
        assert_eq!(meta.producer.name, PRODUCER_ID);
        assert_eq!(meta.producer.version, "1.2.0");
        assert_eq!(meta.producer.build.as_deref(), Some("abc123"));
        assert_eq!(meta.run.run_id.as_deref(), Some("123456789"));
        assert_eq!(meta.run.git_ref.as_deref(), Some("refs/heads/main"));
        assert_eq!(meta.source.systems, vec!["github".to_string()]);
        assert_eq!(meta.source.organization.as_deref(), Some("owner"));
        assert!(meta.source.enterprise.is_none());
        assert!(meta.trace.is_empty());
    }

    #[test]
    fn original_metadata_is_verbatim() {
        let input = payload();
        let result = parse_payload(&input).unwrap();
        assert_eq!(&result.metadata.original_metadata, &input["metadata"]);
        assert_eq!(
            serde_json::to_string(&result.metadata.original_metadata).unwrap(),
            serde_json::to_string(&input["metadata"]).unwrap()
        );
    }

    #[test]
    fn system_prefixed_repository_is_not_doubled() {
        let mut input = payload();
        input["metadata"]["source"]["repositories"] = json!(["github:owner/repo"]);
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.items[0].id, "github:owner/repo#123");
    }

    #[test]
    fn missing_repository_and_systems_use_defaults() {
        let mut input = payload();
        input["metadata"]["source"] = json!({});
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.items[0].id, "github:unknown/repo#123");
        assert_eq!(result.metadata.source.systems, vec!["github".to_string()]);
    }

    #[test]
    fn numeric_run_fields_are_stringified() {
        let mut input = payload();
        input["metadata"]["run"]["run_id"] = json!(987654321);
        input["metadata"]["run"]["run_attempt"] = json!(2);
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.metadata.run.run_id.as_deref(), Some("987654321"));
        assert_eq!(result.metadata.run.run_attempt.as_deref(), Some("2"));
    }

    #[test]
    fn missing_run_block_yields_nulls() {
        let mut input = payload();
        input["metadata"].as_object_mut().unwrap().remove("run");
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.metadata.run, Run::default());
    }

    #[test]
    fn missing_issues_is_empty() {
        let mut input = payload();
        input.as_object_mut().unwrap().remove("issues");
        let result = parse_payload(&input).unwrap();
        assert!(result.items.is_empty());
    }

    #[test]
    fn missing_required_field_names_the_item() {
        let mut input = payload();
        input["issues"][1].as_object_mut().unwrap().remove("title");
        let err = parse_payload(&input).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        let msg = err.to_string();
        assert!(msg.contains("github:owner/repo#7"), "{msg}");
        assert!(msg.contains("title"), "{msg}");
    }

    #[test]
    fn malformed_date_is_normalization_error() {
        let mut input = payload();
        input["issues"][0]["created_at"] = json!("yesterday");
        let err = parse_payload(&input).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("github:owner/repo#123"));
        assert!(err.to_string().contains("created_at"));
    }

    #[test]
    fn missing_number_uses_index() {
        let mut input = payload();
        input["issues"][0].as_object_mut().unwrap().remove("number");
        let err = parse_payload(&input).unwrap_err();
        assert!(err.to_string().contains("issues[0]"));
    }

    #[test]
    fn blank_title_and_bad_url_are_rejected() {
        let mut input = payload();
        input["issues"][0]["title"] = json!("   ");
        assert_eq!(parse_payload(&input).unwrap_err().exit_code(), 4);

        let mut input = payload();
        input["issues"][0]["html_url"] = json!("not a url");
        assert_eq!(parse_payload(&input).unwrap_err().exit_code(), 4);
    }

    #[test]
    fn structural_problems_are_adapter_errors() {
        assert_eq!(parse_payload(&json!([])).unwrap_err().exit_code(), 2);
        assert_eq!(parse_payload(&json!({ "issues": [] })).unwrap_err().exit_code(), 2);

        let mut input = payload();
        input["issues"] = json!({ "not": "an array" });
        assert_eq!(parse_payload(&input).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn prior_trace_steps_are_kept() {
        let mut input = payload();
        input["metadata"]["trace"] = json!([{
            "step": "collection",
            "tool": "living-doc-collector-gh",
            "tool_version": "1.2.0",
            "started_at": "2026-01-01T09:00:00Z",
            "finished_at": "2026-01-01T09:05:00Z"
        }]);
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.metadata.trace.len(), 1);
        assert_eq!(result.metadata.trace[0].step, "collection");
        assert!(result.metadata.trace[0].warnings.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn extra_trace_step_fields_are_ignored() {
        let mut input = payload();
        input["metadata"]["trace"] = json!([{
            "step": "collection",
            "tool": "living-doc-collector-gh",
            "tool_version": "1.2.0",
            "status": "ok",
            "started_at": null,
            "finished_at": "2026-01-01T09:05:00Z"
        }]);
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.metadata.trace.len(), 1);
        assert_eq!(result.metadata.trace[0].tool, "living-doc-collector-gh");
        assert!(result.metadata.trace[0].started_at.is_none());
        assert!(result.warnings.is_empty());
        assert_eq!(result.metadata.original_metadata["trace"][0]["status"], "ok");
    }

    #[test]
    fn non_array_trace_is_dropped_with_warning() {
        let mut input = payload();
        input["metadata"]["trace"] = json!({ "note": "free-form" });
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.items.len(), 2);
        assert!(result.metadata.trace.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::MalformedTrace);
        assert_eq!(result.warnings[0].context.as_deref(), Some("metadata.trace"));
    }

    #[test]
    fn unusable_trace_steps_are_skipped() {
        let mut input = payload();
        input["metadata"]["trace"] = json!([
            "collection",
            { "tool": "no-step-name" },
            { "step": "collection", "tool": "x", "started_at": "yesterday" },
            { "step": "collection", "tool": "living-doc-collector-gh", "tool_version": 1 }
        ]);
        let result = parse_payload(&input).unwrap();
        assert_eq!(result.metadata.trace.len(), 1);
        assert_eq!(result.metadata.trace[0].tool_version, "1");

        let contexts: Vec<_> = result
            .warnings
            .iter()
            .map(|w| w.context.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(contexts, ["metadata.trace[0]", "metadata.trace[1]", "metadata.trace[2]"]);
        assert!(result.warnings.iter().all(|w| w.code == WarningCode::MalformedTrace));
    }
}
