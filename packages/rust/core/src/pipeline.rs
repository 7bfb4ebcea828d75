//! End-to-end `normalize-issues` pipeline:
//! load → detect → compatibility → parse → normalize → build → validate → write.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use livingdoc_adapters::{AdapterItem, AdapterRegistry, SourceSelection};
use livingdoc_markdown::{NormalizedBody, normalize_detailed};
use livingdoc_shared::{
    AppConfig, CompatibilityWarning, Document, LivingDocError, Result, WarningCode,
};

use crate::audit::{StepWindow, ToolIdentity, build_envelope};
use crate::builder::{BuildOptions, build};
use crate::clock::Clock;
use crate::validate::validate_json;

/// Tool name recorded in the normalization trace step.
pub const TOOL_NAME: &str = "living-doc-toolkit";

/// Tool version recorded in the normalization trace step.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Pipeline states, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Loaded,
    Detected,
    CompatibilityChecked,
    Parsed,
    Normalized,
    Built,
    Validated,
    Written,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Detected => "detected",
            Self::CompatibilityChecked => "compatibility_checked",
            Self::Parsed => "parsed",
            Self::Normalized => "normalized",
            Self::Built => "built",
            Self::Validated => "validated",
            Self::Written => "written",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Options and outcome
// ---------------------------------------------------------------------------

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Adapter selection.
    pub source: SourceSelection,
    /// Document metadata overrides and defaults.
    pub build: BuildOptions,
    /// Maximum concurrent normalization tasks.
    pub concurrency: usize,
    /// Item count from which normalization runs on the blocking pool.
    pub parallel_threshold: usize,
}

impl NormalizeOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            source: config
                .defaults
                .source
                .parse()
                .unwrap_or(SourceSelection::Auto),
            build: BuildOptions::from_config(config),
            concurrency: config.normalize.concurrency.max(1) as usize,
            parallel_threshold: config.normalize.parallel_threshold,
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    /// The validated document.
    pub document: Document,
    /// Name of the adapter that handled the payload.
    pub adapter: String,
    /// Every warning raised during the run, in order.
    pub warnings: Vec<CompatibilityWarning>,
    /// Wall time of the run.
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a stage has been reached.
    fn stage(&self, stage: PipelineStage);
    /// Called after each item is normalized.
    fn item_normalized(&self, id: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &NormalizeOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: PipelineStage) {}
    fn item_normalized(&self, _id: &str, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &NormalizeOutcome) {}
}

fn reached(stage: PipelineStage, progress: &dyn ProgressReporter) {
    info!(stage = %stage, "pipeline stage reached");
    progress.stage(stage);
}

/// Attach the failing stage to an error.
fn at(stage: PipelineStage) -> impl FnOnce(LivingDocError) -> LivingDocError {
    move |e| e.with_context(stage)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Read `input`, normalize it and write the document to `output`.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub async fn run_service(
    input: &Path,
    output: &Path,
    options: &NormalizeOptions,
    clock: &dyn Clock,
    progress: &dyn ProgressReporter,
) -> Result<NormalizeOutcome> {
    let payload = livingdoc_shared::read_json(input)?;
    reached(PipelineStage::Loaded, progress);

    let outcome = normalize_payload(&payload, options, clock, progress).await?;

    livingdoc_shared::write_json(output, &outcome.document)?;
    reached(PipelineStage::Written, progress);

    progress.done(&outcome);
    info!(
        adapter = %outcome.adapter,
        stories = outcome.document.content.user_stories.len(),
        warnings = outcome.warnings.len(),
        elapsed_ms = outcome.elapsed.as_millis(),
        "normalize pipeline complete"
    );

    Ok(outcome)
}

/// Run detection through validation on an in-memory payload.
#[instrument(skip_all, fields(source = %options.source))]
pub async fn normalize_payload(
    payload: &Value,
    options: &NormalizeOptions,
    clock: &dyn Clock,
    progress: &dyn ProgressReporter,
) -> Result<NormalizeOutcome> {
    let start = Instant::now();

    if !payload.is_object() {
        return Err(LivingDocError::invalid_input("input JSON must be an object"));
    }

    // --- Detect ---
    let registry = AdapterRegistry::new();
    let adapter = registry
        .detect(payload, &options.source)
        .map_err(at(PipelineStage::Detected))?;
    info!(adapter = adapter.name(), "adapter selected");
    reached(PipelineStage::Detected, progress);

    // --- Compatibility ---
    let version = adapter
        .extract_version(payload)
        .map_err(at(PipelineStage::CompatibilityChecked))?;
    let mut warnings = adapter.check_compatibility(&version);
    for w in &warnings {
        warn!(code = %w.code, "{}", w.message);
    }
    reached(PipelineStage::CompatibilityChecked, progress);

    // --- Parse ---
    let started_at = clock.now();
    let result = adapter.parse(payload).map_err(at(PipelineStage::Parsed))?;
    warnings.extend(result.warnings.iter().cloned());
    info!(items = result.items.len(), "payload parsed");
    reached(PipelineStage::Parsed, progress);

    // --- Normalize ---
    let bodies = normalize_items(&result.items, options, progress)
        .await
        .map_err(at(PipelineStage::Normalized))?;
    let mut sections = Vec::with_capacity(bodies.len());
    for (index, (item, body)) in result.items.iter().zip(bodies).enumerate() {
        warnings.extend(duplicate_warnings(index, item, &body));
        sections.push(body.sections);
    }
    reached(PipelineStage::Normalized, progress);

    // --- Build ---
    let tool = ToolIdentity::new(TOOL_NAME, TOOL_VERSION);
    let window = StepWindow {
        started_at,
        finished_at: clock.now(),
    };
    let envelope = build_envelope(
        &result.metadata,
        adapter.name(),
        &tool,
        warnings.clone(),
        window,
    );
    let mut document = build(&result, sections, envelope, &options.build, clock)
        .map_err(at(PipelineStage::Built))?;

    // The normalization step's window closes after the build.
    if let Some(step) = document
        .meta
        .audit
        .as_mut()
        .and_then(|audit| audit.trace.last_mut())
    {
        step.finished_at = Some(clock.now());
    }
    reached(PipelineStage::Built, progress);

    // --- Validate ---
    let serialized = serde_json::to_value(&document).map_err(|e| {
        LivingDocError::schema_validation(format!("document serialization failed: {e}"))
    })?;
    validate_json(&serialized).map_err(at(PipelineStage::Validated))?;
    reached(PipelineStage::Validated, progress);

    Ok(NormalizeOutcome {
        document,
        adapter: adapter.name().to_string(),
        warnings,
        elapsed: start.elapsed(),
    })
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize every item body, preserving item order.
///
/// At or above `parallel_threshold` items, bodies are normalized on the
/// blocking pool with at most `concurrency` tasks in flight.
async fn normalize_items(
    items: &[AdapterItem],
    options: &NormalizeOptions,
    progress: &dyn ProgressReporter,
) -> Result<Vec<NormalizedBody>> {
    let total = items.len();

    if total < options.parallel_threshold.max(1) {
        return Ok(items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let body = normalize_detailed(item.body.as_deref());
                progress.item_normalized(&item.id, i + 1, total);
                body
            })
            .collect());
    }

    info!(items = total, concurrency = options.concurrency, "normalizing in parallel");
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut handles = Vec::with_capacity(total);

    for item in items {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| LivingDocError::normalization(format!("worker pool closed: {e}")))?;
        let body = item.body.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            normalize_detailed(body.as_deref())
        }));
    }

    let mut bodies = Vec::with_capacity(total);
    for (i, (handle, item)) in handles.into_iter().zip(items).enumerate() {
        let body = handle.await.map_err(|e| {
            LivingDocError::normalization(format!("item {}: task failed: {e}", item.id))
        })?;
        progress.item_normalized(&item.id, i + 1, total);
        bodies.push(body);
    }

    Ok(bodies)
}

fn duplicate_warnings(
    index: usize,
    item: &AdapterItem,
    body: &NormalizedBody,
) -> Vec<CompatibilityWarning> {
    body.repeated
        .iter()
        .map(|key| {
            let warning = CompatibilityWarning::new(
                WarningCode::DuplicateSection,
                format!(
                    "Section '{key}' appears more than once in item {}; content was concatenated",
                    item.id
                ),
                format!("content.user_stories[{index}].sections.{key}"),
            );
            warn!(code = %warning.code, item = %item.id, "{}", warning.message);
            warning
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
