//! Adapter for `AbsaOSS/living-doc-collector-gh` exports.
//!
//! Expected payload shape:
//!
//! ```json
//! {
//!   "metadata": {
//!     "generator": { "name": "...", "version": "1.2.0" },
//!     "run": {...},
//!     "source": {...},
//!     "trace": [...]
//!   },
//!   "issues": [ { "number": 1, "title": "...", "state": "open", "labels": [...], ... } ]
//! }
//! ```

mod parser;

use serde_json::Value;
use tracing::instrument;

use livingdoc_shared::{CompatibilityWarning, LivingDocError, Result};

use crate::model::AdapterResult;
use crate::version::{Version, VersionRange};
use crate::SourceAdapter;

/// Adapter name used for `--source`.
pub const ADAPTER_NAME: &str = "collector-gh";

/// Value of `metadata.generator.name` written by the collector.
pub const PRODUCER_ID: &str = "AbsaOSS/living-doc-collector-gh";

/// Producer versions this adapter has been confirmed against.
pub const COLLECTOR_GH_RANGE: VersionRange =
    VersionRange::new(Version::new(1, 0, 0), Version::new(2, 0, 0));

/// Dotted path of the version field, used as warning context.
const VERSION_FIELD: &str = "metadata.generator.version";

/// System name used when the payload does not declare one.
const DEFAULT_SYSTEM: &str = "github";

/// Parses issue exports of the GitHub living-doc collector.
pub struct CollectorGhAdapter;

impl SourceAdapter for CollectorGhAdapter {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn can_handle(&self, payload: &Value) -> bool {
        payload
            .pointer("/metadata/generator/name")
            .and_then(Value::as_str)
            .is_some_and(|name| name == PRODUCER_ID)
    }

    fn extract_version(&self, payload: &Value) -> Result<String> {
        match payload.pointer("/metadata/generator/version") {
            Some(Value::String(v)) if !v.trim().is_empty() => Ok(v.clone()),
            Some(Value::String(_)) => Err(LivingDocError::adapter(format!(
                "{VERSION_FIELD} is empty"
            ))),
            Some(other) => Err(LivingDocError::adapter(format!(
                "{VERSION_FIELD} must be a string, found {other}"
            ))),
            None => Err(LivingDocError::adapter(format!(
                "missing {VERSION_FIELD}"
            ))),
        }
    }

    fn check_compatibility(&self, version: &str) -> Vec<CompatibilityWarning> {
        COLLECTOR_GH_RANGE.check(version, VERSION_FIELD)
    }

    #[instrument(skip_all, fields(adapter = ADAPTER_NAME))]
    fn parse(&self, payload: &Value) -> Result<AdapterResult> {
        parser::parse_payload(payload)
    }
}
