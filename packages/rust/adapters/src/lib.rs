//! Producer adapters for living-doc.
//!
//! An adapter recognizes one producer's JSON export, checks the producer
//! version against the range it was confirmed for, and maps the payload onto
//! typed [`AdapterItem`]s plus audit metadata. Adapters are pure: no IO, no
//! mutation of the input.

mod collector_gh;
mod model;
pub mod version;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use livingdoc_shared::{CompatibilityWarning, LivingDocError, Result};

pub use collector_gh::{COLLECTOR_GH_RANGE, CollectorGhAdapter};
pub use model::{AdapterItem, AdapterMetadata, AdapterResult};
pub use version::{Version, VersionRange};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Contract every producer adapter implements.
///
/// Adapters are tried in registration order during auto-detection.
pub trait SourceAdapter: Send + Sync {
    /// Adapter identifier used for explicit selection, e.g. `collector-gh`.
    fn name(&self) -> &str;

    /// Whether the payload looks like this producer's output. Never fails.
    fn can_handle(&self, payload: &Value) -> bool;

    /// Read the producer version string from the payload.
    ///
    /// Fails with an adapter error when the version is absent or empty.
    fn extract_version(&self, payload: &Value) -> Result<String>;

    /// Compare a version string against the confirmed range. Never fails;
    /// out-of-range or unparseable versions produce warnings.
    fn check_compatibility(&self, version: &str) -> Vec<CompatibilityWarning>;

    /// Map the payload onto typed items and metadata.
    fn parse(&self, payload: &Value) -> Result<AdapterResult>;
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// How to choose an adapter for a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceSelection {
    /// Probe every registered adapter in order.
    #[default]
    Auto,
    /// Use the adapter with this name.
    Named(String),
}

impl FromStr for SourceSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Named(s.to_string()))
        }
    }
}

impl fmt::Display for SourceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered adapters in detection order.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    /// Create a registry with all built-in adapters.
    pub fn new() -> Self {
        Self {
            adapters: vec![Box::new(CollectorGhAdapter)],
        }
    }

    /// Registered adapter names, in detection order.
    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Look up an adapter by name.
    pub fn get(&self, name: &str) -> Option<&dyn SourceAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// Resolve the adapter for a payload.
    ///
    /// `Named` performs no payload inspection; an unknown name is an adapter
    /// error. `Auto` returns the first adapter whose `can_handle` accepts the
    /// payload, or an adapter error when none does.
    pub fn detect(
        &self,
        payload: &Value,
        selection: &SourceSelection,
    ) -> Result<&dyn SourceAdapter> {
        match selection {
            SourceSelection::Named(name) => self.get(name).ok_or_else(|| {
                LivingDocError::adapter(format!(
                    "Unsupported adapter: {name} (available: {})",
                    self.names().join(", ")
                ))
            }),
            SourceSelection::Auto => {
                for adapter in &self.adapters {
                    if adapter.can_handle(payload) {
                        debug!(adapter = adapter.name(), "adapter detected");
                        return Ok(adapter.as_ref());
                    }
                }
                Err(LivingDocError::adapter(format!(
                    "no compatible adapter found (tried: {})",
                    self.names().join(", ")
                )))
            }
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collector_payload() -> Value {
        json!({
            "metadata": {
                "generator": { "name": "AbsaOSS/living-doc-collector-gh", "version": "1.2.0" }
            },
            "issues": []
        })
    }

    #[test]
    fn selection_from_str() {
        assert_eq!("auto".parse::<SourceSelection>().unwrap(), SourceSelection::Auto);
        assert_eq!("AUTO".parse::<SourceSelection>().unwrap(), SourceSelection::Auto);
        assert_eq!(
            "collector-gh".parse::<SourceSelection>().unwrap(),
            SourceSelection::Named("collector-gh".into())
        );
        assert_eq!(SourceSelection::Auto.to_string(), "auto");
    }

    #[test]
    fn auto_detects_collector_gh() {
        let registry = AdapterRegistry::new();
        let adapter = registry
            .detect(&collector_payload(), &SourceSelection::Auto)
            .unwrap();
        assert_eq!(adapter.name(), "collector-gh");
    }

    #[test]
    fn auto_detection_fails_without_generator_name() {
        let registry = AdapterRegistry::new();
        let payload = json!({ "metadata": { "generator": { "version": "1.0.0" } }, "issues": [] });
        let err = registry
            .detect(&payload, &SourceSelection::Auto)
            .err()
            .expect("detection should fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn auto_detection_fails_for_unrelated_json() {
        let registry = AdapterRegistry::default();
        for payload in [json!({}), json!([1, 2, 3]), json!("text"), json!({ "issues": [] })] {
            assert!(registry.detect(&payload, &SourceSelection::Auto).is_err());
        }
    }

    #[test]
    fn explicit_selection_skips_inspection() {
        let registry = AdapterRegistry::new();
        let adapter = registry
            .detect(&json!({}), &SourceSelection::Named("collector-gh".into()))
            .unwrap();
        assert_eq!(adapter.name(), "collector-gh");
    }

    #[test]
    fn unknown_explicit_selection_is_adapter_error() {
        let registry = AdapterRegistry::new();
        let err = registry
            .detect(&collector_payload(), &SourceSelection::Named("jira".into()))
            .err()
            .expect("unknown adapter");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Unsupported adapter: jira"));
    }

    #[test]
    fn names_in_detection_order() {
        assert_eq!(AdapterRegistry::new().names(), vec!["collector-gh"]);
    }
}
