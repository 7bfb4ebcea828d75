//! PDF-ready document assembly.

use tracing::debug;

use livingdoc_adapters::{AdapterItem, AdapterResult};
use livingdoc_shared::{
    AppConfig, AuditEnvelope, Content, Document, LivingDocError, Meta, Result, RunContext,
    SCHEMA_VERSION, Sections, SelectionSummary, UserStory,
};

use crate::clock::Clock;

/// Upper bound on `meta.document_title`, in characters.
pub const MAX_TITLE_LEN: usize = 200;
/// Upper bound on `meta.document_version`, in characters.
pub const MAX_VERSION_LEN: usize = 50;

/// Caller overrides and configured fallbacks for document metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Explicit title; blank counts as absent.
    pub document_title: Option<String>,
    /// Explicit version; blank counts as absent.
    pub document_version: Option<String>,
    /// Prefix of the derived title.
    pub title_prefix: String,
    /// Version used when none is given.
    pub default_version: String,
}

impl BuildOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            document_title: None,
            document_version: None,
            title_prefix: config.defaults.title_prefix.clone(),
            default_version: config.defaults.document_version.clone(),
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Assemble the document from parsed items, their normalized sections and
/// the audit envelope.
///
/// `sections[i]` belongs to `result.items[i]`; stories keep item order.
pub fn build(
    result: &AdapterResult,
    sections: Vec<Sections>,
    envelope: AuditEnvelope,
    options: &BuildOptions,
    clock: &dyn Clock,
) -> Result<Document> {
    // Misalignment is a pipeline defect, not bad input.
    if sections.len() != result.items.len() {
        return Err(LivingDocError::schema_validation(format!(
            "{} section sets for {} items",
            sections.len(),
            result.items.len()
        )));
    }

    let source = &result.metadata.source;
    let system = source.systems.first().map(String::as_str);

    let document_title = resolve_title(options, &source.repositories, system)?;
    let document_version = resolve_version(options)?;
    let source_set = source_set(&source.repositories, &source.systems);

    let run = &result.metadata.run;
    let run_context = run.run_id.as_ref().map(|run_id| RunContext {
        ci_run_id: Some(run_id.clone()),
        triggered_by: run.actor.clone(),
        branch: run.git_ref.clone(),
        commit_sha: run.sha.clone(),
    });

    let user_stories: Vec<UserStory> = result
        .items
        .iter()
        .zip(sections)
        .map(|(item, sections)| to_story(item, sections))
        .collect();

    debug!(stories = user_stories.len(), title = %document_title, "document assembled");

    Ok(Document {
        schema_version: SCHEMA_VERSION.to_string(),
        meta: Meta {
            document_title,
            document_version,
            generated_at: clock.now(),
            source_set,
            selection_summary: SelectionSummary::all_included(user_stories.len()),
            run_context,
            audit: Some(envelope),
        },
        content: Content { user_stories },
    })
}

fn to_story(item: &AdapterItem, sections: Sections) -> UserStory {
    UserStory {
        id: item.id.clone(),
        title: item.title.clone(),
        state: item.state.clone(),
        tags: item.tags.clone(),
        url: item.url.clone(),
        timestamps: item.timestamps,
        sections,
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn resolve_title(
    options: &BuildOptions,
    repositories: &[String],
    system: Option<&str>,
) -> Result<String> {
    if let Some(title) = non_blank(options.document_title.as_ref()) {
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(LivingDocError::invalid_input(format!(
                "document title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        return Ok(title.to_string());
    }

    let prefix = options.title_prefix.trim();
    let derived = match repositories.first() {
        Some(repo) => {
            let repo = system
                .and_then(|s| repo.strip_prefix(&format!("{s}:")).map(str::to_string))
                .unwrap_or_else(|| repo.clone());
            format!("{prefix} - {repo}")
        }
        None => prefix.to_string(),
    };
    // Derived titles are truncated to the bound.
    Ok(derived.chars().take(MAX_TITLE_LEN).collect())
}

fn resolve_version(options: &BuildOptions) -> Result<String> {
    let version = non_blank(options.document_version.as_ref())
        .or_else(|| non_blank(Some(&options.default_version)))
        .ok_or_else(|| LivingDocError::config("default document version is empty"))?;
    if version.chars().count() > MAX_VERSION_LEN {
        return Err(LivingDocError::invalid_input(format!(
            "document version exceeds {MAX_VERSION_LEN} characters"
        )));
    }
    Ok(version.to_string())
}

/// Repositories qualified with the primary system, or the systems themselves
/// when no repository is listed.
fn source_set(repositories: &[String], systems: &[String]) -> Vec<String> {
    let Some(system) = systems.first() else {
        return repositories.to_vec();
    };
    if repositories.is_empty() {
        return systems.to_vec();
    }
    let prefix = format!("{system}:");
    repositories
        .iter()
        .map(|repo| {
            if repo.starts_with(&prefix) {
                repo.clone()
            } else {
                format!("{prefix}{repo}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use livingdoc_adapters::AdapterMetadata;
    use livingdoc_shared::{AUDIT_SCHEMA_VERSION, Producer, Run, Source, Timestamps};
    use std::collections::BTreeMap;

    fn item(n: u64) -> AdapterItem {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        AdapterItem {
            id: format!("github:owner/repo#{n}"),
            title: format!("Story {n}"),
            state: "open".into(),
            tags: vec!["feature".into()],
            url: format!("https://github.com/owner/repo/issues/{n}"),
            timestamps: Timestamps { created: at, updated: at },
            body: None,
        }
    }

    fn result(items: Vec<AdapterItem>, repositories: Vec<&str>, run: Run) -> AdapterResult {
        AdapterResult {
            items,
            metadata: AdapterMetadata {
                producer: Producer {
                    name: "AbsaOSS/living-doc-collector-gh".into(),
                    version: "1.0.0".into(),
                    build: None,
                },
                run,
                source: Source {
                    systems: vec!["github".into()],
                    repositories: repositories.into_iter().map(String::from).collect(),
                    organization: None,
                    enterprise: None,
                },
                trace: vec![],
                original_metadata: serde_json::json!({}),
            },
            warnings: vec![],
        }
    }

    fn envelope(r: &AdapterResult) -> AuditEnvelope {
        AuditEnvelope {
            schema_version: AUDIT_SCHEMA_VERSION.into(),
            producer: r.metadata.producer.clone(),
            run: r.metadata.run.clone(),
            source: r.metadata.source.clone(),
            trace: vec![],
            extensions: BTreeMap::new(),
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap())
    }

    fn build_default(r: &AdapterResult) -> Document {
        let sections = vec![Sections::default(); r.items.len()];
        build(r, sections, envelope(r), &BuildOptions::default(), &clock()).unwrap()
    }

    #[test]
    fn defaults_from_repository() {
        let r = result(vec![item(1), item(2)], vec!["owner/repo"], Run::default());
        let doc = build_default(&r);

        assert_eq!(doc.schema_version, "1.0");
        assert_eq!(doc.meta.document_title, "Living Documentation - owner/repo");
        assert_eq!(doc.meta.document_version, "1.0.0");
        assert_eq!(doc.meta.source_set, vec!["github:owner/repo".to_string()]);
        assert_eq!(doc.meta.generated_at, clock().0);
        assert_eq!(doc.meta.selection_summary, SelectionSummary::all_included(2));
        assert!(doc.meta.run_context.is_none());
        assert!(doc.meta.audit.is_some());
    }

    #[test]
    fn stories_keep_item_order() {
        let r = result(vec![item(3), item(1), item(2)], vec!["owner/repo"], Run::default());
        let doc = build_default(&r);
        let ids: Vec<_> = doc.content.user_stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["github:owner/repo#3", "github:owner/repo#1", "github:owner/repo#2"]);
    }

    #[test]
    fn explicit_title_and_version_win() {
        let r = result(vec![item(1)], vec!["owner/repo"], Run::default());
        let options = BuildOptions {
            document_title: Some("Release Notes".into()),
            document_version: Some("2.1.0".into()),
            ..BuildOptions::default()
        };
        let doc = build(&r, vec![Sections::default()], envelope(&r), &options, &clock()).unwrap();
        assert_eq!(doc.meta.document_title, "Release Notes");
        assert_eq!(doc.meta.document_version, "2.1.0");
    }

    #[test]
    fn blank_title_falls_back() {
        let r = result(vec![], vec![], Run::default());
        let options = BuildOptions {
            document_title: Some("   ".into()),
            ..BuildOptions::default()
        };
        let doc = build(&r, vec![], envelope(&r), &options, &clock()).unwrap();
        assert_eq!(doc.meta.document_title, "Living Documentation");
        assert_eq!(doc.meta.source_set, vec!["github".to_string()]);
    }

    #[test]
    fn oversized_title_is_invalid_input() {
        let r = result(vec![], vec![], Run::default());
        let options = BuildOptions {
            document_title: Some("x".repeat(201)),
            ..BuildOptions::default()
        };
        let err = build(&r, vec![], envelope(&r), &options, &clock()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn prefixed_repositories_are_not_double_prefixed() {
        let r = result(vec![], vec!["github:owner/repo", "other/repo"], Run::default());
        let doc = build_default(&r);
        assert_eq!(
            doc.meta.source_set,
            vec!["github:owner/repo".to_string(), "github:other/repo".to_string()]
        );
        assert_eq!(doc.meta.document_title, "Living Documentation - owner/repo");
    }

    #[test]
    fn run_context_requires_run_id() {
        let run = Run {
            run_id: Some("99".into()),
            actor: Some("octocat".into()),
            git_ref: Some("refs/heads/main".into()),
            sha: Some("abc".into()),
            ..Run::default()
        };
        let r = result(vec![], vec!["owner/repo"], run);
        let ctx = build_default(&r).meta.run_context.expect("run context");
        assert_eq!(ctx.ci_run_id.as_deref(), Some("99"));
        assert_eq!(ctx.triggered_by.as_deref(), Some("octocat"));
        assert_eq!(ctx.branch.as_deref(), Some("refs/heads/main"));
        assert_eq!(ctx.commit_sha.as_deref(), Some("abc"));

        let run = Run {
            actor: Some("x".into()),
            ..Run::default()
        };
        let r = result(vec![], vec!["owner/repo"], run);
        assert!(build_default(&r).meta.run_context.is_none());
    }

    #[test]
    fn misaligned_sections_are_rejected() {
        let r = result(vec![item(1)], vec!["owner/repo"], Run::default());
        let err = build(&r, vec![], envelope(&r), &BuildOptions::default(), &clock()).unwrap_err();
        assert!(matches!(err, LivingDocError::SchemaValidation { .. }));
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("0 section sets for 1 items"));
    }
}
