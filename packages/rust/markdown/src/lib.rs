//! Markdown section normalization for user story bodies.
//!
//! Item bodies are free-form Markdown. This crate splits them at second-level
//! headings and maps each heading, through a fixed synonym table, onto one of
//! the seven canonical [`Sections`] keys. Anything that does not match ends up
//! in `description`, so no text is dropped.

pub mod headings;

use std::collections::BTreeMap;

use tracing::debug;

use livingdoc_shared::{SectionKey, Sections};

pub use headings::{HeadingBlock, normalize_heading, parse_heading, split_by_headings};

/// Heading level that delimits sections.
pub const SECTION_HEADING_LEVEL: usize = 2;

/// Fixed synonym table. Lookup happens after [`normalize_heading`].
pub const HEADING_SYNONYMS: &[(SectionKey, &[&str])] = &[
    (SectionKey::Description, &["description", "overview", "summary"]),
    (SectionKey::BusinessValue, &["business value", "value", "why"]),
    (SectionKey::Preconditions, &["preconditions", "prerequisites", "setup"]),
    (SectionKey::AcceptanceCriteria, &["acceptance criteria", "ac", "done criteria"]),
    (SectionKey::UserGuide, &["user guide", "how to", "instructions"]),
    (SectionKey::Connections, &["connections", "related", "links"]),
    (SectionKey::LastEdited, &["last edited", "history", "changes"]),
];

/// Separator placed between concatenated fragments of one section.
const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Resolve a heading label to its canonical key.
pub fn canonical_key(heading: &str) -> Option<SectionKey> {
    let normalized = normalize_heading(heading);
    HEADING_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&normalized.as_str()))
        .map(|(key, _)| *key)
}

/// Sections plus what the normalizer noticed along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBody {
    /// The canonical sections.
    pub sections: Sections,
    /// Keys whose heading appeared more than once, in canonical order.
    pub repeated: Vec<SectionKey>,
    /// Labels of headings that matched no synonym, in order of appearance.
    pub unmatched_headings: Vec<String>,
}

/// Normalize an item body into canonical sections.
///
/// A `None`, empty or whitespace-only body yields all-null sections.
pub fn normalize_sections(body: Option<&str>) -> Sections {
    normalize_detailed(body).sections
}

/// Like [`normalize_sections`] but also reports repeated and unmatched headings.
///
/// Rules:
/// 1. Text before the first `##` heading is the unheaded block.
/// 2. A matched heading's trimmed content fills its key; repeats are
///    concatenated in order of appearance, separated by a blank line.
/// 3. `description` is the matched description content, then the unheaded
///    block, then every unmatched heading re-emitted as `### <label>` with its
///    content.
/// 4. A key whose blocks were all empty stays `None`.
pub fn normalize_detailed(body: Option<&str>) -> NormalizedBody {
    let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
        return NormalizedBody::default();
    };

    let mut fragments: BTreeMap<SectionKey, Vec<String>> = BTreeMap::new();
    let mut occurrences: BTreeMap<SectionKey, usize> = BTreeMap::new();
    let mut preamble: Vec<String> = Vec::new();
    let mut unmatched: Vec<String> = Vec::new();
    let mut unmatched_headings: Vec<String> = Vec::new();

    for block in split_by_headings(body, SECTION_HEADING_LEVEL) {
        let content = block.content.trim();

        let Some(heading) = block.heading else {
            if !content.is_empty() {
                preamble.push(content.to_string());
            }
            continue;
        };

        match canonical_key(&heading) {
            Some(key) => {
                *occurrences.entry(key).or_default() += 1;
                if !content.is_empty() {
                    fragments.entry(key).or_default().push(content.to_string());
                }
            }
            None => {
                debug!(heading = %heading, "unmatched heading folded into description");
                let nested = if content.is_empty() {
                    format!("### {heading}")
                } else {
                    format!("### {heading}\n{content}")
                };
                unmatched.push(nested);
                unmatched_headings.push(heading);
            }
        }
    }

    let mut sections = Sections::default();
    for key in SectionKey::ALL {
        let mut parts = fragments.remove(&key).unwrap_or_default();
        if key == SectionKey::Description {
            parts.append(&mut preamble);
            parts.append(&mut unmatched);
        }
        if !parts.is_empty() {
            sections.set(key, Some(parts.join(FRAGMENT_SEPARATOR)));
        }
    }

    let repeated = occurrences
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect();

    NormalizedBody {
        sections,
        repeated,
        unmatched_headings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
