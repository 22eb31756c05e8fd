//! Parameterized persistence statements and Cypher pattern builders.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::PropertyMap;

/// A persistence operation: Cypher text plus a flat parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    pub parameters: PropertyMap,
}

impl Statement {
    pub fn new(text: impl Into<String>, parameters: PropertyMap) -> Self {
        Self {
            text: text.into(),
            parameters,
        }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = serde_json::to_string(&self.parameters).map_err(|_| std::fmt::Error)?;
        write!(f, "{} {params}", self.text)
    }
}

/// Render labels as a Cypher pattern fragment: `` :`A`:`B` ``.
///
/// Label order follows the input iterator; callers pass sorted sets where
/// determinism matters.
pub fn escape_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    let labels: SmallVec<[&str; 8]> = labels.into_iter().collect();
    let mut out = String::with_capacity(labels.iter().map(|l| l.len() + 3).sum());
    for label in labels {
        out.push_str(":`");
        out.push_str(label);
        out.push('`');
    }
    out
}

/// Render relationship labels as an alternation: `` :`A`|`B` ``.
/// Empty input renders as the unrestricted empty string.
pub fn escape_relationship_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    let mut labels: SmallVec<[&str; 8]> = labels.into_iter().collect();
    labels.sort_unstable();
    let mut out = String::new();
    for (i, label) in labels.iter().enumerate() {
        out.push_str(if i == 0 { ":`" } else { "|`" });
        out.push_str(label);
        out.push('`');
    }
    out
}

/// Build a vertex match pattern: `` (alias:`A`:`B`{_id: $id}) ``.
pub fn vertex_pattern<'a>(
    alias: Option<&str>,
    labels: impl IntoIterator<Item = &'a str>,
    id_field: &str,
    id_parameter: &str,
) -> String {
    format!(
        "({}{}{{{id_field}: ${id_parameter}}})",
        alias.unwrap_or(""),
        escape_labels(labels)
    )
}

/// Build a neighbor pattern: `` (alias:`Partition`) `` with the labels a
/// partition injects into every vertex pattern.
pub fn neighbor_pattern(alias: &str, pattern_labels: &HashSet<String>) -> String {
    let mut labels: SmallVec<[&str; 8]> =
        pattern_labels.iter().map(String::as_str).collect();
    labels.sort_unstable();
    format!("({alias}{})", escape_labels(labels))
}
