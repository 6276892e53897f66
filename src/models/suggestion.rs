//! Engine-offered inline candidates.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::target::Target;

/// Metadata the engine reports for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SuggestionMeta {
    /// Source snippet showing how the program uses the candidate.
    #[serde(rename = "use", default, deserialize_with = "null_as_empty")]
    pub use_site: String,
    /// Source file of the defining module; empty for namespace packages,
    /// which have no file.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub path: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Candidate name → metadata, ordered by name.
pub type Suggestions = BTreeMap<String, SuggestionMeta>;

/// Display form of a suggestion for a host's picker widget.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SuggestionOption {
    /// `"<name> (<use>)"`.
    pub label: String,
    /// Candidate name.
    pub value: String,
}

impl SuggestionOption {
    fn from_entry(name: &str, meta: &SuggestionMeta) -> Self {
        Self {
            label: format!("{name} ({})", meta.use_site),
            value: name.to_owned(),
        }
    }
}

/// Remove every candidate whose name is already an accepted target.
#[must_use]
pub fn without_targets(mut suggestions: Suggestions, targets: &[Target]) -> Suggestions {
    suggestions.retain(|name, _| !targets.iter().any(|t| &t.name == name));
    suggestions
}

/// Build picker options sorted by label.
///
/// Candidates whose top-level module is listed in `hidden_modules` are left
/// out unless `show_all` is set.
#[must_use]
pub fn display_options(
    suggestions: &Suggestions,
    hidden_modules: &[String],
    show_all: bool,
) -> Vec<SuggestionOption> {
    let mut options: Vec<SuggestionOption> = suggestions
        .iter()
        .filter(|(name, _)| {
            if show_all {
                return true;
            }
            let base = name.split('.').next().unwrap_or_default();
            !hidden_modules.iter().any(|m| m == base)
        })
        .map(|(name, meta)| SuggestionOption::from_entry(name, meta))
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}
