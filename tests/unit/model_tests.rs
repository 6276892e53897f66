//! Unit tests for targets, suggestions and program history.

use inliner_session::models::history::ProgramHistory;
use inliner_session::models::suggestion::{
    display_options, without_targets, SuggestionMeta, Suggestions,
};
use inliner_session::models::target::Target;

fn meta(use_site: &str) -> SuggestionMeta {
    SuggestionMeta {
        use_site: use_site.into(),
        path: format!("/src/{use_site}.py"),
    }
}

fn hidden() -> Vec<String> {
    vec!["matplotlib".into(), "pandas".into(), "numpy".into()]
}

// ── Target ──────────────────────────────────────────────────────────────────

#[test]
fn target_serialises_use_site_as_use() {
    let target = Target::new("m.f", "/m.py", "m.f(1)");

    let value = serde_json::to_value(&target).expect("target must serialise");

    assert_eq!(
        value,
        serde_json::json!({"name": "m.f", "path": "/m.py", "use": "m.f(1)"})
    );
}

#[test]
fn named_target_has_empty_metadata() {
    let target = Target::named("pkg.mod.fn");

    assert_eq!(target.path, "");
    assert_eq!(target.use_site, "");
}

// ── Suggestions ─────────────────────────────────────────────────────────────

#[test]
fn accepted_targets_are_filtered_from_suggestions() {
    let mut offered = Suggestions::new();
    offered.insert("pkg.mod".into(), meta("call"));
    offered.insert("pkg.other".into(), meta("other"));

    let remaining = without_targets(offered, &[Target::named("pkg.mod")]);

    assert_eq!(remaining.keys().collect::<Vec<_>>(), vec!["pkg.other"]);
}

#[test]
fn options_are_labelled_and_sorted() {
    let mut offered = Suggestions::new();
    offered.insert("b.run".into(), meta("run()"));
    offered.insert("a.zed".into(), meta("zed()"));

    let options = display_options(&offered, &hidden(), false);

    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["a.zed (zed())", "b.run (run())"]);
    assert_eq!(options[0].value, "a.zed");
}

#[test]
fn hidden_modules_match_on_top_level_package_only() {
    let mut offered = Suggestions::new();
    offered.insert("pandas.core.frame.DataFrame.groupby".into(), meta("df.groupby"));
    offered.insert("numpyro.sample".into(), meta("sample"));
    offered.insert("seaborn.categorical.boxplot".into(), meta("sns.boxplot"));

    let values: Vec<String> = display_options(&offered, &hidden(), false)
        .into_iter()
        .map(|o| o.value)
        .collect();

    assert_eq!(values, vec!["numpyro.sample", "seaborn.categorical.boxplot"]);
    assert_eq!(display_options(&offered, &hidden(), true).len(), 3);
}

// ── History ─────────────────────────────────────────────────────────────────

#[test]
fn history_starts_empty() {
    let history = ProgramHistory::new();

    assert!(history.is_empty());
    assert!(!history.can_undo());
    assert_eq!(history.latest(), None);
    assert_eq!(history.last_change(), None);
}

#[test]
fn last_change_pairs_the_two_newest_snapshots() {
    let mut history = ProgramHistory::new();
    history.push("a".into());
    assert_eq!(history.last_change(), None);

    history.push("b".into());
    history.push("c".into());

    assert_eq!(history.last_change(), Some(("b", "c")));
    assert_eq!(history.latest(), Some("c"));
    assert!(history.can_undo());
}

#[test]
fn trim_after_undo_drops_resync_and_undone_entry() {
    let mut history = ProgramHistory::new();
    for text in ["v0", "v1", "v0"] {
        history.push(text.into());
    }

    history.trim_after_undo();

    assert_eq!(history.entries(), ["v0".to_owned()]);
    assert_eq!(history.len(), 1);
}
