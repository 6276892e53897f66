//! Integration tests for target editing, the explicit target sync, and the
//! suggestion/target disjointness invariant.

use inliner_session::config::GlobalConfig;
use inliner_session::models::target::{CursorPosition, Target};
use inliner_session::AppError;
use serde_json::json;

use super::test_helpers::{new_session_with_config, ready_session, Op};

fn names(targets: &[Target]) -> Vec<String> {
    targets.iter().map(|t| t.name.clone()).collect()
}

#[tokio::test]
async fn add_target_syncs_full_ordered_list() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;

    session.add_target(Target::named("pkg.a")).await.unwrap();
    session.add_target(Target::named("pkg.b")).await.unwrap();

    assert_eq!(names(session.targets()), vec!["pkg.a", "pkg.b"]);
    assert_eq!(engine.remote_targets(), vec!["pkg.a", "pkg.b"]);
}

#[tokio::test]
async fn duplicate_target_is_rejected_without_sync() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    session.add_target(Target::named("pkg.a")).await.unwrap();
    let before = engine.call_count();

    let err = session.add_target(Target::named("pkg.a")).await.unwrap_err();

    assert!(err.is_precondition());
    assert_eq!(engine.call_count(), before);
    assert_eq!(session.targets().len(), 1);
}

#[tokio::test]
async fn failed_sync_is_surfaced_and_targets_roll_back() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    session.add_target(Target::named("pkg.a")).await.unwrap();
    engine.fail(Op::Sync);

    let err = session.add_target(Target::named("pkg.b")).await.unwrap_err();

    assert!(matches!(err, AppError::Remote { ref operation, .. } if operation == "sync_targets"));
    assert_eq!(names(session.targets()), vec!["pkg.a"]);

    let err = session.remove_target("pkg.a").await.unwrap_err();
    assert!(matches!(err, AppError::Remote { .. }));
    assert_eq!(names(session.targets()), vec!["pkg.a"]);
}

#[tokio::test]
async fn refresh_never_reoffers_accepted_targets() {
    let (mut session, engine, _editor) = ready_session("import pkg.mod").await;
    engine.set_suggestions(json!({"pkg.mod": {"use": "call", "path": "/a"}}));
    session.refresh_suggestions().await.unwrap();
    assert!(session.suggestions().contains_key("pkg.mod"));

    session
        .add_target(Target::new("pkg.mod", "/a", "call"))
        .await
        .unwrap();
    assert!(!session.suggestions().contains_key("pkg.mod"));

    session.refresh_suggestions().await.unwrap();
    assert!(!session.suggestions().contains_key("pkg.mod"));
    for target in session.targets() {
        assert!(!session.suggestions().contains_key(&target.name));
    }
}

#[tokio::test]
async fn refresh_replaces_the_whole_suggestion_set() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    engine.set_suggestions(json!({"a.one": {"use": "one()", "path": "/a"}}));
    session.refresh_suggestions().await.unwrap();

    engine.set_suggestions(json!({"b.two": {"use": "two()", "path": "/b"}}));
    session.refresh_suggestions().await.unwrap();

    assert_eq!(
        session.suggestions().keys().cloned().collect::<Vec<_>>(),
        vec!["b.two".to_owned()]
    );
}

#[tokio::test]
async fn failed_refresh_keeps_previous_suggestions() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    engine.set_suggestions(json!({"a.one": {"use": "one()", "path": "/a"}}));
    session.refresh_suggestions().await.unwrap();
    engine.fail(Op::Suggestions);

    assert!(session.refresh_suggestions().await.is_err());
    assert!(session.suggestions().contains_key("a.one"));
}

#[tokio::test]
async fn accept_suggestion_moves_it_into_targets() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    engine.set_suggestions(json!({
        "seaborn.categorical.boxplot": {"use": "sns.boxplot", "path": "/sns/categorical.py"}
    }));
    session.refresh_suggestions().await.unwrap();

    session
        .accept_suggestion("seaborn.categorical.boxplot")
        .await
        .unwrap();

    assert_eq!(
        session.targets(),
        [Target::new(
            "seaborn.categorical.boxplot",
            "/sns/categorical.py",
            "sns.boxplot"
        )]
    );
    assert!(session.suggestions().is_empty());
    assert_eq!(engine.remote_targets(), vec!["seaborn.categorical.boxplot"]);
}

#[tokio::test]
async fn accepting_unknown_suggestion_is_not_found() {
    let (mut session, _engine, _editor) = ready_session("x = 1").await;

    let err = session.accept_suggestion("nope").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn removing_a_target_makes_it_eligible_again() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    engine.set_suggestions(json!({"pkg.mod": {"use": "call", "path": "/a"}}));
    session.refresh_suggestions().await.unwrap();
    session.accept_suggestion("pkg.mod").await.unwrap();

    session.remove_target("pkg.mod").await.unwrap();

    assert!(session.targets().is_empty());
    assert!(engine.remote_targets().is_empty());
    assert!(session.suggestions().contains_key("pkg.mod"));
}

#[tokio::test]
async fn removing_unknown_target_is_not_found() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    let before = engine.call_count();

    let err = session.remove_target("pkg.missing").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(engine.call_count(), before);
}

#[tokio::test]
async fn move_target_reorders_and_syncs() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    for name in ["a.one", "b.two", "c.three"] {
        session.add_target(Target::named(name)).await.unwrap();
    }

    session.move_target("c.three", 0).await.unwrap();
    assert_eq!(names(session.targets()), vec!["c.three", "a.one", "b.two"]);

    session.move_target("c.three", 99).await.unwrap();
    assert_eq!(names(session.targets()), vec!["a.one", "b.two", "c.three"]);
    assert_eq!(engine.remote_targets(), vec!["a.one", "b.two", "c.three"]);
}

#[tokio::test]
async fn selection_is_resolved_to_an_object_path() {
    let (mut session, engine, editor) = ready_session("import pkg\npkg.helper(1)").await;
    editor.set_selection(Some("pkg.helper"));
    engine.set_object_path(Some("pkg.helpers.helper"));

    let target = session.add_target_from_selection().await.unwrap();

    assert_eq!(target, Target::new("pkg.helpers.helper", "pkg.helper", ""));
    assert_eq!(engine.remote_targets(), vec!["pkg.helpers.helper"]);
    let resolve = engine
        .calls()
        .into_iter()
        .find(|c| c.contains("object_path"))
        .unwrap();
    assert!(resolve.contains("print(object_path(pkg.helper))"));
}

#[tokio::test]
async fn empty_selection_is_a_precondition_error() {
    let (mut session, engine, editor) = ready_session("x = 1").await;
    editor.set_selection(Some("   "));
    let before = engine.call_count();

    let err = session.add_target_from_selection().await.unwrap_err();

    assert!(err.is_precondition());
    assert_eq!(engine.call_count(), before);
}

#[tokio::test]
async fn unresolvable_selection_is_not_found() {
    let (mut session, engine, editor) = ready_session("x = 1").await;
    editor.set_selection(Some("x"));
    engine.set_object_path(None);

    let err = session.add_target_from_selection().await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert!(session.targets().is_empty());
}

#[tokio::test]
async fn target_sync_replaces_pending_cursor_target() {
    let (mut session, engine, _editor) = ready_session("import m\nm.f()").await;
    session.inline(CursorPosition::new(2, 0)).await.unwrap();
    assert_eq!(engine.remote_targets(), vec!["cursor:2, 0"]);

    session.add_target(Target::named("m.f")).await.unwrap();
    assert_eq!(engine.remote_targets(), vec!["m.f"]);

    session.remove_target("m.f").await.unwrap();
    let err = session.run_pass("inline", false).await.unwrap_err();
    assert!(err.is_precondition(), "cursor target was dropped by the sync");
}

#[tokio::test]
async fn suggestion_options_hide_configured_modules_and_sort_by_label() {
    let (mut session, engine, _editor) = ready_session("x = 1").await;
    engine.set_suggestions(json!({
        "zeta.run": {"use": "zeta.run()", "path": "/z"},
        "numpy.core.sum": {"use": "np.sum", "path": "/np"},
        "alpha.go": {"use": "alpha.go()", "path": "/a"}
    }));
    session.refresh_suggestions().await.unwrap();

    let labels: Vec<String> = session
        .suggestion_options()
        .into_iter()
        .map(|o| o.label)
        .collect();

    assert_eq!(labels, vec!["alpha.go (alpha.go())", "zeta.run (zeta.run())"]);
}

#[tokio::test]
async fn dev_mode_shows_every_suggestion() {
    let mut config = GlobalConfig::default();
    config.suggestions.dev_mode = true;
    let (mut session, engine, _editor) = new_session_with_config(&config);
    session.setup("x = 1").await.unwrap();
    engine.set_suggestions(json!({"numpy.core.sum": {"use": "np.sum", "path": "/np"}}));
    session.refresh_suggestions().await.unwrap();

    let options = session.suggestion_options();

    assert_eq!(options.len(), 1);
    assert_eq!(options[0].value, "numpy.core.sum");
}
