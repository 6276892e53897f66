//! Integration tests for the session registry.

use std::sync::Arc;

use inliner_session::bridge::CommandBridge;
use inliner_session::config::GlobalConfig;
use inliner_session::registry::SessionRegistry;
use inliner_session::session::busy::BusyIndicator;
use inliner_session::session::{SessionState, TransformSession};
use inliner_session::AppError;
use serde_json::json;

use super::test_helpers::{FakeEngine, Op, RecordingEditor};

fn registry() -> (SessionRegistry, Arc<FakeEngine>) {
    let engine = FakeEngine::new();
    let registry = SessionRegistry::new(engine.clone(), Arc::new(GlobalConfig::default()));
    (registry, engine)
}

#[tokio::test]
async fn current_is_absent_until_a_session_is_created() {
    let (mut registry, _engine) = registry();
    assert!(registry.current_session().is_none());

    registry.set_current("cell-9");
    assert_eq!(registry.current_id(), Some("cell-9"));
    assert!(registry.current_session().is_none());

    registry.create_session("cell-9", RecordingEditor::new()).unwrap();
    assert_eq!(registry.current_session().unwrap().id(), "cell-9");

    registry.clear_current();
    assert!(registry.current_session_mut().is_none());
}

#[tokio::test]
async fn each_session_drives_its_own_remote_object() {
    let (mut registry, _engine) = registry();
    registry.create_session("a", RecordingEditor::new()).unwrap();
    registry.create_session("b", RecordingEditor::new()).unwrap();

    let a = registry.session("a").unwrap().bridge().object_name().to_owned();
    let b = registry.session("b").unwrap().bridge().object_name().to_owned();

    assert_ne!(a, b);
    for name in [&a, &b] {
        assert!(name.starts_with("inliner_"), "{name}");
        assert_eq!(name.len(), "inliner_".len() + 8);
    }
    assert_eq!(registry.session_ids(), vec!["a", "b"]);
    assert_eq!(registry.current_id(), Some("b"));
}

#[tokio::test]
async fn add_session_replaces_existing_entry() {
    let (mut registry, engine) = registry();
    registry.create_session("cell-1", RecordingEditor::new()).unwrap();

    let bridge = CommandBridge::new("replacement", engine.clone()).unwrap();
    let session = TransformSession::new(
        "cell-1",
        bridge,
        RecordingEditor::new(),
        BusyIndicator::new(),
        registry.config(),
    );
    let previous = registry.add_session(session);

    assert!(previous.is_some());
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.session("cell-1").unwrap().bridge().object_name(),
        "replacement"
    );
}

#[tokio::test]
async fn open_session_sets_up_and_loads_suggestions() {
    let (mut registry, engine) = registry();
    engine.set_suggestions(json!({"m.f": {"use": "m.f()", "path": "/m.py"}}));
    let editor = RecordingEditor::new();

    registry
        .open_session("cell-1", editor.clone(), "import m\nm.f()")
        .await
        .unwrap();

    let session = registry.current_session().unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.suggestions().contains_key("m.f"));
    assert_eq!(editor.texts(), vec!["import m\nm.f()"]);
}

#[tokio::test]
async fn failed_setup_discards_the_session() {
    let (mut registry, engine) = registry();
    engine.fail(Op::Setup);

    let err = registry
        .open_session("cell-1", RecordingEditor::new(), "import m")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Remote { .. }));
    assert!(registry.is_empty());
    assert!(registry.current_session().is_none());
}

#[tokio::test]
async fn failed_refresh_keeps_the_session() {
    let (mut registry, engine) = registry();
    engine.fail(Op::Suggestions);

    let err = registry
        .open_session("cell-1", RecordingEditor::new(), "import m")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Remote { ref operation, .. } if operation == "target_suggestions"));
    assert_eq!(
        registry.session("cell-1").unwrap().state(),
        SessionState::Ready
    );
}

#[tokio::test]
async fn sessions_share_one_busy_indicator() {
    let (mut registry, _engine) = registry();
    registry
        .open_session("a", RecordingEditor::new(), "x = 1")
        .await
        .unwrap();
    registry
        .open_session("b", RecordingEditor::new(), "y = 2")
        .await
        .unwrap();
    assert!(!registry.busy().is_busy());

    let outer = registry.busy().acquire();
    let mut rx = registry.busy().subscribe();
    registry
        .session_mut("a")
        .unwrap()
        .run_pass("dead_code", true)
        .await
        .unwrap();
    registry
        .session_mut("b")
        .unwrap()
        .refresh_suggestions()
        .await
        .unwrap();

    assert!(registry.busy().is_busy());
    assert!(!rx.has_changed().unwrap(), "nested operations must not toggle");

    drop(outer);
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), 0);
    assert_eq!(registry.busy().depth(), 0);
}

#[tokio::test]
async fn remove_session_drops_only_that_entry() {
    let (mut registry, _engine) = registry();
    registry.create_session("a", RecordingEditor::new()).unwrap();
    registry.create_session("b", RecordingEditor::new()).unwrap();

    assert!(registry.remove_session("a").is_some());
    assert!(registry.remove_session("a").is_none());
    assert_eq!(registry.session_ids(), vec!["b"]);
}

#[tokio::test]
async fn failed_reopen_keeps_the_live_session() {
    let (mut registry, engine) = registry();
    registry
        .open_session("cell-1", RecordingEditor::new(), "import m\nm.f()")
        .await
        .unwrap();
    engine.script_pass("dead_code", &[true]);
    registry
        .session_mut("cell-1")
        .unwrap()
        .run_pass("dead_code", true)
        .await
        .unwrap();
    registry.create_session("cell-2", RecordingEditor::new()).unwrap();
    registry.set_current("cell-1");
    let object = registry
        .session("cell-1")
        .unwrap()
        .bridge()
        .object_name()
        .to_owned();
    engine.fail(Op::Setup);

    let err = registry
        .open_session("cell-1", RecordingEditor::new(), "y = 2")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Remote { ref operation, .. } if operation == "setup"));
    assert_eq!(registry.current_id(), Some("cell-1"));
    let session = registry.current_session().unwrap();
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.bridge().object_name(), object);
    assert_eq!(registry.session_ids(), vec!["cell-1", "cell-2"]);
}

#[tokio::test]
async fn failed_open_leaves_current_untouched() {
    let (mut registry, engine) = registry();
    registry.create_session("cell-1", RecordingEditor::new()).unwrap();
    engine.fail(Op::Setup);

    registry
        .open_session("cell-2", RecordingEditor::new(), "x = 1")
        .await
        .unwrap_err();

    assert_eq!(registry.current_id(), Some("cell-1"));
    assert!(registry.session("cell-2").is_none());
}
