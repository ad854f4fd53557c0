//! Integration tests for EditingSession: history, persistence, drag-and-drop, frameworks.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;

use eaog_editor::application::{ApplicationError, Decision, DragPayload, EditingSession};
use eaog_editor::domain::{DomainError, EaogTree, Framework, NodeData, NodeKind, NodeType, Position};
use eaog_editor::infrastructure::{DocumentStore, MemoryDocumentStore};
use eaog_editor::util::testing::init_test_setup;

fn document() -> EaogTree {
    EaogTree::from_value(&json!({
        "type": "sand",
        "name": "root",
        "children": [
            {"type": "instruction", "name": "load"},
            {"type": "pand", "name": "fan", "children": [{"type": "instruction", "name": "work"}]},
            {"type": "end", "name": "done"}
        ]
    }))
    .unwrap()
}

fn session() -> (Arc<MemoryDocumentStore>, EditingSession) {
    init_test_setup();
    let store = Arc::new(MemoryDocumentStore::new());
    let session = EditingSession::with_tree(store.clone(), "flow".to_string(), document());
    (store, session)
}

fn root_names(session: &EditingSession) -> Vec<String> {
    let tree = session.tree();
    tree.children(tree.root())
        .iter()
        .map(|&c| tree.data(c).unwrap().name.clone())
        .collect()
}

fn rename(session: &mut EditingSession, path: &str, name: &str) {
    let id = session.resolve(path).unwrap();
    session.apply(|tree| tree.rename(id, name)).unwrap();
}

#[test]
fn given_edits_when_undoing_and_redoing_then_history_walks_snapshots() {
    let (_, mut session) = session();

    rename(&mut session, "root/load", "b");
    rename(&mut session, "root/b", "c");
    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
    assert_eq!(session.tree(), &document());

    assert!(session.redo());
    assert_eq!(root_names(&session)[0], "b");

    // a new edit abandons the redo branch
    rename(&mut session, "root/b", "d");
    assert!(!session.redo());
    assert_eq!(session.history().len(), 3);
    assert_eq!(root_names(&session)[0], "d");
}

#[test]
fn given_no_op_command_when_applying_then_nothing_recorded() {
    let (_, mut session) = session();

    rename(&mut session, "root/load", "load");

    assert_eq!(session.history().len(), 1);
    assert!(!session.history().can_undo());
}

#[test]
fn given_failing_command_when_applying_then_tree_is_restored() {
    let (_, mut session) = session();
    let load = session.resolve("root/load").unwrap();

    let result: Result<(), ApplicationError> = session.apply(|tree| {
        tree.remove(load, true)?;
        Err(DomainError::NodeNotFound)
    });

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NodeNotFound))
    ));
    assert_eq!(session.tree(), &document());
    assert_eq!(session.history().len(), 1);
}

#[test]
fn given_session_when_saving_then_store_holds_canonical_json() {
    let (store, mut session) = session();
    rename(&mut session, "root/done", "finish");

    session.save().unwrap();

    let blob = store.load("flow").unwrap();
    let reopened = EditingSession::open(store.clone(), "flow", false).unwrap();
    assert_eq!(reopened.tree(), session.tree());
    assert!(blob.contains("\"finish\""));
}

#[test]
fn given_unknown_id_when_opening_then_store_error() {
    init_test_setup();
    let store = Arc::new(MemoryDocumentStore::new());

    let result = EditingSession::open(store, "missing", true);

    assert!(matches!(result, Err(ApplicationError::Store { .. })));
}

#[test]
fn given_brief_blob_when_opening_with_brief_enabled_then_normalized() {
    init_test_setup();
    let store = Arc::new(MemoryDocumentStore::new());
    store
        .save("brief", r#"{"sand": "root", "children": ["a", "b"]}"#)
        .unwrap();

    let session = EditingSession::open(store.clone(), "brief", true).unwrap();

    assert_eq!(root_names(&session), vec!["a", "b"]);
    assert!(matches!(
        EditingSession::open(store, "brief", false),
        Err(ApplicationError::Validation(_))
    ));
}

#[test]
fn given_drag_payload_when_dropping_then_node_moves_and_is_marked() {
    let (_, mut session) = session();
    let payload = DragPayload {
        name: "load".to_string(),
        path: "root/load".to_string(),
    };
    let fan = session.resolve("root/fan").unwrap();

    session.drop_node(&payload, fan, Position::Child).unwrap();

    assert_eq!(root_names(&session), vec!["fan", "done"]);
    let moved = session.resolve("root/fan/load").unwrap();
    assert!(session.ui().is_newly_modified(moved));
    assert!(session.history().can_undo());
}

#[test]
fn given_stale_payload_when_dropping_then_path_not_found() {
    let (_, mut session) = session();
    let payload = DragPayload {
        name: "other".to_string(),
        path: "root/load".to_string(),
    };
    let done = session.resolve("root/done").unwrap();

    let err = session
        .drop_node(&payload, done, Position::After)
        .unwrap_err();

    assert!(matches!(err, ApplicationError::PathNotFound(p) if p == "root/load"));
}

#[test]
fn given_drop_on_own_descendant_when_dropping_then_rejected_and_unchanged() {
    let (_, mut session) = session();
    let payload = DragPayload {
        name: "fan".to_string(),
        path: "root/fan".to_string(),
    };
    let work = session.resolve("root/fan/work").unwrap();

    let err = session
        .drop_node(&payload, work, Position::Before)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::WouldCreateCycle(_))
    ));
    assert_eq!(session.tree(), &document());
}

#[test]
fn given_framework_when_applying_in_session_then_undo_restores_document() {
    let (_, mut session) = session();
    let framework = Framework::from_value(&json!({
        "type": "sand",
        "name": "guard ${step}",
        "meta": {"framework": true},
        "children": [
            {"type": "instruction", "name": "check ${step}"},
            {"type": "mount-point", "name": "step"}
        ]
    }))
    .unwrap();

    let root = session.apply_framework(&framework, "root/load").unwrap();

    assert_eq!(session.tree().path(root).as_deref(), Some("root/guard load"));
    assert!(session.resolve("root/guard load/load").is_ok());
    assert!(session.ui().is_newly_modified(root));

    assert!(session.undo());
    assert_eq!(session.tree(), &document());
}

#[test]
fn given_selection_when_node_removed_then_selection_pruned() {
    let (_, mut session) = session();
    let load = session.resolve("root/load").unwrap();
    let done = session.resolve("root/done").unwrap();
    session.ui_mut().select(load, false);
    session.ui_mut().select(done, true);

    session
        .apply(|tree| {
            let removed = tree.remove(load, true)?;
            tree.discard(removed)
        })
        .unwrap();

    assert_eq!(session.ui().selected(), &[done]);
}

#[test]
fn given_new_node_when_added_through_session_then_recorded() {
    let (_, mut session) = session();
    let done = session.resolve("root/done").unwrap();

    session
        .apply(|tree| {
            let node = tree.add_node(NodeData::new("save", NodeKind::bare(NodeType::Instruction)))?;
            tree.insert(done, node, Position::Before)
        })
        .unwrap();

    assert_eq!(root_names(&session), vec!["load", "fan", "save", "done"]);
    assert_eq!(session.history().cursor(), 1);
}

#[test]
fn given_many_add_remove_commands_when_applying_then_arena_does_not_grow() {
    let (_, mut session) = session();
    let done = session.resolve("root/done").unwrap();

    for i in 0..1000 {
        let node = session
            .apply(|tree| {
                let data = NodeData::new(format!("tmp{i}"), NodeKind::bare(NodeType::Instruction));
                let node = tree.add_node(data)?;
                tree.insert(done, node, Position::Before)?;
                Ok(node)
            })
            .unwrap();
        session.apply(|tree| tree.remove(node, true)).unwrap();
    }

    assert_eq!(session.tree(), &document());
    assert_eq!(session.tree().arena_len(), session.tree().len());
}

#[test]
fn given_replace_through_session_when_applied_then_old_node_freed() {
    let (_, mut session) = session();
    let load = session.resolve("root/load").unwrap();

    session
        .apply(|tree| {
            let node = tree.add_node(NodeData::new("fetch", NodeKind::bare(NodeType::Instruction)))?;
            tree.replace_with(load, node)
        })
        .unwrap();

    assert!(!session.tree().contains(load));
    assert_eq!(root_names(&session), vec!["fetch", "fan", "done"]);
    assert_eq!(session.tree().arena_len(), session.tree().len());
}

#[test]
fn given_confirmation_when_answered_from_other_thread_then_accepted() {
    let (_, session) = session();
    let session = session.with_confirm_timeout(Duration::from_secs(5));
    let (pending, responder) = session.request_confirmation();

    thread::spawn(move || responder.accept());

    assert_eq!(pending.wait(), Decision::Accepted);
}

#[test]
fn given_confirmation_when_unanswered_then_declined_after_timeout() {
    let (_, session) = session();
    let session = session.with_confirm_timeout(Duration::from_millis(20));
    let (pending, _responder) = session.request_confirmation();

    assert_eq!(pending.wait(), Decision::Declined);
}
