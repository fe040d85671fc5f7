mod common;

use std::{sync::Arc, time::Duration};

use common::{create_draft, create_test_store, settle, ScriptedGateway};
use flowsmith_core::{
    deploy::deploy, ConfigPath, EditorBuilder, ErrorKind, FlowEditor, FlowError, FlowGateway,
    FlowStatus, FlowVersion, StepId,
};
use serde_json::json;
use tokio::time;

fn types(editor: &FlowEditor) -> Vec<String> {
    editor.steps().into_iter().map(|s| s.step_type).collect()
}

fn path(raw: &str) -> ConfigPath {
    raw.parse().expect("Failed to parse config path")
}

async fn wait_until_saved(editor: &FlowEditor) {
    editor
        .subscribe()
        .wait_for(|status| !status.dirty && !status.is_saving)
        .await
        .expect("Editor closed");
}

/// Manual-save editor over a fresh draft.
async fn manual_editor() -> (tempfile::TempDir, Arc<ScriptedGateway>, FlowEditor, u64) {
    let (temp_dir, store) = create_test_store().await;
    let flow = create_draft(&store, "Signup").await;
    let gateway = ScriptedGateway::new(store);
    let editor = EditorBuilder::new(gateway.clone())
        .with_debounce(None)
        .open(flow.id)
        .await
        .expect("Failed to open editor");
    (temp_dir, gateway, editor, flow.id)
}

#[tokio::test]
async fn test_insert_and_move_with_undo() {
    let (_temp_dir, _gateway, editor, _) = manual_editor().await;

    let welcome = editor.insert_step("welcome", Some(0)).unwrap();
    let confirmation = editor.insert_step("confirmation", Some(1)).unwrap();

    let steps = editor.steps();
    assert_eq!(types(&editor), ["welcome", "confirmation"]);
    assert_eq!(steps[0].order, 0);
    assert_eq!(steps[1].order, 1);
    assert_eq!(steps[0].id, welcome);

    editor.move_step(confirmation, 0).unwrap();
    assert_eq!(types(&editor), ["confirmation", "welcome"]);
    assert_eq!(editor.steps()[1].order, 1);

    assert!(editor.undo());
    assert_eq!(types(&editor), ["welcome", "confirmation"]);
    assert!(editor.can_redo());
}

#[tokio::test]
async fn test_insert_uses_template_defaults() {
    let (_temp_dir, _gateway, editor, _) = manual_editor().await;

    let id = editor.insert_step("question", None).unwrap();

    let step = editor.step(id).expect("Inserted step should exist");
    assert_eq!(step.step_type, "question");
    assert!(step.id.is_local());
    assert!(step.config.as_value().is_object());
}

#[tokio::test]
async fn test_duplicate_is_independent_of_original() {
    let (_temp_dir, _gateway, editor, _) = manual_editor().await;
    let welcome = editor.insert_step("welcome", None).unwrap();

    editor
        .set_step_config(welcome, &path("questionScreen.question"), json!("hi?"))
        .unwrap();
    let clone = editor.duplicate_step(welcome).unwrap();

    let question = path("questionScreen.question");
    let cloned = editor.step(clone).unwrap();
    assert_eq!(cloned.config.get_path(&question), Some(&json!("hi?")));
    assert_eq!(cloned.order, 1);

    editor
        .set_step_config(welcome, &question, json!("changed"))
        .unwrap();
    let cloned = editor.step(clone).unwrap();
    assert_eq!(cloned.config.get_path(&question), Some(&json!("hi?")));
}

#[tokio::test]
async fn test_undo_redo_round_trip_and_branch_discard() {
    let (_temp_dir, _gateway, editor, _) = manual_editor().await;
    let initial = editor.steps();

    let a = editor.insert_step("welcome", None).unwrap();
    let b = editor.insert_step("info", None).unwrap();
    editor.move_step(b, 0).unwrap();
    editor.set_step_config(a, &path("title"), json!("Hi")).unwrap();
    editor.duplicate_step(b).unwrap();
    let final_steps = editor.steps();

    for _ in 0..5 {
        assert!(editor.undo());
    }
    assert_eq!(editor.steps(), initial);
    assert!(!editor.undo(), "undo past the oldest entry is a no-op");

    for _ in 0..5 {
        assert!(editor.redo());
    }
    assert_eq!(editor.steps(), final_steps);
    assert!(!editor.redo(), "redo past the newest entry is a no-op");

    editor.undo();
    editor.undo();
    editor.remove_step(a).unwrap();
    assert!(!editor.can_redo());
    assert!(!editor.redo());
}

#[tokio::test]
async fn test_edit_errors() {
    let (_temp_dir, gateway, editor, _) = manual_editor().await;

    assert!(matches!(
        editor.insert_step("carousel", None),
        Err(FlowError::TemplateNotFound { .. })
    ));
    assert!(matches!(
        editor.insert_step("welcome", Some(3)),
        Err(FlowError::InvalidInput { .. })
    ));
    assert!(matches!(
        editor.remove_step(StepId::Stored(77)),
        Err(FlowError::StepNotFound { .. })
    ));
    assert!(matches!(
        editor.set_step_config(StepId::local(), &path("title"), json!(1)),
        Err(FlowError::StepNotFound { .. })
    ));

    assert!(!editor.is_dirty());
    assert!(!editor.can_undo());
    assert_eq!(gateway.replace_calls(), 0);
}

#[tokio::test]
async fn test_editing_without_flow_is_rejected() {
    let (_temp_dir, store) = create_test_store().await;
    let editor = EditorBuilder::new(Arc::new(store))
        .with_debounce(None)
        .build()
        .unwrap();

    assert!(matches!(
        editor.insert_step("welcome", None),
        Err(FlowError::NoFlowSelected)
    ));
    assert!(matches!(editor.save().await, Err(FlowError::NoFlowSelected)));
    assert!(editor.steps().is_empty());
    assert!(!editor.undo());
}

#[tokio::test]
async fn test_active_flow_is_read_only() {
    let (_temp_dir, store) = create_test_store().await;
    let draft = create_draft(&store, "Signup").await;
    let active = deploy(&store, draft.id).await.unwrap().flow;
    let gateway = ScriptedGateway::new(store);

    let editor = EditorBuilder::new(gateway.clone())
        .with_debounce(None)
        .open(active.id)
        .await
        .unwrap();

    let result = editor.insert_step("welcome", None);
    assert!(matches!(
        result,
        Err(FlowError::Conflict {
            status: FlowStatus::Active,
            ..
        })
    ));
    assert!(!editor.is_dirty());
    assert_eq!(gateway.replace_calls(), 0);
}

#[tokio::test]
async fn test_save_assigns_stored_ids_without_duplicating_rows() {
    let (_temp_dir, gateway, editor, flow_id) = manual_editor().await;
    editor.insert_step("welcome", None).unwrap();
    editor.insert_step("question", None).unwrap();

    let report = editor.save().await.expect("Failed to save");
    assert_eq!(report.calls, 1);
    assert_eq!(report.step_count, 2);
    assert!(!editor.is_dirty());
    assert!(editor.steps().iter().all(|s| !s.id.is_local()));

    let first = editor.steps()[0].id;
    editor.set_step_config(first, &path("title"), json!("Hello")).unwrap();
    editor.save().await.unwrap();

    let stored = gateway.store().load_steps(flow_id).await.unwrap();
    assert_eq!(stored, editor.steps());
    assert_eq!(stored.len(), 2);

    // Undo back to a single step and save again; the stored row is reused
    editor.undo();
    editor.undo();
    editor.save().await.unwrap();
    let stored = gateway.store().load_steps(flow_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, first);
}

#[tokio::test]
async fn test_mutation_during_save_triggers_exactly_one_follow_up() {
    let (_temp_dir, gateway, editor, flow_id) = manual_editor().await;
    editor.insert_step("welcome", None).unwrap();

    gateway.hold_replace();
    let saver = tokio::spawn({
        let editor = editor.clone();
        async move { editor.save().await }
    });
    gateway.wait_for_replace_calls(1).await;
    assert!(editor.status().is_saving);

    // A burst of edits while the first call is outstanding
    let welcome = editor.steps()[0].id;
    editor.insert_step("question", None).unwrap();
    editor.insert_step("info", Some(0)).unwrap();
    editor
        .set_step_config(welcome, &path("title"), json!("Hi"))
        .unwrap();

    gateway.allow_replace(1);
    gateway.wait_for_replace_calls(2).await;
    let status = editor.status();
    assert!(status.dirty, "edits made mid-save are still unsaved");
    assert!(status.is_saving);

    gateway.release_replace();
    let report = saver.await.unwrap().expect("Save failed");

    assert_eq!(report.calls, 2);
    assert_eq!(gateway.replace_calls(), 2);
    assert!(!editor.is_dirty());

    let stored = gateway.store().load_steps(flow_id).await.unwrap();
    assert_eq!(stored, editor.steps());
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1].step_type, "welcome");
    assert_eq!(stored[1].config.get_path(&path("title")), Some(&json!("Hi")));
}

#[tokio::test]
async fn test_failed_save_keeps_dirty_and_reports() {
    let (_temp_dir, gateway, editor, flow_id) = manual_editor().await;
    editor.insert_step("welcome", None).unwrap();
    gateway.fail_replace(true);

    let result = editor.save().await;

    assert!(matches!(result, Err(FlowError::Task { .. })));
    let status = editor.status();
    assert!(status.dirty);
    assert!(!status.is_saving);
    let last_error = status.last_error.expect("Failure should be recorded");
    assert_eq!(last_error.kind, ErrorKind::Transient);
    assert_eq!(gateway.replace_calls(), 1);

    gateway.fail_replace(false);
    editor.save().await.expect("Retry should succeed");
    assert!(editor.status().last_error.is_none());
    assert_eq!(gateway.store().load_steps(flow_id).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_coalesces_a_burst_into_one_save() {
    let (_temp_dir, store) = create_test_store().await;
    let flow = create_draft(&store, "Signup").await;
    let gateway = ScriptedGateway::new(store);
    let editor = EditorBuilder::new(gateway.clone())
        .open(flow.id)
        .await
        .unwrap();

    editor.insert_step("welcome", None).unwrap();
    settle().await;
    time::advance(Duration::from_millis(1500)).await;
    settle().await;

    editor.insert_step("question", None).unwrap();
    editor.insert_step("confirmation", None).unwrap();
    settle().await;
    time::advance(Duration::from_millis(1500)).await;
    settle().await;

    // Each edit restarts the quiet period
    assert_eq!(gateway.replace_calls(), 0);
    assert!(editor.is_dirty());

    time::advance(Duration::from_millis(600)).await;
    gateway.wait_for_replace_calls(1).await;
    wait_until_saved(&editor).await;

    assert_eq!(gateway.replace_calls(), 1);
    assert_eq!(gateway.submissions()[0].len(), 3);
    assert_eq!(gateway.store().load_steps(flow.id).await.unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_manual_save_cancels_pending_debounce() {
    let (_temp_dir, store) = create_test_store().await;
    let flow = create_draft(&store, "Signup").await;
    let gateway = ScriptedGateway::new(store);
    let editor = EditorBuilder::new(gateway.clone())
        .with_debounce(Some(Duration::from_secs(5)))
        .open(flow.id)
        .await
        .unwrap();

    editor.insert_step("welcome", None).unwrap();
    settle().await;
    editor.save().await.unwrap();

    time::advance(Duration::from_secs(10)).await;
    settle().await;

    assert_eq!(gateway.replace_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_autosave_is_not_retried_until_next_edit() {
    let (_temp_dir, store) = create_test_store().await;
    let flow = create_draft(&store, "Signup").await;
    let gateway = ScriptedGateway::new(store);
    let editor = EditorBuilder::new(gateway.clone())
        .open(flow.id)
        .await
        .unwrap();
    gateway.fail_replace(true);

    editor.insert_step("welcome", None).unwrap();
    settle().await;
    gateway.wait_for_replace_calls(1).await;
    editor
        .subscribe()
        .wait_for(|status| status.last_error.is_some())
        .await
        .unwrap();

    time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(gateway.replace_calls(), 1);
    assert!(editor.is_dirty());

    gateway.fail_replace(false);
    editor.insert_step("info", None).unwrap();
    settle().await;
    gateway.wait_for_replace_calls(2).await;
    wait_until_saved(&editor).await;
    assert!(editor.status().last_error.is_none());
}

#[tokio::test]
async fn test_deploy_flushes_pending_edits_first() {
    let (_temp_dir, gateway, editor, flow_id) = manual_editor().await;
    editor.insert_step("welcome", None).unwrap();
    editor.insert_step("confirmation", None).unwrap();

    let deployment = editor.deploy().await.expect("Failed to deploy");

    assert_eq!(gateway.replace_calls(), 1);
    assert!(!editor.is_dirty());
    assert!(!editor.status().is_deploying);
    assert_eq!(deployment.source_flow_id, flow_id);
    assert_eq!(deployment.flow.version, FlowVersion(2));
    let deployed_types: Vec<_> = deployment
        .flow
        .steps
        .iter()
        .map(|s| s.step_type.as_str())
        .collect();
    assert_eq!(deployed_types, ["welcome", "confirmation"]);

    // The editor stays on the draft and keeps editing it
    assert_eq!(editor.flow_id(), Some(flow_id));
    editor.insert_step("info", None).unwrap();
}

#[tokio::test]
async fn test_failed_deploy_leaves_draft_and_reports() {
    let (_temp_dir, gateway, editor, flow_id) = manual_editor().await;
    editor.insert_step("welcome", None).unwrap();
    editor.insert_step("info", None).unwrap();
    gateway.fail_copy_after_first(true);

    let result = editor.deploy().await;

    assert!(result.is_err());
    let status = editor.status();
    assert!(!status.is_deploying);
    assert!(status.last_error.is_some());
    assert!(!status.dirty, "pending edits were saved before deploying");

    let flows = gateway
        .store()
        .list_flows(Default::default())
        .await
        .unwrap();
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].id, flow_id);
    assert_eq!(flows[0].status, FlowStatus::Draft);

    gateway.fail_copy_after_first(false);
    editor.deploy().await.expect("Failed to redeploy");
    assert!(editor.status().last_error.is_none());
}

#[tokio::test]
async fn test_switch_flow_flushes_and_resets_history() {
    let (_temp_dir, gateway, editor, first_id) = manual_editor().await;
    let second = create_draft(gateway.store(), "Checkout").await;
    editor.insert_step("welcome", None).unwrap();

    editor.switch_flow(second.id).await.expect("Failed to switch");

    assert_eq!(editor.flow_id(), Some(second.id));
    assert!(editor.steps().is_empty());
    assert!(!editor.can_undo());
    assert!(!editor.is_dirty());
    assert_eq!(
        gateway.store().load_steps(first_id).await.unwrap().len(),
        1
    );

    assert!(matches!(
        editor.switch_flow(4242).await,
        Err(FlowError::FlowNotFound { id: 4242 })
    ));
    assert_eq!(editor.flow_id(), Some(second.id));
}

#[tokio::test]
async fn test_switch_flow_stays_put_when_flush_fails() {
    let (_temp_dir, gateway, editor, first_id) = manual_editor().await;
    let second = create_draft(gateway.store(), "Checkout").await;
    editor.insert_step("welcome", None).unwrap();
    gateway.fail_replace(true);

    assert!(editor.switch_flow(second.id).await.is_err());

    assert_eq!(editor.flow_id(), Some(first_id));
    assert!(editor.is_dirty());
    assert_eq!(editor.steps().len(), 1);
}

#[tokio::test]
async fn test_switch_flow_leaves_flow_archived_elsewhere() {
    let (_temp_dir, gateway, editor, first_id) = manual_editor().await;
    let second = create_draft(gateway.store(), "Checkout").await;
    editor.insert_step("welcome", None).unwrap();
    gateway.store().archive_flow(first_id).await.unwrap();

    editor
        .switch_flow(second.id)
        .await
        .expect("Failed to switch away from archived flow");

    assert_eq!(editor.flow_id(), Some(second.id));
    assert!(!editor.is_dirty());
    assert!(editor.steps().is_empty());
    assert!(editor.status().last_error.is_none());
    assert!(gateway.store().load_steps(first_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_subscription_sees_save_cycle() {
    let (_temp_dir, gateway, editor, _) = manual_editor().await;
    let mut status = editor.subscribe();

    editor.insert_step("welcome", None).unwrap();
    status.changed().await.unwrap();
    assert!(status.borrow_and_update().dirty);

    gateway.hold_replace();
    let saver = tokio::spawn({
        let editor = editor.clone();
        async move { editor.save().await }
    });
    status.wait_for(|s| s.is_saving).await.unwrap();
    gateway.release_replace();
    saver.await.unwrap().unwrap();

    let current = status.borrow_and_update().clone();
    assert!(!current.dirty);
    assert!(!current.is_saving);
    assert!(!current.can_redo);
    assert!(current.can_undo);
}
