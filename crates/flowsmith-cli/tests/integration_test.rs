//! Integration tests comparing CLI output with the core Display
//! implementations it is built from.

use std::process::Command;

use flowsmith_core::{
    deploy::deploy, CreateResult, FlowGateway, FlowStore, Step, StepConfig, StoreBuilder,
};
use serde_json::json;
use tempfile::TempDir;

/// Helper function to create a test store with a temporary database
async fn create_test_store() -> (FlowStore, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let db_path = temp_dir.path().join("test.db");

    let store = StoreBuilder::new()
        .with_database_path(Some(db_path))
        .build()
        .await
        .expect("Failed to create store");

    (store, temp_dir)
}

/// Run a CLI command and capture its output
fn run_cli_command(db_path: &str, args: &[&str]) -> String {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flowsmith"));
    cmd.arg("--no-color").arg("--database-file").arg(db_path);

    for arg in args {
        cmd.arg(arg);
    }

    let output = cmd.output().expect("Failed to run CLI command");
    String::from_utf8(output.stdout).expect("Invalid UTF-8 in CLI output")
}

#[tokio::test]
async fn test_show_matches_flow_display() {
    let (store, temp_dir) = create_test_store().await;
    let db_path = temp_dir.path().join("test.db");
    let db_str = db_path.to_str().unwrap();

    run_cli_command(db_str, &["flow", "create", "Signup", "-d", "First run"]);
    run_cli_command(db_str, &["step", "insert", "1", "welcome"]);
    run_cli_command(db_str, &["step", "insert", "1", "question"]);

    let flow = store
        .get_flow(1)
        .await
        .expect("Failed to get flow")
        .expect("Flow should exist");
    assert_eq!(flow.steps.len(), 2);

    let cli_output = run_cli_command(db_str, &["flow", "show", "1"]);
    assert_eq!(cli_output, flow.to_string());
}

#[tokio::test]
async fn test_cli_reads_flows_written_by_the_library() {
    let (store, temp_dir) = create_test_store().await;
    let db_path = temp_dir.path().join("test.db");
    let db_str = db_path.to_str().unwrap();

    let flow = store
        .create_flow(flowsmith_core::params::CreateFlow {
            name: "Checkout".to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create flow");
    store
        .replace_steps(
            flow.id,
            vec![Step::new("info", StepConfig::from(json!({"body": "Almost done"})))],
        )
        .await
        .expect("Failed to save steps");
    let deployment = deploy(&store, flow.id).await.expect("Failed to deploy");

    let show_output = run_cli_command(db_str, &["flow", "show", &deployment.flow.id.to_string()]);
    assert_eq!(show_output, deployment.flow.to_string());
    assert!(show_output.contains("Almost done"));

    let history_output = run_cli_command(db_str, &["flow", "history", &flow.id.to_string()]);
    assert!(history_output.contains(&format!("- v2 as flow {}", deployment.flow.id)));
}

#[tokio::test]
async fn test_branch_output_matches_create_result() {
    let (store, temp_dir) = create_test_store().await;
    let db_path = temp_dir.path().join("test.db");
    let db_str = db_path.to_str().unwrap();

    run_cli_command(db_str, &["flow", "create", "Signup"]);
    run_cli_command(db_str, &["flow", "deploy", "1"]);
    let cli_output = run_cli_command(db_str, &["flow", "branch", "2"]);

    let branched = store
        .get_flow(3)
        .await
        .expect("Failed to get flow")
        .expect("Branch should exist");
    assert_eq!(cli_output, CreateResult::new(branched).to_string());
}
