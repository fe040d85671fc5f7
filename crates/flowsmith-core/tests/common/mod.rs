#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use flowsmith_core::{
    models::NewFlow, params::CreateFlow, DeploymentRecord, Flow, FlowError, FlowFilter,
    FlowGateway, FlowPatch, FlowStatus, FlowStore, FlowSummary, FlowVersion, Result, Step,
    StoreBuilder,
};
use tempfile::TempDir;
use tokio::sync::{watch, Semaphore};

/// Helper function to create a store on a fresh temporary database
pub async fn create_test_store() -> (TempDir, FlowStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let store = StoreBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create store");
    (temp_dir, store)
}

/// Creates a draft flow with default attributes.
pub async fn create_draft(store: &FlowStore, name: &str) -> Flow {
    store
        .create_flow(CreateFlow {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create flow")
}

/// Inserts a draft at an explicit version, bypassing `create_flow`.
pub async fn create_draft_at_version(store: &FlowStore, name: &str, version: u32) -> Flow {
    store
        .insert_flow(NewFlow {
            name: name.to_string(),
            description: Some("Versioned draft".to_string()),
            status: FlowStatus::Draft,
            version: FlowVersion(version),
            traffic_percentage: 60,
            parent_id: None,
        })
        .await
        .expect("Failed to insert flow")
}

/// Yields enough times for the autosave worker to drain queued commands.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Gateway wrapper around a real store that records `replace_steps` calls and
/// can hold or fail specific operations.
pub struct ScriptedGateway {
    inner: FlowStore,
    replace_calls: watch::Sender<usize>,
    submissions: Mutex<Vec<Vec<Step>>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    fail_replace: AtomicBool,
    fail_copy_after_first: AtomicBool,
    fail_audit: AtomicBool,
}

impl ScriptedGateway {
    pub fn new(inner: FlowStore) -> Arc<Self> {
        let (replace_calls, _) = watch::channel(0);
        Arc::new(Self {
            inner,
            replace_calls,
            submissions: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            fail_replace: AtomicBool::new(false),
            fail_copy_after_first: AtomicBool::new(false),
            fail_audit: AtomicBool::new(false),
        })
    }

    pub fn store(&self) -> &FlowStore {
        &self.inner
    }

    /// Number of `replace_steps` calls that have started.
    pub fn replace_calls(&self) -> usize {
        *self.replace_calls.borrow()
    }

    /// Step lists submitted to `replace_steps`, in call order.
    pub fn submissions(&self) -> Vec<Vec<Step>> {
        self.submissions.lock().expect("Failed to lock").clone()
    }

    /// Waits until at least `count` replace calls have started.
    pub async fn wait_for_replace_calls(&self, count: usize) {
        let mut calls = self.replace_calls.subscribe();
        calls
            .wait_for(|started| *started >= count)
            .await
            .expect("Failed to observe replace calls");
    }

    /// Makes subsequent `replace_steps` calls wait for `release`.
    pub fn hold_replace(&self) {
        *self.gate.lock().expect("Failed to lock") = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets the next `calls` held `replace_steps` calls through.
    pub fn allow_replace(&self, calls: usize) {
        if let Some(gate) = self.gate.lock().expect("Failed to lock").as_ref() {
            gate.add_permits(calls);
        }
    }

    /// Lets held and future `replace_steps` calls through.
    pub fn release_replace(&self) {
        if let Some(gate) = self.gate.lock().expect("Failed to lock").take() {
            gate.add_permits(1024);
        }
    }

    pub fn fail_replace(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }

    /// Makes `copy_steps` write the first step and then fail.
    pub fn fail_copy_after_first(&self, fail: bool) {
        self.fail_copy_after_first.store(fail, Ordering::SeqCst);
    }

    pub fn fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    fn injected(operation: &str) -> FlowError {
        FlowError::Task {
            message: format!("Injected {operation} failure"),
        }
    }
}

#[async_trait]
impl FlowGateway for ScriptedGateway {
    async fn get_flow(&self, flow_id: u64) -> Result<Option<Flow>> {
        self.inner.get_flow(flow_id).await
    }

    async fn list_flows(&self, filter: FlowFilter) -> Result<Vec<FlowSummary>> {
        self.inner.list_flows(filter).await
    }

    async fn load_steps(&self, flow_id: u64) -> Result<Vec<Step>> {
        self.inner.load_steps(flow_id).await
    }

    async fn replace_steps(&self, flow_id: u64, steps: Vec<Step>) -> Result<Vec<Step>> {
        self.submissions
            .lock()
            .expect("Failed to lock")
            .push(steps.clone());
        self.replace_calls.send_modify(|started| *started += 1);

        let gate = self.gate.lock().expect("Failed to lock").clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("Gate closed").forget();
        }

        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(Self::injected("replace"));
        }
        self.inner.replace_steps(flow_id, steps).await
    }

    async fn create_flow(&self, params: CreateFlow) -> Result<Flow> {
        self.inner.create_flow(params).await
    }

    async fn update_flow(&self, flow_id: u64, patch: FlowPatch) -> Result<Flow> {
        self.inner.update_flow(flow_id, patch).await
    }

    async fn archive_flow(&self, flow_id: u64) -> Result<Flow> {
        self.inner.archive_flow(flow_id).await
    }

    async fn next_version(&self, flow_id: u64) -> Result<FlowVersion> {
        self.inner.next_version(flow_id).await
    }

    async fn insert_flow(&self, new: NewFlow) -> Result<Flow> {
        self.inner.insert_flow(new).await
    }

    async fn copy_steps(&self, flow_id: u64, steps: Vec<Step>) -> Result<Vec<Step>> {
        if self.fail_copy_after_first.load(Ordering::SeqCst) {
            let first = steps.into_iter().take(1).collect();
            self.inner.copy_steps(flow_id, first).await?;
            return Err(Self::injected("copy"));
        }
        self.inner.copy_steps(flow_id, steps).await
    }

    async fn delete_flow(&self, flow_id: u64) -> Result<()> {
        self.inner.delete_flow(flow_id).await
    }

    async fn record_deployment(&self, record: DeploymentRecord) -> Result<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(Self::injected("audit"));
        }
        self.inner.record_deployment(record).await
    }
}
