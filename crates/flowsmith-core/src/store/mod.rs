//! SQLite-backed persistence gateway.
//!
//! [`FlowStore`] is the production [`FlowGateway`](crate::gateway::FlowGateway).
//! It keeps only the database path; each call opens a connection inside
//! `tokio::task::spawn_blocking`, so the async side never blocks on SQLite.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Editor/Deploy  │    │    FlowStore    │    │    Database     │
//! │ (FlowGateway)   │───▶│ (spawn_blocking)│───▶│   (via db/)     │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use flowsmith_core::{params::CreateFlow, FlowGateway, StoreBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StoreBuilder::new()
//!     .with_database_path(Some("flows.db"))
//!     .build()
//!     .await?;
//!
//! let flow = store
//!     .create_flow(CreateFlow {
//!         name: "Signup".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! assert_eq!(flow.version.to_string(), "1");
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::task;

pub mod builder;

pub use builder::StoreBuilder;

use crate::{
    db::Database,
    error::{FlowError, Result},
    gateway::FlowGateway,
    models::{
        DeploymentRecord, Flow, FlowFilter, FlowPatch, FlowSummary, FlowVersion, NewFlow, Step,
    },
    params::CreateFlow,
};

/// Flow persistence on a SQLite database file.
#[derive(Debug, Clone)]
pub struct FlowStore {
    pub(crate) db_path: PathBuf,
}

impl FlowStore {
    /// Creates a store over an initialized database path.
    pub(crate) fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Path of the backing database file.
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Runs `op` on a fresh connection on the blocking pool.
    async fn with_db<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            op(&mut db)
        })
        .await
        .map_err(FlowError::join)?
    }

    /// Deployment audit rows recorded for a source draft.
    pub async fn deployments(&self, source_flow_id: u64) -> Result<Vec<DeploymentRecord>> {
        self.with_db(move |db| db.list_deployments(source_flow_id))
            .await
    }
}

#[async_trait]
impl FlowGateway for FlowStore {
    async fn get_flow(&self, flow_id: u64) -> Result<Option<Flow>> {
        self.with_db(move |db| db.get_flow(flow_id)).await
    }

    async fn list_flows(&self, filter: FlowFilter) -> Result<Vec<FlowSummary>> {
        self.with_db(move |db| db.list_flows(Some(&filter))).await
    }

    async fn load_steps(&self, flow_id: u64) -> Result<Vec<Step>> {
        self.with_db(move |db| db.get_steps(flow_id)).await
    }

    async fn replace_steps(&self, flow_id: u64, steps: Vec<Step>) -> Result<Vec<Step>> {
        log::debug!("replace_steps: flow {flow_id}, {} steps", steps.len());
        self.with_db(move |db| db.replace_steps(flow_id, &steps))
            .await
    }

    async fn create_flow(&self, params: CreateFlow) -> Result<Flow> {
        log::debug!("create_flow: {:?}", params);
        self.with_db(move |db| {
            db.create_flow(
                &params.name,
                params.description.as_deref(),
                params.traffic_percentage,
            )
        })
        .await
    }

    async fn update_flow(&self, flow_id: u64, patch: FlowPatch) -> Result<Flow> {
        log::debug!("update_flow: flow {flow_id}, {:?}", patch);
        self.with_db(move |db| db.update_flow(flow_id, &patch))
            .await
    }

    async fn archive_flow(&self, flow_id: u64) -> Result<Flow> {
        self.with_db(move |db| db.archive_flow(flow_id)).await
    }

    async fn next_version(&self, flow_id: u64) -> Result<FlowVersion> {
        self.with_db(move |db| db.next_version(flow_id)).await
    }

    async fn insert_flow(&self, new: NewFlow) -> Result<Flow> {
        self.with_db(move |db| db.insert_flow(&new)).await
    }

    async fn copy_steps(&self, flow_id: u64, steps: Vec<Step>) -> Result<Vec<Step>> {
        self.with_db(move |db| db.copy_steps(flow_id, &steps)).await
    }

    async fn delete_flow(&self, flow_id: u64) -> Result<()> {
        self.with_db(move |db| db.delete_flow(flow_id)).await
    }

    async fn record_deployment(&self, record: DeploymentRecord) -> Result<()> {
        self.with_db(move |db| db.record_deployment(&record)).await
    }
}
