//! Persistence gateway abstraction.
//!
//! Every component that reads or writes flows goes through [`FlowGateway`];
//! nothing else issues store queries. Calls are asynchronous and may be slow,
//! so callers never hold editor state across them.

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{DeploymentRecord, Flow, FlowFilter, FlowPatch, FlowSummary, FlowVersion, NewFlow, Step},
    params::CreateFlow,
};

/// Durable storage for flows and their steps.
#[async_trait]
pub trait FlowGateway: Send + Sync {
    /// Reads a flow with its ordered steps.
    async fn get_flow(&self, flow_id: u64) -> Result<Option<Flow>>;

    /// Lists flows matching `filter`.
    async fn list_flows(&self, filter: FlowFilter) -> Result<Vec<FlowSummary>>;

    /// The currently stored ordered step list of a flow.
    async fn load_steps(&self, flow_id: u64) -> Result<Vec<Step>>;

    /// Atomically replaces the full step set of a draft flow.
    ///
    /// Returns the stored list in the submitted order, every step carrying a
    /// durable id. Fails without writing anything if the flow is not a draft.
    async fn replace_steps(&self, flow_id: u64, steps: Vec<Step>) -> Result<Vec<Step>>;

    /// Creates a new draft flow at version 1.
    async fn create_flow(&self, params: CreateFlow) -> Result<Flow>;

    /// Patches mutable attributes, leaving absent fields untouched.
    async fn update_flow(&self, flow_id: u64, patch: FlowPatch) -> Result<Flow>;

    /// Moves a flow to the terminal archived status.
    async fn archive_flow(&self, flow_id: u64) -> Result<Flow>;

    /// Version to assign to the next flow produced from `flow_id`.
    async fn next_version(&self, flow_id: u64) -> Result<FlowVersion>;

    /// Inserts a flow row with explicit status and version.
    async fn insert_flow(&self, new: NewFlow) -> Result<Flow>;

    /// Inserts fresh copies of `steps` under `flow_id` in one transaction.
    async fn copy_steps(&self, flow_id: u64, steps: Vec<Step>) -> Result<Vec<Step>>;

    /// Removes a flow and its steps.
    async fn delete_flow(&self, flow_id: u64) -> Result<()>;

    /// Stores a deployment audit event.
    async fn record_deployment(&self, record: DeploymentRecord) -> Result<()>;
}
