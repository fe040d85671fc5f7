//! Deployment audit records.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Flow, FlowVersion};

/// Audit entry written after a successful deploy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentRecord {
    /// The newly created active flow
    pub flow_id: u64,
    /// The draft it was deployed from
    pub source_flow_id: u64,
    pub version: FlowVersion,
    pub step_count: u32,
    pub created_at: Timestamp,
}

/// Outcome of a deploy: the new active flow with its copied steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub flow: Flow,
    pub source_flow_id: u64,
}

impl Deployment {
    /// Number of steps carried into the new version.
    pub fn step_count(&self) -> usize {
        self.flow.steps.len()
    }
}
