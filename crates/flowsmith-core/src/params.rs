//! Parameter structures for flow operations
//!
//! These structures carry requests from the interface layers (the CLI today)
//! into the core without framework-specific derives. Interface crates define
//! their own argument types and convert into these with `From`:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │    │  Store / Editor │
//! │  (clap derives) │───▶│ (serde only)    │───▶│                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::models::FlowStatus;

/// Generic parameters for operations requiring just an ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    /// The ID of the resource to operate on
    pub id: u64,
}

/// Parameters for creating a new draft flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFlow {
    /// Name of the flow (required)
    pub name: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Share of traffic for the flow once deployed, defaults to 100
    pub traffic_percentage: Option<u8>,
}

/// Parameters for patching a flow's mutable attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFlow {
    /// ID of the flow to update
    pub id: u64,
    /// New name
    pub name: Option<String>,
    /// New description, an empty string removes it
    pub description: Option<String>,
    /// New traffic share
    pub traffic_percentage: Option<u8>,
}

/// Parameters for listing flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFlows {
    /// Only flows with this status
    pub status: Option<FlowStatus>,
    /// Case-insensitive name fragment
    pub name: Option<String>,
    /// Include archived flows
    #[serde(default)]
    pub archived: bool,
}
