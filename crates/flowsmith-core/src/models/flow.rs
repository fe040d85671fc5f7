//! Flow model definition and related functionality.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{FlowStatus, Step};

/// Monotonic version number of a flow, persisted as an integer string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FlowVersion(pub u32);

impl FlowVersion {
    /// The version every newly created flow starts at.
    pub const INITIAL: FlowVersion = FlowVersion(1);

    /// The version following this one.
    pub fn next(self) -> Self {
        FlowVersion(self.0 + 1)
    }
}

impl fmt::Display for FlowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FlowVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(FlowVersion)
            .map_err(|_| format!("Invalid flow version: {s}"))
    }
}

impl From<FlowVersion> for String {
    fn from(version: FlowVersion) -> Self {
        version.to_string()
    }
}

impl TryFrom<String> for FlowVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents a named, versioned sequence of steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flow {
    /// Unique identifier for the flow
    pub id: u64,

    /// Human readable name
    pub name: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: FlowStatus,

    /// Version number
    pub version: FlowVersion,

    /// Share of traffic routed to this flow (0-100)
    pub traffic_percentage: u8,

    /// Draft this flow was deployed or branched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,

    /// Timestamp when the flow was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the flow was last modified (UTC)
    pub updated_at: Timestamp,

    /// Ordered steps (loaded on demand)
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Flow listing entry with a step count instead of the steps themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowSummary {
    pub id: u64,
    pub name: String,
    pub status: FlowStatus,
    pub version: FlowVersion,
    pub traffic_percentage: u8,
    pub parent_id: Option<u64>,
    pub updated_at: Timestamp,
    pub step_count: u32,
}
