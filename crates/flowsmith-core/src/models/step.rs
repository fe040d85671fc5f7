//! Step model definition and related functionality.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StepConfig;

/// Identity of a step.
///
/// Steps read from the store carry their durable row id. Steps created or
/// duplicated in an editing session get a random local id until the next save
/// assigns them a durable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    /// Durable row id
    Stored(u64),
    /// Client-only id, not yet persisted
    Local(Uuid),
}

impl StepId {
    /// Generates a fresh client-only id.
    pub fn local() -> Self {
        StepId::Local(Uuid::new_v4())
    }

    /// The durable row id, if this step has been persisted.
    pub fn stored(&self) -> Option<u64> {
        match self {
            StepId::Stored(id) => Some(*id),
            StepId::Local(_) => None,
        }
    }

    /// True if the id was generated client-side.
    pub fn is_local(&self) -> bool {
        matches!(self, StepId::Local(_))
    }
}

impl From<u64> for StepId {
    fn from(id: u64) -> Self {
        StepId::Stored(id)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepId::Stored(id) => write!(f, "{id}"),
            StepId::Local(uuid) => write!(f, "local-{uuid}"),
        }
    }
}

impl FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(raw) = s.strip_prefix("local-") {
            return Uuid::parse_str(raw)
                .map(StepId::Local)
                .map_err(|e| format!("Invalid local step id '{s}': {e}"));
        }
        s.parse::<u64>()
            .map(StepId::Stored)
            .map_err(|_| format!("Invalid step id: {s}"))
    }
}

/// Represents one configurable unit within a flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// Stable identity of the step
    pub id: StepId,

    /// Template identifier selecting the screen type
    #[serde(rename = "type")]
    pub step_type: String,

    /// Position of the step within the flow (0-indexed, dense)
    pub order: u32,

    /// Template-defined configuration payload
    #[serde(default)]
    pub config: StepConfig,
}

impl Step {
    /// Creates an unsaved step of the given type.
    pub fn new(step_type: impl Into<String>, config: StepConfig) -> Self {
        Self {
            id: StepId::local(),
            step_type: step_type.into(),
            order: 0,
            config,
        }
    }
}
