//! Request types for creating and updating flows.

use super::{FlowStatus, FlowVersion};
use crate::error::{FlowError, Result};

/// Highest accepted traffic share.
pub const MAX_TRAFFIC_PERCENTAGE: u8 = 100;

/// Partial update of a flow's mutable attributes. `None` leaves a field as-is;
/// a blank `description` clears the stored one.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlowPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub traffic_percentage: Option<u8>,
}

impl FlowPatch {
    /// True if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.traffic_percentage.is_none()
    }

    /// Checks field-level constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(traffic) = self.traffic_percentage {
            validate_traffic(traffic)?;
        }
        Ok(())
    }
}

impl TryFrom<crate::params::UpdateFlow> for FlowPatch {
    type Error = FlowError;

    fn try_from(params: crate::params::UpdateFlow) -> Result<Self> {
        let patch = FlowPatch {
            name: params.name,
            description: params.description,
            traffic_percentage: params.traffic_percentage,
        };
        patch.validate()?;
        Ok(patch)
    }
}

/// Row to insert when a flow version is created by deploy or branch.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlow {
    pub name: String,
    pub description: Option<String>,
    pub status: FlowStatus,
    pub version: FlowVersion,
    pub traffic_percentage: u8,
    pub parent_id: Option<u64>,
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(FlowError::invalid_input("name").with_reason("Flow name cannot be empty"));
    }
    Ok(())
}

pub(crate) fn validate_traffic(traffic: u8) -> Result<()> {
    if traffic > MAX_TRAFFIC_PERCENTAGE {
        return Err(FlowError::invalid_input("traffic_percentage").with_reason(format!(
            "Traffic percentage {traffic} must be between 0 and {MAX_TRAFFIC_PERCENTAGE}"
        )));
    }
    Ok(())
}
