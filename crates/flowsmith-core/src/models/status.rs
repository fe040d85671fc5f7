//! Lifecycle status of a flow.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of flow statuses.
///
/// `Draft --deploy--> Active` produces a new flow; the draft itself never
/// changes status through deployment. `Archived` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    /// Steps are still editable
    #[default]
    Draft,

    /// Live, frozen version
    Active,

    /// Retired from use
    Archived,
}

impl FromStr for FlowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(FlowStatus::Draft),
            "active" => Ok(FlowStatus::Active),
            "archived" => Ok(FlowStatus::Archived),
            _ => Err(format!("Invalid flow status: {s}")),
        }
    }
}

impl FlowStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Draft => "draft",
            FlowStatus::Active => "active",
            FlowStatus::Archived => "archived",
        }
    }

    /// Whether steps of a flow in this status may be changed.
    pub fn is_editable(&self) -> bool {
        matches!(self, FlowStatus::Draft)
    }

    /// Get status with an icon for list display.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flowsmith_core::models::FlowStatus;
    ///
    /// assert_eq!(FlowStatus::Draft.with_icon(), "✎ Draft");
    /// assert_eq!(FlowStatus::Active.with_icon(), "● Active");
    /// assert_eq!(FlowStatus::Archived.with_icon(), "▪ Archived");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            FlowStatus::Draft => "✎ Draft",
            FlowStatus::Active => "● Active",
            FlowStatus::Archived => "▪ Archived",
        }
    }
}
