//! Filter types for querying flows.

use super::FlowStatus;

/// Filter options for listing flows.
#[derive(Debug, Clone, Default)]
pub struct FlowFilter {
    /// Filter by flow name (case-insensitive partial match)
    pub name_contains: Option<String>,

    /// Only flows in this status
    pub status: Option<FlowStatus>,

    /// Include archived flows when no explicit status is given
    pub include_archived: bool,
}

impl From<&crate::params::ListFlows> for FlowFilter {
    /// Convert listing parameters into a query filter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flowsmith_core::{models::{FlowFilter, FlowStatus}, params::ListFlows};
    ///
    /// let params = ListFlows { status: Some(FlowStatus::Active), ..Default::default() };
    /// let filter: FlowFilter = (&params).into();
    /// assert_eq!(filter.status, Some(FlowStatus::Active));
    /// ```
    fn from(params: &crate::params::ListFlows) -> Self {
        Self {
            name_contains: params.name.clone(),
            status: params.status,
            include_archived: params.archived,
        }
    }
}
