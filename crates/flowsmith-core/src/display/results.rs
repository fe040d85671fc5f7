//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use crate::models::{Flow, Step};

/// Wrapper for displaying a newly created resource.
///
/// # Examples
///
/// ```rust
/// use flowsmith_core::{
///     display::CreateResult,
///     models::{Flow, FlowStatus, FlowVersion},
/// };
/// use jiff::Timestamp;
///
/// let flow = Flow {
///     id: 1,
///     name: "Signup".to_string(),
///     description: None,
///     status: FlowStatus::Draft,
///     version: FlowVersion::INITIAL,
///     traffic_percentage: 100,
///     parent_id: None,
///     created_at: Timestamp::now(),
///     updated_at: Timestamp::now(),
///     steps: vec![],
/// };
///
/// let output = format!("{}", CreateResult::new(flow));
/// assert!(output.starts_with("Created flow with ID: 1"));
/// ```
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Flow> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created flow with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for CreateResult<Step> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inserted step with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper for displaying an updated flow together with what changed.
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }
}

impl fmt::Display for UpdateResult<Flow> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated flow with ID: {}", self.resource.id)?;

        if !self.changes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
        }

        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper for displaying an archived flow.
pub struct ArchiveResult(pub Flow);

impl fmt::Display for ArchiveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Archived flow '{}' (ID: {}, v{})",
            self.0.name, self.0.id, self.0.version
        )
    }
}
