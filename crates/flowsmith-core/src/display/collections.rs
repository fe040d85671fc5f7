//! Collection wrapper types for displaying groups of domain objects.
//!
//! Each wrapper formats its items with their own `Display` and prints a
//! fixed message when empty.

use std::fmt;

use crate::{
    catalog::Template,
    models::{DeploymentRecord, FlowSummary, Step},
};

/// Newtype wrapper for displaying flow listings.
///
/// # Examples
///
/// ```rust
/// use flowsmith_core::{
///     display::FlowSummaries,
///     models::{FlowStatus, FlowSummary, FlowVersion},
/// };
/// use jiff::Timestamp;
///
/// let flow = FlowSummary {
///     id: 1,
///     name: "Signup".to_string(),
///     status: FlowStatus::Draft,
///     version: FlowVersion::INITIAL,
///     traffic_percentage: 100,
///     parent_id: None,
///     updated_at: Timestamp::now(),
///     step_count: 3,
/// };
///
/// let output = format!("{}", FlowSummaries(vec![flow]));
/// assert!(output.contains("## Signup (ID: 1, v1)"));
/// ```
pub struct FlowSummaries(pub Vec<FlowSummary>);

impl FlowSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlowSummary> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a FlowSummaries {
    type Item = &'a FlowSummary;
    type IntoIter = std::slice::Iter<'a, FlowSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FlowSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No flows found.");
        }
        for flow in &self.0 {
            write!(f, "{flow}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying an ordered step list.
pub struct Steps(pub Vec<Step>);

impl Steps {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No steps found.");
        }
        for step in &self.0 {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying the template catalog.
pub struct Templates(pub Vec<Template>);

impl fmt::Display for Templates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No templates available.");
        }
        writeln!(f, "## Templates")?;
        writeln!(f)?;
        for template in &self.0 {
            write!(f, "{template}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying the deployments made from one draft.
pub struct DeploymentHistory(pub Vec<DeploymentRecord>);

impl fmt::Display for DeploymentHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No deployments yet.");
        }
        writeln!(f, "## Deployments")?;
        writeln!(f)?;
        for record in &self.0 {
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;

    use super::*;
    use crate::models::{FlowStatus, FlowVersion, StepConfig, StepId};

    fn summary(id: u64, name: &str) -> FlowSummary {
        FlowSummary {
            id,
            name: name.to_string(),
            status: FlowStatus::Active,
            version: FlowVersion(4),
            traffic_percentage: 50,
            parent_id: Some(1),
            updated_at: Timestamp::from_second(1640995200).unwrap(),
            step_count: 2,
        }
    }

    fn step(id: u64, order: u32) -> Step {
        Step {
            id: StepId::Stored(id),
            step_type: "question".to_string(),
            order,
            config: StepConfig::from(json!({"title": "Your name?"})),
        }
    }

    #[test]
    fn test_flow_summaries_display() {
        let output = format!("{}", FlowSummaries(vec![summary(1, "A"), summary(2, "B")]));
        assert!(output.contains("## A (ID: 1, v4) ● Active"));
        assert!(output.contains("## B (ID: 2, v4)"));
        assert!(output.contains("- **Traffic**: 50%"));
        assert!(output.contains("- **Derived from**: flow 1"));
        assert!(!output.starts_with("# "));

        assert_eq!(format!("{}", FlowSummaries(vec![])), "No flows found.\n");
    }

    #[test]
    fn test_steps_display() {
        let output = format!("{}", Steps(vec![step(7, 0), step(8, 1)]));
        assert!(output.contains("### 1. question (ID: 7)"));
        assert!(output.contains("### 2. question (ID: 8)"));
        assert!(output.contains("\"title\": \"Your name?\""));

        assert_eq!(format!("{}", Steps(vec![])), "No steps found.\n");
    }

    #[test]
    fn test_deployment_history_display() {
        let record = DeploymentRecord {
            flow_id: 9,
            source_flow_id: 1,
            version: FlowVersion(4),
            step_count: 3,
            created_at: Timestamp::from_second(1640995200).unwrap(),
        };
        let output = format!("{}", DeploymentHistory(vec![record]));
        assert!(output.contains("- v4 as flow 9 (3 steps)"));
        assert_eq!(
            format!("{}", DeploymentHistory(vec![])),
            "No deployments yet.\n"
        );
    }
}
