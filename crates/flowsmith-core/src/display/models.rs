//! Display implementations for domain models.
//!
//! All output is markdown, rendered by the CLI's terminal renderer.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    catalog::Template,
    editor::EditorStatus,
    models::{Deployment, DeploymentRecord, Flow, FlowStatus, FlowSummary, Step},
};

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {} (v{})", self.id, self.name, self.version)?;
        writeln!(f)?;

        writeln!(f, "- Status: {}", self.status.with_icon())?;
        writeln!(f, "- Traffic: {}%", self.traffic_percentage)?;
        if let Some(parent) = self.parent_id {
            writeln!(f, "- Derived from: flow {parent}")?;
        }
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        if self.steps.is_empty() {
            writeln!(f, "\nNo steps in this flow.")?;
        } else {
            writeln!(f, "\n## Steps")?;
            writeln!(f)?;
            for step in &self.steps {
                write!(f, "{step}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {}. {} (ID: {})", self.order + 1, self.step_type, self.id)?;
        writeln!(f)?;

        let config = self.config.as_value();
        let is_empty = config.as_object().is_some_and(|map| map.is_empty());
        if !is_empty {
            let pretty = serde_json::to_string_pretty(config).map_err(|_| fmt::Error)?;
            writeln!(f, "```json")?;
            writeln!(f, "{pretty}")?;
            writeln!(f, "```")?;
            writeln!(f)?;
        }

        Ok(())
    }
}

impl fmt::Display for FlowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## {} (ID: {}, v{}) {}",
            self.name,
            self.id,
            self.version,
            self.status.with_icon()
        )?;
        writeln!(f)?;
        writeln!(f, "- **Steps**: {}", self.step_count)?;
        writeln!(f, "- **Traffic**: {}%", self.traffic_percentage)?;
        if let Some(parent) = self.parent_id {
            writeln!(f, "- **Derived from**: flow {parent}")?;
        }
        writeln!(f, "- **Updated**: {}", LocalDateTime(&self.updated_at))?;
        writeln!(f)?;
        Ok(())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- **{}**: {} (type `{}`)", self.id, self.name, self.step_type)
    }
}

impl fmt::Display for DeploymentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "- v{} as flow {} ({} steps) at {}",
            self.version,
            self.flow_id,
            self.step_count,
            LocalDateTime(&self.created_at)
        )
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deployed flow {} as flow {} (version {}, {} steps)",
            self.source_flow_id,
            self.flow.id,
            self.flow.version,
            self.step_count()
        )
    }
}

impl fmt::Display for EditorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.flow_id {
            Some(id) => writeln!(f, "- Flow: {id}")?,
            None => writeln!(f, "- Flow: none selected")?,
        }

        let state = if self.is_deploying {
            "deploying"
        } else if self.is_saving {
            "saving"
        } else if self.dirty {
            "unsaved changes"
        } else {
            "saved"
        };
        writeln!(f, "- State: {state}")?;
        writeln!(
            f,
            "- History: undo {}, redo {}",
            if self.can_undo { "available" } else { "empty" },
            if self.can_redo { "available" } else { "empty" }
        )?;

        if let Some(err) = &self.last_error {
            writeln!(f, "- Last error ({:?}): {}", err.kind, err.message)?;
        }
        Ok(())
    }
}
