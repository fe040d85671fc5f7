//! Step template catalog.
//!
//! The editor consults a [`TemplateCatalog`] only when inserting a brand-new
//! step, to pick its type and seed its configuration. Step model operations
//! never look templates up.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{FlowError, Result},
    models::StepConfig,
};

/// A step template as provided by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Identifier used to request the template
    pub id: String,
    /// Step type assigned to steps created from the template
    #[serde(rename = "type")]
    pub step_type: String,
    /// Display name
    pub name: String,
    /// Initial configuration for new steps
    #[serde(default)]
    pub default_config: StepConfig,
}

/// Source of step templates.
pub trait TemplateCatalog: Send + Sync {
    /// Finds a template by id.
    fn lookup(&self, template_id: &str) -> Option<Template>;

    /// All templates, ordered by id.
    fn templates(&self) -> Vec<Template>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    templates: BTreeMap<String, Template>,
}

impl StaticCatalog {
    /// Creates a catalog from a list of templates. Later duplicates win.
    pub fn new(templates: impl IntoIterator<Item = Template>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// The default onboarding screen set.
    pub fn builtin() -> Self {
        Self::new([
            template(
                "welcome",
                "Welcome",
                json!({"title": "Welcome", "subtitle": "", "buttonText": "Get started"}),
            ),
            template(
                "question",
                "Question",
                json!({"questionScreen": {"question": "", "options": []}, "required": true}),
            ),
            template(
                "info",
                "Information",
                json!({"title": "", "body": ""}),
            ),
            template(
                "image",
                "Image",
                json!({"imageUrl": null, "caption": ""}),
            ),
            template(
                "video",
                "Video",
                json!({"videoUrl": null, "autoplay": false}),
            ),
            template(
                "confirmation",
                "Confirmation",
                json!({"title": "You're all set", "buttonText": "Finish"}),
            ),
        ])
    }

    /// Loads templates from a JSON array file.
    ///
    /// # Errors
    ///
    /// `FileSystem` if the file cannot be read, `Serialization` if it is not a
    /// JSON array of templates.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| FlowError::FileSystem {
            path: path.to_path_buf(),
            source: e,
        })?;
        let templates: Vec<Template> = serde_json::from_str(&raw)?;
        Ok(Self::new(templates))
    }
}

impl TemplateCatalog for StaticCatalog {
    fn lookup(&self, template_id: &str) -> Option<Template> {
        self.templates.get(template_id).cloned()
    }

    fn templates(&self) -> Vec<Template> {
        self.templates.values().cloned().collect()
    }
}

fn template(id: &str, name: &str, config: serde_json::Value) -> Template {
    Template {
        id: id.to_string(),
        step_type: id.to_string(),
        name: name.to_string(),
        default_config: StepConfig::from(config),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = StaticCatalog::builtin();

        let welcome = catalog.lookup("welcome").expect("welcome template");
        assert_eq!(welcome.step_type, "welcome");
        assert!(catalog.lookup("missing").is_none());
        assert_eq!(catalog.templates().len(), 6);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "promo", "type": "info", "name": "Promo", "default_config": {{"body": "Sale"}}}}]"#
        )
        .unwrap();

        let catalog = StaticCatalog::from_json_file(file.path()).unwrap();
        let promo = catalog.lookup("promo").unwrap();

        assert_eq!(promo.step_type, "info");
        assert_eq!(promo.default_config.as_value(), &json!({"body": "Sale"}));
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = StaticCatalog::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, FlowError::FileSystem { .. }));
    }
}
