//! Nested step configuration trees and path addressing.
//!
//! A step's configuration is an arbitrarily shaped tree whose layout is owned
//! by the step's template. The core never interprets it; it only reads and
//! writes leaves by path. The tree is a [`serde_json::Value`], so maps, arrays
//! and scalars are all representable and round-trip through storage
//! unchanged.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FlowError, Result};

/// Array indices beyond this are rejected to keep padding bounded.
pub const MAX_ARRAY_INDEX: usize = 10_000;

/// One step along a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a leaf inside a [`StepConfig`].
///
/// Parsed from dotted notation where purely numeric segments address array
/// elements:
///
/// ```rust
/// use flowsmith_core::models::{ConfigPath, PathSegment};
///
/// let path: ConfigPath = "options.2.label".parse().unwrap();
/// assert_eq!(
///     path.segments(),
///     &[
///         PathSegment::Key("options".into()),
///         PathSegment::Index(2),
///         PathSegment::Key("label".into()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigPath(Vec<PathSegment>);

impl ConfigPath {
    /// Builds a path made only of object keys.
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| PathSegment::Key(k.into())).collect())
    }

    /// The segments from root to leaf.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// True for the root path, which addresses the whole config.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PathSegment>> for ConfigPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromStr for ConfigPath {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::default());
        }

        s.split('.')
            .map(|raw| {
                if raw.is_empty() {
                    return Err(FlowError::invalid_input("path")
                        .with_reason(format!("Empty segment in path '{s}'")));
                }
                Ok(match raw.parse::<usize>() {
                    Ok(index) => PathSegment::Index(index),
                    Err(_) => PathSegment::Key(raw.to_string()),
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Opaque configuration payload of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepConfig(Value);

impl Default for StepConfig {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl From<Value> for StepConfig {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl StepConfig {
    /// Borrow the underlying tree.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume into the underlying tree.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Looks up the value at `path`, if every segment along it exists.
    pub fn get_path(&self, path: &ConfigPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(&self.0, |node, segment| match segment {
                PathSegment::Key(key) => node.as_object()?.get(key),
                PathSegment::Index(index) => node.as_array()?.get(*index),
            })
    }

    /// Returns a copy of this config with the leaf at `path` set to `value`.
    ///
    /// Missing containers along the path are created; a scalar standing where
    /// a container is needed is replaced. A numeric segment that lands on an
    /// existing map is used as a key. `self` is left untouched.
    pub fn with_path(&self, path: &ConfigPath, value: Value) -> Result<Self> {
        if let Some(index) = path.segments().iter().find_map(|s| match s {
            PathSegment::Index(i) if *i > MAX_ARRAY_INDEX => Some(*i),
            _ => None,
        }) {
            return Err(FlowError::invalid_input("path").with_reason(format!(
                "Array index {index} exceeds the maximum of {MAX_ARRAY_INDEX}"
            )));
        }

        let mut tree = self.0.clone();
        set_in(&mut tree, path.segments(), value);
        Ok(Self(tree))
    }
}

fn set_in(node: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    match head {
        PathSegment::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                set_in(child, rest, value);
            }
        }
        PathSegment::Index(index) => {
            if let Value::Object(map) = node {
                let child = map.entry(index.to_string()).or_insert(Value::Null);
                set_in(child, rest, value);
                return;
            }
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                if items.len() <= *index {
                    items.resize(*index + 1, Value::Null);
                }
                set_in(&mut items[*index], rest, value);
            }
        }
    }
}
