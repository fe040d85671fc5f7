//! Data models for flows and steps.
//!
//! This module contains the domain models of the flow editor. Display
//! implementations live in [`crate::display::models`] so presentation stays
//! separate from the data structures.
//!
//! # Overview
//!
//! - [`Flow`]: a named, versioned sequence of steps with a lifecycle
//!   [`FlowStatus`]
//! - [`Step`]: one configurable unit, identified by a [`StepId`] that is either
//!   durable or client-local
//! - [`StepConfig`]: the opaque, template-shaped configuration tree, addressed
//!   through [`ConfigPath`]
//!
//! # Examples
//!
//! ```rust
//! use flowsmith_core::models::{ConfigPath, Step, StepConfig};
//! use serde_json::json;
//!
//! let step = Step::new("welcome", StepConfig::default());
//! let path = ConfigPath::keys(["title"]);
//! let config = step.config.with_path(&path, json!("Hello")).unwrap();
//!
//! assert_eq!(config.get_path(&path), Some(&json!("Hello")));
//! assert!(step.id.is_local());
//! ```

pub mod config;
pub mod deployment;
pub mod filters;
pub mod flow;
pub mod requests;
pub mod status;
pub mod step;


pub use config::{ConfigPath, PathSegment, StepConfig};
pub use deployment::{Deployment, DeploymentRecord};
pub use filters::FlowFilter;
pub use flow::{Flow, FlowSummary, FlowVersion};
pub use requests::{FlowPatch, NewFlow};
pub use status::FlowStatus;
pub use step::{Step, StepId};
