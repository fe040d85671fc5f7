//! Core library for the Flowsmith onboarding flow editor.
//!
//! This crate provides the editing, autosave and deployment engine for
//! onboarding flows: ordered sequences of configurable steps that move from
//! an editable draft to frozen, versioned active releases.
//!
//! # Architecture
//!
//! - **Step model** ([`step_model`]): pure operations over ordered step lists
//! - **Editor** ([`editor`]): in-memory buffer with undo/redo and a debounced,
//!   coalescing autosave worker
//! - **Gateway** ([`gateway`]): the async persistence boundary, implemented on
//!   SQLite by [`store::FlowStore`]
//! - **Deploy** ([`deploy`]): promotes a draft to a new active version
//! - **Display** ([`display`]): markdown formatting for terminal output
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use flowsmith_core::{params::CreateFlow, EditorBuilder, FlowGateway, StoreBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(
//!     StoreBuilder::new()
//!         .with_database_path(Some("flows.db"))
//!         .build()
//!         .await?,
//! );
//!
//! let flow = store
//!     .create_flow(CreateFlow {
//!         name: "Signup".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let editor = EditorBuilder::new(store.clone()).open(flow.id).await?;
//! editor.insert_step("welcome", None)?;
//! editor.insert_step("question", None)?;
//!
//! let deployment = editor.deploy().await?;
//! println!("{deployment}");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod db;
pub mod deploy;
pub mod display;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod models;
pub mod params;
pub mod step_model;
pub mod store;

// Re-export commonly used types
pub use catalog::{StaticCatalog, Template, TemplateCatalog};
pub use db::Database;
pub use display::{
    ArchiveResult, CreateResult, DeploymentHistory, FlowSummaries, OperationStatus, Steps,
    Templates, UpdateResult,
};
pub use editor::{EditorBuilder, EditorStatus, FlowEditor, LastError, SaveReport};
pub use error::{ErrorKind, FlowError, Result};
pub use gateway::FlowGateway;
pub use models::{
    ConfigPath, Deployment, DeploymentRecord, Flow, FlowFilter, FlowPatch, FlowStatus,
    FlowSummary, FlowVersion, Step, StepConfig, StepId,
};
pub use params::{CreateFlow, Id, ListFlows, UpdateFlow};
pub use store::{FlowStore, StoreBuilder};
