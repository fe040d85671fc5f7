//! Display formatting for terminal output.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! newtype wrappers cover collections and operation results:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers &      │    │   Markdown      │
//! │  (Flow, Step)   │───▶│ Result Types    │───▶│   Output        │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`collections`]: FlowSummaries, Steps, Templates, DeploymentHistory
//! - [`results`]: CreateResult, UpdateResult, ArchiveResult
//! - [`status`]: OperationStatus
//! - [`datetime`]: timestamp formatting
//!
//! ```rust
//! use flowsmith_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Saved flow 1");
//! assert_eq!(status.to_string(), "Success: Saved flow 1\n");
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{DeploymentHistory, FlowSummaries, Steps, Templates};
pub use datetime::LocalDateTime;
pub use results::{ArchiveResult, CreateResult, UpdateResult};
pub use status::OperationStatus;
