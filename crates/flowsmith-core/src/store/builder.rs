//! Builder for creating and configuring FlowStore instances.

use std::path::{Path, PathBuf};

use tokio::task;

use super::FlowStore;
use crate::{
    db::Database,
    error::{FlowError, Result},
};

/// Builder for creating and configuring FlowStore instances.
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    database_path: Option<PathBuf>,
}

impl StoreBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/flowsmith/flowsmith.db` or
    /// `~/.local/share/flowsmith/flowsmith.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Builds the configured store, creating the database and schema.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::FileSystem` if the database directory cannot be
    /// created, `FlowError::Database` if schema initialization fails.
    pub async fn build(self) -> Result<FlowStore> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FlowError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), FlowError>(())
        })
        .await
        .map_err(FlowError::join)??;

        log::debug!("Flow store ready at {}", db_path.display());
        Ok(FlowStore::new(db_path))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("flowsmith")
            .place_data_file("flowsmith.db")
            .map_err(|e| FlowError::XdgDirectory(e.to_string()))
    }
}
