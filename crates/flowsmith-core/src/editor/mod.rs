//! Editing sessions over a single draft flow.
//!
//! A [`FlowEditor`] holds the in-memory step list of one flow, applies edits
//! to it synchronously, and hands persistence to a background worker:
//!
//! ```text
//! insert/remove/move/...          save/deploy/switch_flow
//!        │                                 │
//!        ▼                                 ▼
//! ┌──────────────┐   Touched    ┌──────────────────┐   replace_steps   ┌─────────────┐
//! │  EditBuffer  │─────────────▶│  AutosaveWorker  │──────────────────▶│ FlowGateway │
//! │  + history   │◀─────────────│ (debounce timer) │◀──────────────────│             │
//! └──────────────┘ reconcile ids└──────────────────┘                   └─────────────┘
//! ```
//!
//! Edits never wait on the store. After the debounce interval elapses with
//! no further edits, the worker writes the buffer; `save()` writes at once.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use flowsmith_core::{EditorBuilder, StoreBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(StoreBuilder::new().build().await?);
//! let editor = EditorBuilder::new(store).open(1).await?;
//!
//! let welcome = editor.insert_step("welcome", Some(0))?;
//! editor.set_step_config(welcome, &"title".parse()?, "Hi there".into())?;
//! editor.save().await?;
//! # Ok(())
//! # }
//! ```

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};

mod autosave;
pub mod buffer;
pub mod history;

use autosave::{AutosaveWorker, Command};
pub use buffer::EditBuffer;
pub use history::{HistoryStack, DEFAULT_HISTORY_CAPACITY};

use crate::{
    catalog::{StaticCatalog, TemplateCatalog},
    error::{ErrorKind, FlowError, Result},
    gateway::FlowGateway,
    models::{ConfigPath, Deployment, Step, StepId},
};

/// Default quiet period before buffered edits are written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Most recent failure of a save or deploy, kept until the next success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FlowError> for LastError {
    fn from(err: &FlowError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Observable editor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorStatus {
    pub flow_id: Option<u64>,
    pub dirty: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub is_saving: bool,
    pub is_deploying: bool,
    pub last_error: Option<LastError>,
}

/// Outcome of a completed save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub flow_id: u64,
    pub step_count: usize,
    /// Store writes issued, including follow-ups for edits made mid-save.
    pub calls: u32,
}

pub(crate) struct EditorState {
    pub(crate) buffer: EditBuffer,
    pub(crate) is_saving: bool,
    pub(crate) is_deploying: bool,
    pub(crate) last_error: Option<LastError>,
}

impl EditorState {
    fn status(&self) -> EditorStatus {
        EditorStatus {
            flow_id: self.buffer.flow_id(),
            dirty: self.buffer.is_dirty(),
            can_undo: self.buffer.can_undo(),
            can_redo: self.buffer.can_redo(),
            is_saving: self.is_saving,
            is_deploying: self.is_deploying,
            last_error: self.last_error.clone(),
        }
    }
}

/// State shared between editor handles and the worker.
pub(crate) struct Shared {
    state: Mutex<EditorState>,
    status: watch::Sender<EditorStatus>,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, state: &EditorState) {
        self.status.send_replace(state.status());
    }
}

/// Builder for [`FlowEditor`] sessions.
pub struct EditorBuilder {
    gateway: Arc<dyn FlowGateway>,
    catalog: Arc<dyn TemplateCatalog>,
    debounce: Option<Duration>,
    history_capacity: usize,
}

impl EditorBuilder {
    /// Creates a builder with the built-in template catalog, a two second
    /// debounce and 50 history entries.
    pub fn new(gateway: Arc<dyn FlowGateway>) -> Self {
        Self {
            gateway,
            catalog: Arc::new(StaticCatalog::builtin()),
            debounce: Some(DEFAULT_DEBOUNCE),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn TemplateCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets the autosave quiet period. `None` disables autosave; edits are
    /// then only written by `save`, `deploy` and `switch_flow`.
    pub fn with_debounce(mut self, debounce: Option<Duration>) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Starts an editor with no flow loaded.
    ///
    /// # Errors
    ///
    /// `Configuration` when called outside a Tokio runtime.
    pub fn build(self) -> Result<FlowEditor> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| FlowError::Configuration {
                message: format!("Editor requires a Tokio runtime: {e}"),
            })?;

        let state = EditorState {
            buffer: EditBuffer::new(self.history_capacity),
            is_saving: false,
            is_deploying: false,
            last_error: None,
        };
        let (status, _) = watch::channel(state.status());
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            status,
        });

        let (commands, receiver) = mpsc::unbounded_channel();
        let worker = AutosaveWorker::new(shared.clone(), self.gateway, receiver, self.debounce);
        runtime.spawn(worker.run());

        Ok(FlowEditor {
            shared,
            catalog: self.catalog,
            commands,
        })
    }

    /// Starts an editor and loads `flow_id` into it.
    pub async fn open(self, flow_id: u64) -> Result<FlowEditor> {
        let editor = self.build()?;
        editor.switch_flow(flow_id).await?;
        Ok(editor)
    }
}

/// Handle to an editing session. Clones share the same session; the
/// background worker stops once every handle is dropped.
#[derive(Clone)]
pub struct FlowEditor {
    shared: Arc<Shared>,
    catalog: Arc<dyn TemplateCatalog>,
    commands: mpsc::UnboundedSender<Command>,
}

impl FlowEditor {
    /// Current ordered steps.
    pub fn steps(&self) -> Vec<Step> {
        self.shared.lock().buffer.steps().to_vec()
    }

    pub fn step(&self, id: StepId) -> Option<Step> {
        self.shared.lock().buffer.step(id).cloned()
    }

    pub fn flow_id(&self) -> Option<u64> {
        self.shared.lock().buffer.flow_id()
    }

    pub fn status(&self) -> EditorStatus {
        self.shared.lock().status()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<EditorStatus> {
        self.shared.status.subscribe()
    }

    pub fn is_dirty(&self) -> bool {
        self.status().dirty
    }

    pub fn can_undo(&self) -> bool {
        self.status().can_undo
    }

    pub fn can_redo(&self) -> bool {
        self.status().can_redo
    }

    /// Inserts a new step from template `template_id` at `at_index`, or at
    /// the end when `None`. Returns the new step's local id.
    ///
    /// # Errors
    ///
    /// `TemplateNotFound` for unknown templates, `NoFlowSelected`, `Conflict`
    /// for non-draft flows, `InvalidInput` for an index past the end.
    pub fn insert_step(&self, template_id: &str, at_index: Option<usize>) -> Result<StepId> {
        let template = self
            .catalog
            .lookup(template_id)
            .ok_or_else(|| FlowError::TemplateNotFound {
                id: template_id.to_string(),
            })?;
        let step = Step::new(template.step_type, template.default_config);
        self.mutate(|buffer| buffer.insert(at_index, step))
    }

    pub fn remove_step(&self, id: StepId) -> Result<()> {
        self.mutate(|buffer| buffer.remove(id))
    }

    /// Moves step `id` to `new_index`, clamped to the last position.
    pub fn move_step(&self, id: StepId, new_index: usize) -> Result<()> {
        self.mutate(|buffer| buffer.move_to(id, new_index).map(|_| ()))
    }

    /// Copies step `id` right after itself and returns the copy's id.
    pub fn duplicate_step(&self, id: StepId) -> Result<StepId> {
        self.mutate(|buffer| buffer.duplicate(id))
    }

    pub fn set_step_config(&self, id: StepId, path: &ConfigPath, value: Value) -> Result<()> {
        self.mutate(|buffer| buffer.set_config(id, path, value))
    }

    /// Steps back in history. Returns `false` if there was nothing to undo.
    pub fn undo(&self) -> bool {
        self.mutate(|buffer| Ok(buffer.undo())).unwrap_or(false)
    }

    /// Steps forward in history. Returns `false` if there was nothing to redo.
    pub fn redo(&self) -> bool {
        self.mutate(|buffer| Ok(buffer.redo())).unwrap_or(false)
    }

    /// Writes the buffer now, cancelling any pending autosave.
    pub async fn save(&self) -> Result<SaveReport> {
        self.request(Command::Save).await
    }

    /// Flushes pending edits and deploys the loaded draft as a new active
    /// version. The editor stays on the draft.
    pub async fn deploy(&self) -> Result<Deployment> {
        self.request(Command::Deploy).await
    }

    /// Flushes pending edits of the current flow, then loads `flow_id` with
    /// a fresh history. If the current flow is no longer a draft its pending
    /// edits are discarded with a warning; any other flush failure keeps the
    /// current flow loaded.
    pub async fn switch_flow(&self, flow_id: u64) -> Result<()> {
        self.request(|reply| Command::Switch(flow_id, reply)).await
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut EditBuffer) -> Result<T>) -> Result<T> {
        let mut state = self.shared.lock();
        let revision = state.buffer.revision();
        let out = op(&mut state.buffer)?;
        let changed = state.buffer.revision() != revision;
        if changed {
            self.shared.publish(&state);
        }
        drop(state);

        if changed && self.commands.send(Command::Touched).is_err() {
            log::warn!("Autosave worker is not running; edits stay unsaved");
        }
        Ok(out)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| worker_stopped())?;
        response.await.map_err(|_| worker_stopped())?
    }
}

impl std::fmt::Debug for FlowEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEditor")
            .field("status", &self.status())
            .finish()
    }
}

fn worker_stopped() -> FlowError {
    FlowError::Task {
        message: "Autosave worker stopped".to_string(),
    }
}
