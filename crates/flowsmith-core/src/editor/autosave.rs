//! Background worker that owns every store write made by an editor.
//!
//! Saves, deploys and flow switches all run on this one task, one at a time,
//! so no two `replace_steps` calls for the same editor are ever in flight.
//! Edits made while a save is running are picked up by exactly one follow-up
//! call once it resolves.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    time::{self, Instant},
};

use super::{LastError, SaveReport, Shared};
use crate::{
    deploy,
    error::{ErrorKind, FlowError, Result},
    gateway::FlowGateway,
    models::Deployment,
};

/// Requests sent from editor handles to the worker.
pub(crate) enum Command {
    /// The buffer changed; (re)start the debounce timer.
    Touched,
    /// Persist now, cancelling any pending debounce.
    Save(oneshot::Sender<Result<SaveReport>>),
    /// Flush pending edits, then deploy the loaded draft.
    Deploy(oneshot::Sender<Result<Deployment>>),
    /// Flush pending edits, then load another flow.
    Switch(u64, oneshot::Sender<Result<()>>),
}

enum Event {
    Command(Option<Command>),
    DebounceElapsed,
}

pub(crate) struct AutosaveWorker {
    shared: Arc<Shared>,
    gateway: Arc<dyn FlowGateway>,
    commands: mpsc::UnboundedReceiver<Command>,
    debounce: Option<Duration>,
}

impl AutosaveWorker {
    pub(crate) fn new(
        shared: Arc<Shared>,
        gateway: Arc<dyn FlowGateway>,
        commands: mpsc::UnboundedReceiver<Command>,
        debounce: Option<Duration>,
    ) -> Self {
        Self {
            shared,
            gateway,
            commands,
            debounce,
        }
    }

    /// Processes commands until every editor handle is dropped.
    pub(crate) async fn run(mut self) {
        let mut deadline: Option<Instant> = None;

        loop {
            let timer = async move {
                match deadline {
                    Some(at) => time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let event = tokio::select! {
                command = self.commands.recv() => Event::Command(command),
                _ = timer => Event::DebounceElapsed,
            };

            match event {
                Event::Command(None) => break,
                Event::Command(Some(Command::Touched)) => {
                    if let Some(delay) = self.debounce {
                        deadline = Some(Instant::now() + delay);
                    }
                }
                Event::Command(Some(Command::Save(reply))) => {
                    deadline = None;
                    let _ = reply.send(self.persist().await);
                }
                Event::Command(Some(Command::Deploy(reply))) => {
                    deadline = None;
                    let _ = reply.send(self.deploy().await);
                }
                Event::Command(Some(Command::Switch(flow_id, reply))) => {
                    deadline = None;
                    let _ = reply.send(self.switch(flow_id).await);
                }
                Event::DebounceElapsed => {
                    deadline = None;
                    if self.shared.lock().buffer.is_dirty() {
                        if let Err(e) = self.persist().await {
                            log::warn!("Autosave failed: {e}");
                        }
                    }
                }
            }
        }

        log::debug!("Autosave worker stopped");
    }

    /// Writes the buffer until the store holds what the buffer holds.
    ///
    /// Each round submits the steps as they were when the round started. If
    /// the buffer changed while the call was out, one more round is issued.
    /// A failed round leaves the buffer dirty and is not retried.
    async fn persist(&self) -> Result<SaveReport> {
        let mut calls = 0;

        loop {
            let (flow_id, submitted, revision) = {
                let mut state = self.shared.lock();
                let flow_id = state.buffer.editable_flow()?;
                state.is_saving = true;
                self.shared.publish(&state);
                (
                    flow_id,
                    state.buffer.steps().to_vec(),
                    state.buffer.revision(),
                )
            };

            calls += 1;
            let result = self
                .gateway
                .replace_steps(flow_id, submitted.clone())
                .await;

            let mut state = self.shared.lock();
            match result {
                Ok(stored) => {
                    state.buffer.reconcile(&submitted, &stored);
                    if state.buffer.mark_clean_if(revision) {
                        state.is_saving = false;
                        state.last_error = None;
                        self.shared.publish(&state);
                        log::debug!("Saved flow {flow_id} ({} steps)", stored.len());
                        return Ok(SaveReport {
                            flow_id,
                            step_count: stored.len(),
                            calls,
                        });
                    }
                    log::debug!("Flow {flow_id} changed during save, saving again");
                }
                Err(e) => {
                    state.is_saving = false;
                    state.last_error = Some(LastError::from(&e));
                    self.shared.publish(&state);
                    return Err(e);
                }
            }
        }
    }

    async fn flush(&self) -> Result<()> {
        if self.shared.lock().buffer.is_dirty() {
            self.persist().await?;
        }
        Ok(())
    }

    async fn deploy(&self) -> Result<Deployment> {
        let flow_id = {
            let mut state = self.shared.lock();
            let flow_id = state.buffer.flow_id().ok_or(FlowError::NoFlowSelected)?;
            state.is_deploying = true;
            self.shared.publish(&state);
            flow_id
        };

        let result = match self.flush().await {
            Ok(()) => deploy::deploy(self.gateway.as_ref(), flow_id).await,
            Err(e) => Err(e),
        };

        let mut state = self.shared.lock();
        state.is_deploying = false;
        match &result {
            Ok(_) => state.last_error = None,
            Err(e) => {
                log::warn!("Deploy of flow {flow_id} failed: {e}");
                state.last_error = Some(LastError::from(e));
            }
        }
        self.shared.publish(&state);
        result
    }

    async fn switch(&self, flow_id: u64) -> Result<()> {
        // A flow that left Draft can never take these edits, so they are dropped
        match self.flush().await {
            Err(e) if e.kind() == ErrorKind::Conflict => {
                let pending = self.shared.lock().buffer.steps().len();
                log::warn!("Discarding unsaved edits ({pending} steps) before switching: {e}");
            }
            other => other?,
        }

        let flow = self
            .gateway
            .get_flow(flow_id)
            .await?
            .ok_or(FlowError::FlowNotFound { id: flow_id })?;

        let mut state = self.shared.lock();
        log::debug!("Editing flow {flow_id} ({} steps)", flow.steps.len());
        state.buffer.load(flow);
        state.last_error = None;
        self.shared.publish(&state);
        Ok(())
    }
}
