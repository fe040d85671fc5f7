//! In-memory working copy of the flow being edited.

use std::collections::HashMap;

use serde_json::Value;

use super::history::HistoryStack;
use crate::{
    error::{FlowError, Result},
    models::{ConfigPath, Flow, FlowStatus, Step, StepId},
    step_model,
};

/// Flow the buffer is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedFlow {
    pub id: u64,
    pub status: FlowStatus,
}

/// Ordered steps of one flow plus dirty tracking and undo history.
///
/// Every successful mutation replaces the step list wholesale, bumps the
/// revision, marks the buffer dirty and records a history snapshot. The
/// revision lets a save that raced with edits tell whether what it wrote is
/// still what the buffer holds.
#[derive(Debug, Clone)]
pub struct EditBuffer {
    flow: Option<LoadedFlow>,
    steps: Vec<Step>,
    positions: HashMap<StepId, usize>,
    dirty: bool,
    revision: u64,
    history: HistoryStack,
}

impl EditBuffer {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            flow: None,
            steps: Vec::new(),
            positions: HashMap::new(),
            dirty: false,
            revision: 0,
            history: HistoryStack::new(history_capacity),
        }
    }

    /// Replaces the buffer with a freshly loaded flow; clean, history reset.
    pub fn load(&mut self, flow: Flow) {
        self.flow = Some(LoadedFlow {
            id: flow.id,
            status: flow.status,
        });
        self.history.reset(flow.steps.clone());
        self.set_steps(flow.steps);
        self.dirty = false;
        self.revision += 1;
    }

    pub fn flow(&self) -> Option<LoadedFlow> {
        self.flow
    }

    pub fn flow_id(&self) -> Option<u64> {
        self.flow.map(|f| f.id)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.positions.get(&id).map(|&i| &self.steps[i])
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Id of the bound flow if it still accepts edits.
    ///
    /// # Errors
    ///
    /// `NoFlowSelected` before any load, `Conflict` for active or archived
    /// flows.
    pub fn editable_flow(&self) -> Result<u64> {
        let flow = self.flow.ok_or(FlowError::NoFlowSelected)?;
        if !flow.status.is_editable() {
            return Err(FlowError::Conflict {
                flow_id: flow.id,
                status: flow.status,
            });
        }
        Ok(flow.id)
    }

    /// Inserts `step` at `index`, or appends when `index` is `None`.
    pub fn insert(&mut self, index: Option<usize>, step: Step) -> Result<StepId> {
        self.editable_flow()?;
        let id = step.id;
        let index = index.unwrap_or(self.steps.len());
        let next = step_model::insert_at(&self.steps, index, step)?;
        self.commit(next);
        Ok(id)
    }

    pub fn remove(&mut self, id: StepId) -> Result<()> {
        self.editable_flow()?;
        self.require(id)?;
        let next = step_model::remove_by_id(&self.steps, id);
        self.commit(next);
        Ok(())
    }

    /// Moves step `id` to `index` (clamped). Returns `false` when the step
    /// already sits there and nothing changed.
    pub fn move_to(&mut self, id: StepId, index: usize) -> Result<bool> {
        self.editable_flow()?;
        let from = self.require(id)?;
        if from == index.min(self.steps.len().saturating_sub(1)) {
            return Ok(false);
        }
        let next = step_model::move_by_id(&self.steps, id, index)?;
        self.commit(next);
        Ok(true)
    }

    pub fn duplicate(&mut self, id: StepId) -> Result<StepId> {
        self.editable_flow()?;
        let (next, copy_id) = step_model::duplicate(&self.steps, id)?;
        self.commit(next);
        Ok(copy_id)
    }

    pub fn set_config(&mut self, id: StepId, path: &ConfigPath, value: Value) -> Result<()> {
        self.editable_flow()?;
        let position = self.require(id)?;
        let updated = step_model::set_config_at_path(&self.steps[position], path, value)?;

        let mut next = self.steps.clone();
        next[position] = updated;
        self.commit(next);
        Ok(())
    }

    /// Restores the previous snapshot. `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                let snapshot = snapshot.to_vec();
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Restores the next snapshot. `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                let snapshot = snapshot.to_vec();
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Clears the dirty flag if nothing changed since `revision`.
    pub fn mark_clean_if(&mut self, revision: u64) -> bool {
        if self.revision == revision {
            self.dirty = false;
            true
        } else {
            false
        }
    }

    /// Swaps ids of `submitted` steps for the ids the store assigned in
    /// `stored`, both in the live list and in every history snapshot.
    ///
    /// Lists are matched by position. Steps added after the snapshot was
    /// taken keep their local ids until the next save.
    pub fn reconcile(&mut self, submitted: &[Step], stored: &[Step]) {
        let ids: HashMap<StepId, StepId> = submitted
            .iter()
            .zip(stored)
            .filter(|(before, after)| before.id != after.id)
            .map(|(before, after)| (before.id, after.id))
            .collect();
        if ids.is_empty() {
            return;
        }

        for step in &mut self.steps {
            if let Some(new_id) = ids.get(&step.id) {
                step.id = *new_id;
            }
        }
        self.history.remap_ids(&ids);
        self.reindex();
        log::debug!("Reconciled {} step ids after save", ids.len());
    }

    fn require(&self, id: StepId) -> Result<usize> {
        self.positions
            .get(&id)
            .copied()
            .ok_or(FlowError::StepNotFound { id })
    }

    fn commit(&mut self, next: Vec<Step>) {
        self.history.record(next.clone());
        self.set_steps(next);
        self.touch();
    }

    fn restore(&mut self, snapshot: Vec<Step>) {
        self.set_steps(snapshot);
        self.touch();
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    fn set_steps(&mut self, steps: Vec<Step>) {
        self.steps = steps;
        self.reindex();
    }

    fn reindex(&mut self) {
        self.positions = self
            .steps
            .iter()
            .enumerate()
            .map(|(position, step)| (step.id, position))
            .collect();
    }
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new(super::history::DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;

    use super::*;
    use crate::models::{FlowVersion, StepConfig};

    fn flow(status: FlowStatus, steps: Vec<Step>) -> Flow {
        Flow {
            id: 1,
            name: "Signup".to_string(),
            description: None,
            status,
            version: FlowVersion::INITIAL,
            traffic_percentage: 100,
            parent_id: None,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
            steps,
        }
    }

    fn stored_step(id: u64, order: u32) -> Step {
        Step {
            id: StepId::Stored(id),
            step_type: "info".to_string(),
            order,
            config: StepConfig::default(),
        }
    }

    fn loaded(steps: Vec<Step>) -> EditBuffer {
        let mut buffer = EditBuffer::default();
        buffer.load(flow(FlowStatus::Draft, steps));
        buffer
    }

    #[test]
    fn test_unloaded_buffer_rejects_edits() {
        let mut buffer = EditBuffer::default();
        let result = buffer.insert(None, Step::new("info", StepConfig::default()));
        assert!(matches!(result, Err(FlowError::NoFlowSelected)));
    }

    #[test]
    fn test_active_flow_rejects_edits() {
        let mut buffer = EditBuffer::default();
        buffer.load(flow(FlowStatus::Active, vec![stored_step(1, 0)]));

        let result = buffer.remove(StepId::Stored(1));
        assert!(matches!(result, Err(FlowError::Conflict { .. })));
        assert!(!buffer.is_dirty());
        assert_eq!(buffer.steps().len(), 1);
    }

    #[test]
    fn test_mutation_marks_dirty_and_bumps_revision() {
        let mut buffer = loaded(vec![stored_step(1, 0)]);
        let before = buffer.revision();

        buffer
            .insert(Some(0), Step::new("question", StepConfig::default()))
            .expect("Failed to insert");

        assert!(buffer.is_dirty());
        assert!(buffer.revision() > before);
        assert!(step_model::is_dense(buffer.steps()));
        assert_eq!(buffer.steps()[1].id, StepId::Stored(1));
    }

    #[test]
    fn test_move_to_same_position_is_noop() {
        let mut buffer = loaded(vec![stored_step(1, 0), stored_step(2, 1)]);

        let moved = buffer.move_to(StepId::Stored(2), 9).expect("Failed to move");

        assert!(!moved);
        assert!(!buffer.is_dirty());
        assert!(!buffer.can_undo());
    }

    #[test]
    fn test_unknown_step_is_not_found() {
        let mut buffer = loaded(vec![stored_step(1, 0)]);
        let path: ConfigPath = "title".parse().expect("Failed to parse path");
        let result = buffer.set_config(StepId::Stored(7), &path, json!("x"));
        assert!(matches!(result, Err(FlowError::StepNotFound { .. })));
    }

    #[test]
    fn test_undo_restores_and_redo_reapplies() {
        let mut buffer = loaded(vec![stored_step(1, 0)]);
        buffer.remove(StepId::Stored(1)).expect("Failed to remove");
        assert!(buffer.steps().is_empty());

        assert!(buffer.undo());
        assert_eq!(buffer.steps().len(), 1);
        assert!(buffer.step(StepId::Stored(1)).is_some());
        assert!(!buffer.undo());

        assert!(buffer.redo());
        assert!(buffer.steps().is_empty());
        assert!(!buffer.redo());
    }

    #[test]
    fn test_mark_clean_only_for_matching_revision() {
        let mut buffer = loaded(Vec::new());
        buffer
            .insert(None, Step::new("info", StepConfig::default()))
            .expect("Failed to insert");
        let saved_revision = buffer.revision();
        buffer
            .insert(None, Step::new("info", StepConfig::default()))
            .expect("Failed to insert");

        assert!(!buffer.mark_clean_if(saved_revision));
        assert!(buffer.is_dirty());
        assert!(buffer.mark_clean_if(buffer.revision()));
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn test_reconcile_rewrites_live_and_history_ids() {
        let mut buffer = loaded(Vec::new());
        let local = buffer
            .insert(None, Step::new("info", StepConfig::default()))
            .expect("Failed to insert");
        let submitted = buffer.steps().to_vec();
        let mut stored = submitted.clone();
        stored[0].id = StepId::Stored(40);

        buffer.reconcile(&submitted, &stored);

        assert!(buffer.step(local).is_none());
        assert!(buffer.step(StepId::Stored(40)).is_some());

        buffer.undo();
        buffer.redo();
        assert_eq!(buffer.steps()[0].id, StepId::Stored(40));
    }
}
