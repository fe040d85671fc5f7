//! Pure operations over ordered step lists.
//!
//! Every function takes a borrowed list and returns a new one; inputs are
//! never modified. All returned lists have dense `order` values `0..N-1`
//! matching their positions.

use serde_json::Value;

use crate::{
    error::{FlowError, Result},
    models::{ConfigPath, Step, StepId},
};

/// Rewrites `order` so it matches each step's position.
pub fn renumber(steps: &mut [Step]) {
    for (position, step) in steps.iter_mut().enumerate() {
        step.order = position as u32;
    }
}

/// True if orders are exactly `0..N-1` in list order.
pub fn is_dense(steps: &[Step]) -> bool {
    steps
        .iter()
        .enumerate()
        .all(|(position, step)| step.order as usize == position)
}

/// Position of the step with `id`, if present.
pub fn position_of(steps: &[Step], id: StepId) -> Option<usize> {
    steps.iter().position(|step| step.id == id)
}

/// Returns a list with `step` inserted at `index`.
///
/// # Errors
///
/// `InvalidInput` if `index` is greater than the list length.
pub fn insert_at(steps: &[Step], index: usize, step: Step) -> Result<Vec<Step>> {
    if index > steps.len() {
        return Err(FlowError::invalid_input("index").with_reason(format!(
            "Position {index} is out of range. Flow has {} steps",
            steps.len()
        )));
    }

    let mut next = steps.to_vec();
    next.insert(index, step);
    renumber(&mut next);
    Ok(next)
}

/// Returns a list without the step `id`; unchanged if it is absent.
pub fn remove_by_id(steps: &[Step], id: StepId) -> Vec<Step> {
    let mut next: Vec<Step> = steps.iter().filter(|s| s.id != id).cloned().collect();
    renumber(&mut next);
    next
}

/// Moves the step `id` to `new_index`, clamped to the last position.
///
/// # Errors
///
/// `StepNotFound` if no step has `id`.
pub fn move_by_id(steps: &[Step], id: StepId, new_index: usize) -> Result<Vec<Step>> {
    let from = position_of(steps, id).ok_or(FlowError::StepNotFound { id })?;
    let to = new_index.min(steps.len() - 1);

    let mut next = steps.to_vec();
    let step = next.remove(from);
    next.insert(to, step);
    renumber(&mut next);
    Ok(next)
}

/// Inserts a copy of step `id` right after it, under a fresh local id.
///
/// Returns the new list and the id of the copy. The copy owns its config, so
/// later edits to either step do not affect the other.
///
/// # Errors
///
/// `StepNotFound` if no step has `id`.
pub fn duplicate(steps: &[Step], id: StepId) -> Result<(Vec<Step>, StepId)> {
    let position = position_of(steps, id).ok_or(FlowError::StepNotFound { id })?;

    let mut copy = steps[position].clone();
    copy.id = StepId::local();
    let copy_id = copy.id;

    let next = insert_at(steps, position + 1, copy)?;
    Ok((next, copy_id))
}

/// Returns a copy of `step` with the config leaf at `path` set to `value`.
pub fn set_config_at_path(step: &Step, path: &ConfigPath, value: Value) -> Result<Step> {
    Ok(Step {
        config: step.config.with_path(path, value)?,
        ..step.clone()
    })
}
