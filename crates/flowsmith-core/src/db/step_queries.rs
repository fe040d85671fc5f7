//! Step queries: ordered reads, full-list replacement, and version copies.

use std::collections::HashSet;

use jiff::Timestamp;
use rusqlite::{params, types::Type};

use crate::{
    error::{DatabaseResultExt, FlowError, Result},
    models::{Step, StepConfig, StepId},
};

const SELECT_STEPS_BY_FLOW_SQL: &str = "SELECT id, screen_type, step_order, config_json FROM flow_steps WHERE flow_id = ?1 ORDER BY step_order";
const SELECT_STEP_IDS_SQL: &str = "SELECT id FROM flow_steps WHERE flow_id = ?1";
const DELETE_STEP_SQL: &str = "DELETE FROM flow_steps WHERE id = ?1";
// Parks every order below zero so rewrites never collide on UNIQUE(flow_id, step_order)
const PARK_STEP_ORDERS_SQL: &str =
    "UPDATE flow_steps SET step_order = -step_order - 1 WHERE flow_id = ?1";
const UPDATE_STEP_SQL: &str = "UPDATE flow_steps SET step_order = ?1, screen_type = ?2, config_json = ?3, updated_at = ?4 WHERE id = ?5";
const INSERT_STEP_SQL: &str = "INSERT INTO flow_steps (flow_id, step_order, screen_type, config_json, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const UPDATE_FLOW_TIMESTAMP_SQL: &str = "UPDATE flows SET updated_at = ?1 WHERE id = ?2";

impl super::Database {
    /// Helper function to construct a Step from a database row
    fn build_step_from_row(row: &rusqlite::Row) -> rusqlite::Result<Step> {
        let config_json: String = row.get(3)?;
        let config: StepConfig = serde_json::from_str(&config_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
        })?;

        Ok(Step {
            id: StepId::Stored(row.get::<_, i64>(0)? as u64),
            step_type: row.get(1)?,
            order: row.get::<_, i64>(2)? as u32,
            config,
        })
    }

    /// Retrieves all steps for a flow in order.
    pub fn get_steps(&self, flow_id: u64) -> Result<Vec<Step>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_STEPS_BY_FLOW_SQL)
            .db_context("Failed to prepare query")?;

        let steps = stmt
            .query_map(params![flow_id as i64], Self::build_step_from_row)
            .db_context("Failed to query steps")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch steps")?;

        Ok(steps)
    }

    /// Atomically replaces the full step list of a draft flow.
    ///
    /// Steps whose stored id belongs to this flow are updated in place; local
    /// or foreign ids are inserted as new rows; rows missing from `steps` are
    /// deleted. Returns the persisted list, in order, with durable ids.
    ///
    /// # Errors
    ///
    /// `FlowNotFound` if the flow does not exist, `Conflict` if it is not a
    /// draft, `InvalidInput` if `steps` repeats an id. Nothing is written in
    /// any error case.
    pub fn replace_steps(&mut self, flow_id: u64, steps: &[Step]) -> Result<Vec<Step>> {
        let mut seen = HashSet::with_capacity(steps.len());
        if let Some(repeated) = steps.iter().find(|s| !seen.insert(s.id)) {
            return Err(FlowError::invalid_input("steps")
                .with_reason(format!("Step {} appears more than once", repeated.id)));
        }

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let status = Self::flow_status_tx(&tx, flow_id)?;
        if !status.is_editable() {
            return Err(FlowError::Conflict { flow_id, status });
        }

        let existing: HashSet<u64> = {
            let mut stmt = tx
                .prepare(SELECT_STEP_IDS_SQL)
                .db_context("Failed to prepare query")?;
            let ids = stmt
                .query_map(params![flow_id as i64], |row| row.get::<_, i64>(0))
                .db_context("Failed to query step ids")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .db_context("Failed to fetch step ids")?;
            ids.into_iter().map(|id| id as u64).collect()
        };

        let kept: HashSet<u64> = steps
            .iter()
            .filter_map(|s| s.id.stored())
            .filter(|id| existing.contains(id))
            .collect();

        for orphan in existing.difference(&kept) {
            tx.execute(DELETE_STEP_SQL, params![*orphan as i64])
                .db_context("Failed to delete step")?;
        }

        tx.execute(PARK_STEP_ORDERS_SQL, params![flow_id as i64])
            .db_context("Failed to park step orders")?;

        let now_str = Timestamp::now().to_string();
        let mut persisted = Vec::with_capacity(steps.len());

        for (position, step) in steps.iter().enumerate() {
            let config_json = serde_json::to_string(&step.config)?;

            let id = match step.id.stored().filter(|id| kept.contains(id)) {
                Some(id) => {
                    tx.execute(
                        UPDATE_STEP_SQL,
                        params![
                            position as i64,
                            &step.step_type,
                            &config_json,
                            &now_str,
                            id as i64
                        ],
                    )
                    .db_context("Failed to update step")?;
                    id
                }
                None => {
                    tx.execute(
                        INSERT_STEP_SQL,
                        params![
                            flow_id as i64,
                            position as i64,
                            &step.step_type,
                            &config_json,
                            &now_str,
                            &now_str
                        ],
                    )
                    .db_context("Failed to insert step")?;
                    tx.last_insert_rowid() as u64
                }
            };

            persisted.push(Step {
                id: StepId::Stored(id),
                step_type: step.step_type.clone(),
                order: position as u32,
                config: step.config.clone(),
            });
        }

        tx.execute(UPDATE_FLOW_TIMESTAMP_SQL, params![&now_str, flow_id as i64])
            .db_context("Failed to update flow timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(persisted)
    }

    /// Inserts fresh copies of `steps` under `flow_id` in one transaction,
    /// preserving order, type and config. Used when creating flow versions,
    /// so it does not check the target's status.
    pub fn copy_steps(&mut self, flow_id: u64, steps: &[Step]) -> Result<Vec<Step>> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        // Fails with FlowNotFound before any insert
        Self::flow_status_tx(&tx, flow_id)?;

        let now_str = Timestamp::now().to_string();
        let mut copies = Vec::with_capacity(steps.len());

        for (position, step) in steps.iter().enumerate() {
            let config_json = serde_json::to_string(&step.config)?;
            tx.execute(
                INSERT_STEP_SQL,
                params![
                    flow_id as i64,
                    position as i64,
                    &step.step_type,
                    &config_json,
                    &now_str,
                    &now_str
                ],
            )
            .db_context("Failed to copy step")?;

            copies.push(Step {
                id: StepId::Stored(tx.last_insert_rowid() as u64),
                step_type: step.step_type.clone(),
                order: position as u32,
                config: step.config.clone(),
            });
        }

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(copies)
    }
}
