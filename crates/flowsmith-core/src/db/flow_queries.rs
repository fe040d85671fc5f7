//! Flow CRUD operations and queries.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension, Transaction};

use super::parse_column;
use crate::{
    error::{DatabaseResultExt, FlowError, Result},
    models::{
        requests::{validate_name, validate_traffic},
        DeploymentRecord, Flow, FlowFilter, FlowPatch, FlowStatus, FlowSummary, FlowVersion,
        NewFlow,
    },
};

const FLOW_COLUMNS: &str =
    "id, name, description, status, version, traffic_percentage, parent_id, created_at, updated_at";
const INSERT_FLOW_SQL: &str = "INSERT INTO flows (name, description, status, version, traffic_percentage, parent_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
const SELECT_FLOW_STATUS_SQL: &str = "SELECT status FROM flows WHERE id = ?1";
const UPDATE_FLOW_SQL: &str = "UPDATE flows SET name = ?1, description = ?2, traffic_percentage = ?3, updated_at = ?4 WHERE id = ?5";
const UPDATE_FLOW_STATUS_SQL: &str = "UPDATE flows SET status = ?1, updated_at = ?2 WHERE id = ?3";
const DELETE_FLOW_SQL: &str = "DELETE FROM flows WHERE id = ?1";
/// Highest version among every flow sharing a root with `?1`.
const SELECT_LINEAGE_MAX_VERSION_SQL: &str = "
    WITH RECURSIVE
        ancestors(id, parent_id) AS (
            SELECT id, parent_id FROM flows WHERE id = ?1
            UNION
            SELECT f.id, f.parent_id FROM flows f JOIN ancestors a ON f.id = a.parent_id
        ),
        lineage(id) AS (
            SELECT id FROM ancestors WHERE parent_id IS NULL
            UNION
            SELECT f.id FROM flows f JOIN lineage l ON f.parent_id = l.id
        )
    SELECT MAX(CAST(version AS INTEGER)) FROM flows WHERE id IN (SELECT id FROM lineage)";
const INSERT_DEPLOYMENT_SQL: &str = "INSERT INTO deployments (flow_id, source_flow_id, version, step_count, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";
const SELECT_DEPLOYMENTS_SQL: &str = "SELECT flow_id, source_flow_id, version, step_count, created_at FROM deployments WHERE source_flow_id = ?1 ORDER BY id";
const SELECT_SUMMARIES_SQL: &str = "SELECT f.id, f.name, f.status, f.version, f.traffic_percentage, f.parent_id, f.updated_at, COUNT(s.id) FROM flows f LEFT JOIN flow_steps s ON s.flow_id = f.id";

/// Default traffic share for flows created without one.
pub const DEFAULT_TRAFFIC_PERCENTAGE: u8 = 100;

impl super::Database {
    /// Helper function to construct a Flow (without steps) from a row
    /// selected with [`FLOW_COLUMNS`].
    fn build_flow_from_row(row: &rusqlite::Row) -> rusqlite::Result<Flow> {
        Ok(Flow {
            id: row.get::<_, i64>(0)? as u64,
            name: row.get(1)?,
            description: row.get(2)?,
            status: parse_column::<FlowStatus>(row, 3)?,
            version: parse_column::<FlowVersion>(row, 4)?,
            traffic_percentage: row.get::<_, i64>(5)? as u8,
            parent_id: row.get::<_, Option<i64>>(6)?.map(|id| id as u64),
            created_at: parse_column::<Timestamp>(row, 7)?,
            updated_at: parse_column::<Timestamp>(row, 8)?,
            steps: Vec::new(),
        })
    }

    /// Reads a flow's status inside a transaction, failing if it is missing.
    pub(crate) fn flow_status_tx(tx: &Transaction, flow_id: u64) -> Result<FlowStatus> {
        let status: Option<String> = tx
            .query_row(SELECT_FLOW_STATUS_SQL, params![flow_id as i64], |row| row.get(0))
            .optional()
            .db_context("Failed to query flow status")?;

        let status = status.ok_or(FlowError::FlowNotFound { id: flow_id })?;
        status
            .parse::<FlowStatus>()
            .map_err(|reason| FlowError::Configuration { message: reason })
    }

    fn select_flow_tx(tx: &Transaction, flow_id: u64) -> Result<Flow> {
        tx.query_row(
            &format!("SELECT {FLOW_COLUMNS} FROM flows WHERE id = ?1"),
            params![flow_id as i64],
            Self::build_flow_from_row,
        )
        .optional()
        .db_context("Failed to query flow")?
        .ok_or(FlowError::FlowNotFound { id: flow_id })
    }

    /// Creates a new draft flow at version 1 with no steps.
    pub fn create_flow(
        &mut self,
        name: &str,
        description: Option<&str>,
        traffic_percentage: Option<u8>,
    ) -> Result<Flow> {
        validate_name(name)?;
        let traffic = traffic_percentage.unwrap_or(DEFAULT_TRAFFIC_PERCENTAGE);
        validate_traffic(traffic)?;

        self.insert_flow(&NewFlow {
            name: name.to_string(),
            description: description.map(String::from),
            status: FlowStatus::Draft,
            version: FlowVersion::INITIAL,
            traffic_percentage: traffic,
            parent_id: None,
        })
    }

    /// Inserts a flow row exactly as described by `new`.
    pub fn insert_flow(&mut self, new: &NewFlow) -> Result<Flow> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now = Timestamp::now();
        let now_str = now.to_string();

        tx.execute(
            INSERT_FLOW_SQL,
            params![
                &new.name,
                new.description.as_deref(),
                new.status.as_str(),
                new.version.to_string(),
                new.traffic_percentage as i64,
                new.parent_id.map(|id| id as i64),
                &now_str,
                &now_str
            ],
        )
        .db_context("Failed to insert flow")?;

        let id = tx.last_insert_rowid() as u64;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Flow {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            status: new.status,
            version: new.version,
            traffic_percentage: new.traffic_percentage,
            parent_id: new.parent_id,
            created_at: now,
            updated_at: now,
            steps: Vec::new(),
        })
    }

    /// Retrieves a flow by its ID, with its ordered steps.
    pub fn get_flow(&self, id: u64) -> Result<Option<Flow>> {
        let mut stmt = self
            .connection
            .prepare(&format!("SELECT {FLOW_COLUMNS} FROM flows WHERE id = ?1"))
            .db_context("Failed to prepare query")?;

        let mut flow = stmt
            .query_row(params![id as i64], Self::build_flow_from_row)
            .optional()
            .db_context("Failed to query flow")?;

        if let Some(ref mut flow) = flow {
            flow.steps = self.get_steps(flow.id)?;
        }

        Ok(flow)
    }

    /// Lists flows with their step counts, newest first.
    pub fn list_flows(&self, filter: Option<&FlowFilter>) -> Result<Vec<FlowSummary>> {
        let mut query = SELECT_SUMMARIES_SQL.to_string();
        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        let include_archived = filter.is_some_and(|f| f.include_archived);

        if let Some(f) = filter {
            if let Some(ref name) = f.name_contains {
                conditions.push("f.name LIKE ?");
                params_vec.push(Box::new(format!("%{name}%")));
            }
            if let Some(status) = f.status {
                conditions.push("f.status = ?");
                params_vec.push(Box::new(status.as_str().to_string()));
            }
        }

        if !include_archived && filter.map_or(true, |f| f.status.is_none()) {
            conditions.push("f.status != 'archived'");
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" GROUP BY f.id ORDER BY f.updated_at DESC, f.id DESC");

        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| &**b).collect();

        let summaries = stmt
            .query_map(&params_refs[..], |row| {
                Ok(FlowSummary {
                    id: row.get::<_, i64>(0)? as u64,
                    name: row.get(1)?,
                    status: parse_column::<FlowStatus>(row, 2)?,
                    version: parse_column::<FlowVersion>(row, 3)?,
                    traffic_percentage: row.get::<_, i64>(4)? as u8,
                    parent_id: row.get::<_, Option<i64>>(5)?.map(|id| id as u64),
                    updated_at: parse_column::<Timestamp>(row, 6)?,
                    step_count: row.get::<_, i64>(7)? as u32,
                })
            })
            .db_context("Failed to query flows")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch flows")?;

        Ok(summaries)
    }

    /// Applies a patch to a flow's mutable attributes and returns the result.
    /// Fields absent from the patch keep their current values.
    pub fn update_flow(&mut self, flow_id: u64, patch: &FlowPatch) -> Result<Flow> {
        patch.validate()?;

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let current = Self::select_flow_tx(&tx, flow_id)?;
        if current.status == FlowStatus::Archived {
            return Err(FlowError::Conflict {
                flow_id,
                status: current.status,
            });
        }

        if patch.is_empty() {
            tx.commit().db_context("Failed to commit transaction")?;
            return Ok(current);
        }

        let name = patch.name.clone().unwrap_or(current.name);
        let description = match patch.description.as_deref() {
            Some(text) if text.trim().is_empty() => None,
            Some(text) => Some(text.to_string()),
            None => current.description,
        };
        let traffic = patch
            .traffic_percentage
            .unwrap_or(current.traffic_percentage);
        let now_str = Timestamp::now().to_string();

        tx.execute(
            UPDATE_FLOW_SQL,
            params![&name, &description, traffic as i64, &now_str, flow_id as i64],
        )
        .db_context("Failed to update flow")?;

        let updated = Self::select_flow_tx(&tx, flow_id)?;
        tx.commit().db_context("Failed to commit transaction")?;

        Ok(updated)
    }

    /// Moves a draft or active flow to the terminal archived status.
    pub fn archive_flow(&mut self, flow_id: u64) -> Result<Flow> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let status = Self::flow_status_tx(&tx, flow_id)?;
        if status == FlowStatus::Archived {
            return Err(FlowError::Conflict { flow_id, status });
        }

        let now_str = Timestamp::now().to_string();
        tx.execute(
            UPDATE_FLOW_STATUS_SQL,
            params![FlowStatus::Archived.as_str(), &now_str, flow_id as i64],
        )
        .db_context("Failed to archive flow")?;

        let flow = Self::select_flow_tx(&tx, flow_id)?;
        tx.commit().db_context("Failed to commit transaction")?;

        Ok(flow)
    }

    /// Deletes a flow row; its steps go with it through the cascade.
    pub fn delete_flow(&mut self, flow_id: u64) -> Result<()> {
        let deleted = self
            .connection
            .execute(DELETE_FLOW_SQL, params![flow_id as i64])
            .db_context("Failed to delete flow")?;

        if deleted == 0 {
            return Err(FlowError::FlowNotFound { id: flow_id });
        }
        Ok(())
    }

    /// Version for the next flow deployed from `flow_id`: one past the highest
    /// version among the flow and everything produced from it.
    ///
    /// This read is not part of the transaction that inserts the new flow and
    /// the version column carries no `UNIQUE` constraint. Two sessions
    /// deploying the same lineage at once can therefore receive the same
    /// number; both rows are kept.
    pub fn next_version(&self, flow_id: u64) -> Result<FlowVersion> {
        let max: Option<i64> = self
            .connection
            .query_row(
                SELECT_LINEAGE_MAX_VERSION_SQL,
                params![flow_id as i64],
                |row| row.get(0),
            )
            .db_context("Failed to compute next version")?;

        let max = max.ok_or(FlowError::FlowNotFound { id: flow_id })?;
        Ok(FlowVersion(max as u32).next())
    }

    /// Writes a deployment audit row.
    pub fn record_deployment(&mut self, record: &DeploymentRecord) -> Result<()> {
        self.connection
            .execute(
                INSERT_DEPLOYMENT_SQL,
                params![
                    record.flow_id as i64,
                    record.source_flow_id as i64,
                    record.version.to_string(),
                    record.step_count as i64,
                    record.created_at.to_string()
                ],
            )
            .db_context("Failed to record deployment")?;
        Ok(())
    }

    /// Deployment audit rows for a source draft, oldest first.
    pub fn list_deployments(&self, source_flow_id: u64) -> Result<Vec<DeploymentRecord>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_DEPLOYMENTS_SQL)
            .db_context("Failed to prepare query")?;

        let records = stmt
            .query_map(params![source_flow_id as i64], |row| {
                Ok(DeploymentRecord {
                    flow_id: row.get::<_, i64>(0)? as u64,
                    source_flow_id: row.get::<_, i64>(1)? as u64,
                    version: parse_column::<FlowVersion>(row, 2)?,
                    step_count: row.get::<_, i64>(3)? as u32,
                    created_at: parse_column::<Timestamp>(row, 4)?,
                })
            })
            .db_context("Failed to query deployments")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch deployments")?;

        Ok(records)
    }
}
