//! Version and deployment engine.
//!
//! Deploying promotes a draft into a new, frozen flow:
//!
//! ```text
//! Draft v3 ──deploy──▶ Active v4 (new row, copied steps)
//!    │
//!    └── unchanged, still editable
//! ```
//!
//! The new flow row and its steps are written by two separate gateway calls.
//! If the step copy fails, the freshly inserted flow is deleted again so no
//! active flow ever exists with missing steps. Sibling active flows are left
//! alone; several may run side by side as traffic-split variants.

use jiff::Timestamp;

use crate::{
    error::{FlowError, Result},
    gateway::FlowGateway,
    models::{Deployment, DeploymentRecord, Flow, FlowStatus, NewFlow, Step},
};

/// Deploys draft `flow_id` as a new active flow version.
///
/// # Errors
///
/// `FlowNotFound` if the source is missing, `Conflict` if it is not a draft,
/// and any gateway error from creating the new version. On a failed step copy
/// the new flow row has already been removed when the error is returned.
pub async fn deploy<G>(gateway: &G, flow_id: u64) -> Result<Deployment>
where
    G: FlowGateway + ?Sized,
{
    let source = load_source(gateway, flow_id).await?;
    if source.status != FlowStatus::Draft {
        return Err(FlowError::Conflict {
            flow_id,
            status: source.status,
        });
    }

    let version = gateway.next_version(flow_id).await?;
    let new = NewFlow {
        name: source.name.clone(),
        description: source.description.clone(),
        status: FlowStatus::Active,
        version,
        traffic_percentage: source.traffic_percentage,
        parent_id: Some(source.id),
    };

    let flow = create_with_steps(gateway, new, source.steps).await?;

    let record = DeploymentRecord {
        flow_id: flow.id,
        source_flow_id: flow_id,
        version: flow.version,
        step_count: flow.steps.len() as u32,
        created_at: Timestamp::now(),
    };
    if let Err(e) = gateway.record_deployment(record).await {
        log::warn!("Failed to record deployment of flow {}: {e}", flow.id);
    }

    log::info!(
        "Deployed flow {flow_id} as flow {} (version {}, {} steps)",
        flow.id,
        flow.version,
        flow.steps.len()
    );

    Ok(Deployment {
        flow,
        source_flow_id: flow_id,
    })
}

/// Creates a new draft copying the steps of `flow_id`, so editing can resume
/// from an active or archived version. The draft keeps the source's version
/// number; its next deploy moves past it.
pub async fn branch<G>(gateway: &G, flow_id: u64) -> Result<Flow>
where
    G: FlowGateway + ?Sized,
{
    let source = load_source(gateway, flow_id).await?;

    let new = NewFlow {
        name: source.name.clone(),
        description: source.description.clone(),
        status: FlowStatus::Draft,
        version: source.version,
        traffic_percentage: source.traffic_percentage,
        parent_id: Some(source.id),
    };

    let flow = create_with_steps(gateway, new, source.steps).await?;
    log::info!("Branched flow {flow_id} into draft {}", flow.id);
    Ok(flow)
}

async fn load_source<G>(gateway: &G, flow_id: u64) -> Result<Flow>
where
    G: FlowGateway + ?Sized,
{
    gateway
        .get_flow(flow_id)
        .await?
        .ok_or(FlowError::FlowNotFound { id: flow_id })
}

/// Inserts the flow row, then its step copies; undoes the row if the copy
/// fails and returns the copy error.
async fn create_with_steps<G>(gateway: &G, new: NewFlow, steps: Vec<Step>) -> Result<Flow>
where
    G: FlowGateway + ?Sized,
{
    let mut flow = gateway.insert_flow(new).await?;

    match gateway.copy_steps(flow.id, steps).await {
        Ok(copies) => {
            flow.steps = copies;
            Ok(flow)
        }
        Err(copy_err) => {
            if let Err(cleanup_err) = gateway.delete_flow(flow.id).await {
                log::error!(
                    "Failed to remove partially created flow {}: {cleanup_err}",
                    flow.id
                );
            }
            Err(copy_err)
        }
    }
}
