//! Command-line argument types and their handlers
//!
//! Argument structs carry clap derives and convert into the interface-neutral
//! parameter types of `flowsmith_core::params`:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Store / Editor
//! ```
//!
//! Step commands open a short-lived [`FlowEditor`] with autosave disabled,
//! apply one edit and save explicitly, so a single invocation goes through
//! the same validation and id reconciliation as an interactive session.
//!
//! Positions on the command line are 1-based, matching the numbering printed
//! by `flow show`.

use std::{convert::Infallible, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use flowsmith_core::{
    deploy::{branch, deploy},
    params::*,
    ArchiveResult, ConfigPath, CreateResult, DeploymentHistory, EditorBuilder, FlowEditor,
    FlowFilter, FlowGateway, FlowPatch, FlowStatus, FlowStore, FlowSummaries, OperationStatus,
    Step, StepId, Steps, TemplateCatalog, Templates, UpdateResult,
};
use log::debug;
use serde_json::Value;

use crate::{renderer::TerminalRenderer, session::Session};

/// Parses a 1-based position into a 0-based index.
pub fn parse_position(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("positions start at 1".to_string()),
        Ok(position) => Ok(position - 1),
        Err(_) => Err(format!("invalid position '{raw}'")),
    }
}

/// Reads a configuration value as JSON, taking anything that is not valid
/// JSON as a plain string.
pub fn config_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_config_value(raw: &str) -> Result<Value, Infallible> {
    Ok(config_value(raw))
}

/// Create a new draft flow
#[derive(Args)]
pub struct CreateFlowArgs {
    /// Name of the flow
    pub name: String,
    #[arg(short, long, help = "Optional description of what the flow is for")]
    pub description: Option<String>,
    #[arg(long, help = "Share of traffic (0-100) once deployed, defaults to 100")]
    pub traffic: Option<u8>,
}

impl From<CreateFlowArgs> for CreateFlow {
    fn from(val: CreateFlowArgs) -> Self {
        CreateFlow {
            name: val.name,
            description: val.description,
            traffic_percentage: val.traffic,
        }
    }
}

/// List flows
///
/// Archived flows are hidden unless `--archived` is given or `--status
/// archived` asks for them explicitly.
#[derive(Args)]
pub struct ListFlowsArgs {
    #[arg(short, long, help = "Only show flows with this status")]
    pub status: Option<FlowStatusArg>,
    #[arg(short, long, help = "Only show flows whose name contains this text")]
    pub name: Option<String>,
    #[arg(long, help = "Include archived flows")]
    pub archived: bool,
}

impl From<ListFlowsArgs> for ListFlows {
    fn from(val: ListFlowsArgs) -> Self {
        ListFlows {
            status: val.status.map(Into::into),
            name: val.name,
            archived: val.archived,
        }
    }
}

/// Arguments for commands that act on one flow
#[derive(Args)]
pub struct FlowIdArgs {
    #[arg(help = "Unique identifier of the flow")]
    pub id: u64,
}

impl From<FlowIdArgs> for Id {
    fn from(val: FlowIdArgs) -> Self {
        Id { id: val.id }
    }
}

/// Update a draft flow's attributes
#[derive(Args)]
pub struct UpdateFlowArgs {
    #[arg(help = "Unique identifier of the flow to update")]
    pub id: u64,
    #[arg(short, long, help = "New name for the flow")]
    pub name: Option<String>,
    #[arg(short, long, help = "New description for the flow, empty to remove it")]
    pub description: Option<String>,
    #[arg(long, help = "New share of traffic (0-100)")]
    pub traffic: Option<u8>,
}

impl From<UpdateFlowArgs> for UpdateFlow {
    fn from(val: UpdateFlowArgs) -> Self {
        UpdateFlow {
            id: val.id,
            name: val.name,
            description: val.description,
            traffic_percentage: val.traffic,
        }
    }
}

#[derive(Subcommand)]
pub enum FlowCommands {
    /// Create a new draft flow
    #[command(alias = "c")]
    Create(CreateFlowArgs),
    /// List flows
    #[command(aliases = ["l", "ls"])]
    List(ListFlowsArgs),
    /// Show a flow with its steps
    #[command(alias = "s")]
    Show(FlowIdArgs),
    /// Update a draft flow's name, description or traffic share
    #[command(alias = "u")]
    Update(UpdateFlowArgs),
    /// Archive a flow
    #[command(alias = "a")]
    Archive(FlowIdArgs),
    /// Deploy a draft as a new active version
    #[command(alias = "d")]
    Deploy(FlowIdArgs),
    /// Create an editable draft from any flow version
    #[command(alias = "b")]
    Branch(FlowIdArgs),
    /// List the versions deployed from a draft
    #[command(alias = "h")]
    History(FlowIdArgs),
}

/// Insert a step created from a template
#[derive(Args)]
pub struct InsertStepArgs {
    #[arg(help = "Unique identifier of the draft flow")]
    pub flow_id: u64,
    #[arg(help = "Template to create the step from (see `flowsmith templates`)")]
    pub template: String,
    #[arg(
        long,
        value_parser = parse_position,
        help = "1-based position for the new step, defaults to the end"
    )]
    pub at: Option<usize>,
}

/// Arguments for commands that act on one step of a flow
#[derive(Args)]
pub struct StepRefArgs {
    #[arg(help = "Unique identifier of the draft flow")]
    pub flow_id: u64,
    #[arg(help = "Identifier of the step")]
    pub step: StepId,
}

/// Move a step to another position
#[derive(Args)]
pub struct MoveStepArgs {
    #[arg(help = "Unique identifier of the draft flow")]
    pub flow_id: u64,
    #[arg(help = "Identifier of the step to move")]
    pub step: StepId,
    #[arg(
        value_parser = parse_position,
        help = "1-based target position; larger values move the step to the end"
    )]
    pub position: usize,
}

/// Set one value inside a step's configuration
#[derive(Args)]
pub struct SetStepArgs {
    #[arg(help = "Unique identifier of the draft flow")]
    pub flow_id: u64,
    #[arg(help = "Identifier of the step to configure")]
    pub step: StepId,
    #[arg(help = "Dotted path into the configuration, e.g. questionScreen.options.0")]
    pub path: ConfigPath,
    #[arg(
        value_parser = parse_config_value,
        help = "JSON value to store; text that is not JSON is stored as a string"
    )]
    pub value: Value,
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Insert a step created from a template
    #[command(alias = "i")]
    Insert(InsertStepArgs),
    /// Remove a step
    #[command(aliases = ["r", "rm"])]
    Remove(StepRefArgs),
    /// Move a step to another position
    #[command(alias = "m")]
    Move(MoveStepArgs),
    /// Duplicate a step right after itself
    #[command(alias = "dup")]
    Duplicate(StepRefArgs),
    /// Set one value inside a step's configuration
    Set(SetStepArgs),
}

/// Open an interactive editing session
#[derive(Args)]
pub struct EditArgs {
    #[arg(help = "Unique identifier of the flow to edit")]
    pub flow_id: u64,
}

/// Command-line representation of flow status values
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FlowStatusArg {
    /// Editable drafts
    Draft,
    /// Deployed versions
    Active,
    /// Retired flows
    Archived,
}

impl From<FlowStatusArg> for FlowStatus {
    fn from(val: FlowStatusArg) -> Self {
        match val {
            FlowStatusArg::Draft => FlowStatus::Draft,
            FlowStatusArg::Active => FlowStatus::Active,
            FlowStatusArg::Archived => FlowStatus::Archived,
        }
    }
}

/// Runs parsed commands against the store and prints their results.
pub struct Cli {
    store: Arc<FlowStore>,
    catalog: Arc<dyn TemplateCatalog>,
    renderer: TerminalRenderer,
    debounce: Option<Duration>,
}

impl Cli {
    pub fn new(
        store: FlowStore,
        catalog: Arc<dyn TemplateCatalog>,
        renderer: TerminalRenderer,
        debounce: Option<Duration>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            catalog,
            renderer,
            debounce,
        }
    }

    pub async fn handle_flow_command(&self, command: FlowCommands) -> Result<()> {
        match command {
            FlowCommands::Create(args) => self.create_flow(args.into()).await,
            FlowCommands::List(args) => self.list_flows(&args.into()).await,
            FlowCommands::Show(args) => self.show_flow(args.into()).await,
            FlowCommands::Update(args) => self.update_flow(args.into()).await,
            FlowCommands::Archive(args) => self.archive_flow(args.into()).await,
            FlowCommands::Deploy(args) => self.deploy_flow(args.into()).await,
            FlowCommands::Branch(args) => self.branch_flow(args.into()).await,
            FlowCommands::History(args) => self.deployment_history(args.into()).await,
        }
    }

    pub async fn handle_step_command(&self, command: StepCommands) -> Result<()> {
        match command {
            StepCommands::Insert(args) => self.insert_step(args).await,
            StepCommands::Remove(args) => self.remove_step(args).await,
            StepCommands::Move(args) => self.move_step(args).await,
            StepCommands::Duplicate(args) => self.duplicate_step(args).await,
            StepCommands::Set(args) => self.set_step(args).await,
        }
    }

    pub async fn list_flows(&self, params: &ListFlows) -> Result<()> {
        debug!("list_flows: {:?}", params);

        let summaries = self
            .store
            .list_flows(FlowFilter::from(params))
            .await
            .context("Failed to list flows")?;

        self.renderer.render(&FlowSummaries(summaries).to_string())
    }

    pub fn list_templates(&self) -> Result<()> {
        self.renderer
            .render(&Templates(self.catalog.templates()).to_string())
    }

    /// Runs an interactive session over `flow_id` until stdin closes or
    /// `quit` is read.
    pub async fn edit(&self, args: EditArgs) -> Result<()> {
        let editor = self.open_editor(args.flow_id, self.debounce).await?;
        Session::new(editor, self.catalog.clone(), &self.renderer)
            .run()
            .await
    }

    async fn create_flow(&self, params: CreateFlow) -> Result<()> {
        debug!("create_flow: {:?}", params);

        let flow = self
            .store
            .create_flow(params)
            .await
            .context("Failed to create flow")?;

        self.renderer.render(&CreateResult::new(flow).to_string())
    }

    async fn show_flow(&self, params: Id) -> Result<()> {
        let flow = self
            .store
            .get_flow(params.id)
            .await
            .context("Failed to get flow")?
            .ok_or_else(|| anyhow!("Flow with ID {} not found", params.id))?;

        let mut output = flow.to_string();
        if flow.status == FlowStatus::Draft {
            let history = self
                .store
                .deployments(flow.id)
                .await
                .context("Failed to load deployment history")?;
            if !history.is_empty() {
                output.push('\n');
                output.push_str(&DeploymentHistory(history).to_string());
            }
        }

        self.renderer.render(&output)
    }

    async fn update_flow(&self, params: UpdateFlow) -> Result<()> {
        debug!("update_flow: {:?}", params);

        let id = params.id;
        let mut changes = Vec::new();
        if let Some(name) = &params.name {
            changes.push(format!("Name: {name}"));
        }
        if let Some(description) = &params.description {
            if description.trim().is_empty() {
                changes.push("Description: removed".to_string());
            } else {
                changes.push(format!("Description: {description}"));
            }
        }
        if let Some(traffic) = params.traffic_percentage {
            changes.push(format!("Traffic: {traffic}%"));
        }

        let patch = FlowPatch::try_from(params).context("Invalid flow update")?;
        if patch.is_empty() {
            bail!("Nothing to update for flow {id}");
        }

        let flow = self
            .store
            .update_flow(id, patch)
            .await
            .context("Failed to update flow")?;

        self.renderer
            .render(&UpdateResult::with_changes(flow, changes).to_string())
    }

    async fn archive_flow(&self, params: Id) -> Result<()> {
        let flow = self
            .store
            .archive_flow(params.id)
            .await
            .context("Failed to archive flow")?;

        self.renderer.render(&ArchiveResult(flow).to_string())
    }

    async fn deploy_flow(&self, params: Id) -> Result<()> {
        let deployment = deploy(self.store.as_ref(), params.id)
            .await
            .context("Failed to deploy flow")?;

        self.renderer
            .render(&format!("{deployment}\n{}", deployment.flow))
    }

    async fn branch_flow(&self, params: Id) -> Result<()> {
        let flow = branch(self.store.as_ref(), params.id)
            .await
            .context("Failed to branch flow")?;

        self.renderer.render(&CreateResult::new(flow).to_string())
    }

    async fn deployment_history(&self, params: Id) -> Result<()> {
        let history = self
            .store
            .deployments(params.id)
            .await
            .context("Failed to load deployment history")?;

        self.renderer.render(&DeploymentHistory(history).to_string())
    }

    async fn insert_step(&self, args: InsertStepArgs) -> Result<()> {
        let editor = self.open_editor(args.flow_id, None).await?;
        let id = editor.insert_step(&args.template, args.at)?;

        let saved = saved_step(&editor, id).await?;
        self.renderer.render(&CreateResult::new(saved).to_string())
    }

    async fn remove_step(&self, args: StepRefArgs) -> Result<()> {
        let editor = self.open_editor(args.flow_id, None).await?;
        editor.remove_step(args.step)?;
        editor.save().await.context("Failed to save flow")?;

        let status = OperationStatus::success(format!(
            "Removed step {} from flow {}",
            args.step, args.flow_id
        ));
        self.renderer
            .render(&format!("{status}\n{}", Steps(editor.steps())))
    }

    async fn move_step(&self, args: MoveStepArgs) -> Result<()> {
        let editor = self.open_editor(args.flow_id, None).await?;
        editor.move_step(args.step, args.position)?;
        editor.save().await.context("Failed to save flow")?;

        let status = OperationStatus::success(format!("Moved step {}", args.step));
        self.renderer
            .render(&format!("{status}\n{}", Steps(editor.steps())))
    }

    async fn duplicate_step(&self, args: StepRefArgs) -> Result<()> {
        let editor = self.open_editor(args.flow_id, None).await?;
        let id = editor.duplicate_step(args.step)?;

        let saved = saved_step(&editor, id).await?;
        let status = OperationStatus::success(format!(
            "Duplicated step {} as step {}",
            args.step, saved.id
        ));
        self.renderer.render(&format!("{status}\n{saved}"))
    }

    async fn set_step(&self, args: SetStepArgs) -> Result<()> {
        let editor = self.open_editor(args.flow_id, None).await?;
        editor.set_step_config(args.step, &args.path, args.value)?;

        let saved = saved_step(&editor, args.step).await?;
        let status = OperationStatus::success(format!("Set {} on step {}", args.path, saved.id));
        self.renderer.render(&format!("{status}\n{saved}"))
    }

    async fn open_editor(&self, flow_id: u64, debounce: Option<Duration>) -> Result<FlowEditor> {
        EditorBuilder::new(self.store.clone())
            .with_catalog(self.catalog.clone())
            .with_debounce(debounce)
            .open(flow_id)
            .await
            .with_context(|| format!("Failed to open flow {flow_id}"))
    }
}

/// Saves the editor and returns the step that was at `id`'s position, which
/// carries its stored id once the save has reconciled local ids.
async fn saved_step(editor: &FlowEditor, id: StepId) -> Result<Step> {
    let position = editor
        .steps()
        .iter()
        .position(|step| step.id == id)
        .ok_or_else(|| anyhow!("Step {id} disappeared before saving"))?;

    editor.save().await.context("Failed to save flow")?;

    editor
        .steps()
        .get(position)
        .cloned()
        .ok_or_else(|| anyhow!("Step {id} disappeared while saving"))
}
