//! Interactive editing session
//!
//! Reads one command per line from stdin and applies it to a [`FlowEditor`].
//! Edits are autosaved after the configured quiet period; pending changes are
//! saved when the session ends through `quit`, end of input or Ctrl-C.
//!
//! Steps can be referred to by id (`42`, `local-…`) or by their position as
//! printed by `show` (`#2`).

use std::{
    io::{IsTerminal, Write},
    str::FromStr,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use flowsmith_core::{
    ConfigPath, CreateResult, FlowEditor, OperationStatus, StepId, Steps, TemplateCatalog,
    Templates,
};
use log::{debug, info};
use serde_json::Value;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    signal,
};

use crate::{
    cli::{config_value, parse_position},
    renderer::TerminalRenderer,
};

const HELP: &str = "\
## Commands

- `insert TEMPLATE [POSITION]`: add a step from a template
- `remove STEP`: delete a step
- `move STEP POSITION`: move a step
- `dup STEP`: duplicate a step after itself
- `set STEP PATH VALUE`: set a configuration value (JSON or plain text)
- `undo`, `redo`: walk the edit history
- `save`: write changes now
- `deploy`: deploy the flow as a new active version
- `show`: list the steps
- `status`: show the editor state
- `open FLOW`: save and switch to another flow
- `templates`: list step templates
- `quit`: save and leave

STEP is a step id or `#N` for the N-th step.
";

/// A reference to a step typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRef {
    /// A step id as printed by `show`
    Id(StepId),
    /// A 0-based index, typed as `#N` with N starting at 1
    Position(usize),
}

impl StepRef {
    fn resolve(&self, editor: &FlowEditor) -> Result<StepId> {
        match *self {
            StepRef::Id(id) => Ok(id),
            StepRef::Position(index) => editor
                .steps()
                .get(index)
                .map(|step| step.id)
                .ok_or_else(|| anyhow!("No step at position {}", index + 1)),
        }
    }
}

impl FromStr for StepRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('#') {
            Some(position) => parse_position(position).map(StepRef::Position),
            None => s.parse().map(StepRef::Id),
        }
    }
}

/// One line of session input.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Insert {
        template: String,
        at: Option<usize>,
    },
    Remove(StepRef),
    Move {
        step: StepRef,
        index: usize,
    },
    Duplicate(StepRef),
    Set {
        step: StepRef,
        path: ConfigPath,
        value: Value,
    },
    Undo,
    Redo,
    Save,
    Deploy,
    Show,
    Status,
    Open(u64),
    Templates,
    Help,
    Quit,
}

/// Splits off the first whitespace-separated word.
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], input[end..].trim_start()),
        None => (input, ""),
    }
}

fn required<'a>(word: &'a str, what: &str, usage: &str) -> Result<&'a str, String> {
    if word.is_empty() {
        Err(format!("Missing {what}. Usage: {usage}"))
    } else {
        Ok(word)
    }
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = next_word(line.trim());

        let command = match name {
            "insert" | "i" => {
                let usage = "insert TEMPLATE [POSITION]";
                let (template, rest) = next_word(rest);
                let template = required(template, "template", usage)?;
                let (position, _) = next_word(rest);
                let at = if position.is_empty() {
                    None
                } else {
                    Some(parse_position(position)?)
                };
                SessionCommand::Insert {
                    template: template.to_string(),
                    at,
                }
            }
            "remove" | "rm" => {
                let (step, _) = next_word(rest);
                SessionCommand::Remove(required(step, "step", "remove STEP")?.parse()?)
            }
            "move" | "mv" => {
                let usage = "move STEP POSITION";
                let (step, rest) = next_word(rest);
                let (position, _) = next_word(rest);
                SessionCommand::Move {
                    step: required(step, "step", usage)?.parse()?,
                    index: parse_position(required(position, "position", usage)?)?,
                }
            }
            "dup" | "duplicate" => {
                let (step, _) = next_word(rest);
                SessionCommand::Duplicate(required(step, "step", "dup STEP")?.parse()?)
            }
            "set" => {
                let usage = "set STEP PATH VALUE";
                let (step, rest) = next_word(rest);
                let (path, value) = next_word(rest);
                let path = required(path, "path", usage)?
                    .parse::<ConfigPath>()
                    .map_err(|e| e.to_string())?;
                let value = required(value.trim_end(), "value", usage)?;
                SessionCommand::Set {
                    step: required(step, "step", usage)?.parse()?,
                    path,
                    value: config_value(value),
                }
            }
            "undo" | "u" => SessionCommand::Undo,
            "redo" | "r" => SessionCommand::Redo,
            "save" | "w" => SessionCommand::Save,
            "deploy" => SessionCommand::Deploy,
            "show" | "ls" => SessionCommand::Show,
            "status" => SessionCommand::Status,
            "open" => {
                let (flow, _) = next_word(rest);
                let flow = required(flow, "flow id", "open FLOW")?;
                SessionCommand::Open(
                    flow.parse()
                        .map_err(|_| format!("Invalid flow id: {flow}"))?,
                )
            }
            "templates" => SessionCommand::Templates,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            other => return Err(format!("Unknown command '{other}'. Type `help` for commands.")),
        };

        Ok(command)
    }
}

/// An interactive session over one editor.
pub struct Session<'a> {
    editor: FlowEditor,
    catalog: Arc<dyn TemplateCatalog>,
    renderer: &'a TerminalRenderer,
}

impl<'a> Session<'a> {
    pub fn new(
        editor: FlowEditor,
        catalog: Arc<dyn TemplateCatalog>,
        renderer: &'a TerminalRenderer,
    ) -> Self {
        Self {
            editor,
            catalog,
            renderer,
        }
    }

    /// Processes stdin until it closes, `quit` is read or Ctrl-C arrives,
    /// then saves pending edits.
    ///
    /// Command failures are reported and the session continues; only a
    /// failure to read input or to save on exit ends it with an error.
    pub async fn run(&self) -> Result<()> {
        let interactive = std::io::stdin().is_terminal();
        let mut lines = BufReader::new(io::stdin()).lines();

        if let Some(flow_id) = self.editor.flow_id() {
            info!("Editing flow {flow_id}");
            if interactive {
                self.renderer.render(&format!(
                    "Editing flow {flow_id}. Type `help` for commands.\n"
                ))?;
            }
        }

        loop {
            if interactive {
                print!("> ");
                std::io::stdout().flush().context("Failed to write prompt")?;
            }

            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read command")?,
                _ = signal::ctrl_c() => None,
            };
            let Some(line) = line else { break };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match line.parse::<SessionCommand>() {
                Ok(SessionCommand::Quit) => break,
                Ok(command) => command,
                Err(message) => {
                    self.renderer
                        .render(&OperationStatus::failure(message).to_string())?;
                    continue;
                }
            };

            debug!("session command: {:?}", command);
            match self.execute(command).await {
                Ok(output) => self.renderer.render(&output)?,
                Err(e) => self
                    .renderer
                    .render(&OperationStatus::failure(format!("{e:#}")).to_string())?,
            }
        }

        self.finish().await
    }

    async fn execute(&self, command: SessionCommand) -> Result<String> {
        let editor = &self.editor;

        let output = match command {
            SessionCommand::Insert { template, at } => {
                let id = editor.insert_step(&template, at)?;
                let step = editor
                    .step(id)
                    .ok_or_else(|| anyhow!("Step {id} not found after insert"))?;
                CreateResult::new(step).to_string()
            }
            SessionCommand::Remove(step) => {
                let id = step.resolve(editor)?;
                editor.remove_step(id)?;
                OperationStatus::success(format!("Removed step {id}")).to_string()
            }
            SessionCommand::Move { step, index } => {
                let id = step.resolve(editor)?;
                editor.move_step(id, index)?;
                format!(
                    "{}\n{}",
                    OperationStatus::success(format!("Moved step {id}")),
                    Steps(editor.steps())
                )
            }
            SessionCommand::Duplicate(step) => {
                let id = step.resolve(editor)?;
                let copy_id = editor.duplicate_step(id)?;
                let copy = editor
                    .step(copy_id)
                    .ok_or_else(|| anyhow!("Step {copy_id} not found after duplicate"))?;
                format!(
                    "{}\n{copy}",
                    OperationStatus::success(format!("Duplicated step {id} as step {copy_id}"))
                )
            }
            SessionCommand::Set { step, path, value } => {
                let id = step.resolve(editor)?;
                editor.set_step_config(id, &path, value)?;
                let updated = editor
                    .step(id)
                    .ok_or_else(|| anyhow!("Step {id} not found after update"))?;
                format!(
                    "{}\n{updated}",
                    OperationStatus::success(format!("Set {path} on step {id}"))
                )
            }
            SessionCommand::Undo => {
                if editor.undo() {
                    OperationStatus::success("Undid last edit").to_string()
                } else {
                    OperationStatus::failure("Nothing to undo").to_string()
                }
            }
            SessionCommand::Redo => {
                if editor.redo() {
                    OperationStatus::success("Redid last edit").to_string()
                } else {
                    OperationStatus::failure("Nothing to redo").to_string()
                }
            }
            SessionCommand::Save => {
                let report = editor.save().await.context("Failed to save flow")?;
                OperationStatus::success(format!(
                    "Saved {} steps to flow {}",
                    report.step_count, report.flow_id
                ))
                .to_string()
            }
            SessionCommand::Deploy => {
                let deployment = editor.deploy().await.context("Failed to deploy flow")?;
                deployment.to_string()
            }
            SessionCommand::Show => match editor.flow_id() {
                Some(flow_id) => format!("# Flow {flow_id}\n\n{}", Steps(editor.steps())),
                None => OperationStatus::failure("No flow is open").to_string(),
            },
            SessionCommand::Status => editor.status().to_string(),
            SessionCommand::Open(flow_id) => {
                editor
                    .switch_flow(flow_id)
                    .await
                    .with_context(|| format!("Failed to open flow {flow_id}"))?;
                format!(
                    "{}\n{}",
                    OperationStatus::success(format!("Now editing flow {flow_id}")),
                    Steps(editor.steps())
                )
            }
            SessionCommand::Templates => Templates(self.catalog.templates()).to_string(),
            SessionCommand::Help => HELP.to_string(),
            SessionCommand::Quit => String::new(),
        };

        Ok(output)
    }

    async fn finish(&self) -> Result<()> {
        if !self.editor.is_dirty() {
            return Ok(());
        }

        let report = self
            .editor
            .save()
            .await
            .context("Failed to save pending changes")?;
        self.renderer.render(
            &OperationStatus::success(format!(
                "Saved {} steps to flow {}",
                report.step_count, report.flow_id
            ))
            .to_string(),
        )
    }
}
