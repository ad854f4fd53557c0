//! CLI command implementations

use std::io;
use std::path::Path;

use clap::CommandFactory;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, EditingSession, IoResultExt};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{normalize_brief, to_brief, validate, validate_framework, EaogTree};
use crate::infrastructure::di::ServiceContainer;

/// Execute the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| {
            CliError::Usage(format!("cannot determine current directory: {e}"))
        })?,
    };

    match &cli.command {
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        Some(Commands::Config { command }) => cmd_config(command, &project_dir),
        Some(command) => {
            let settings = Settings::load(Some(&project_dir))?;
            let container = ServiceContainer::new(settings);
            dispatch(&container, command)
        }
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| CliError::Usage(e.to_string()))?;
            Ok(())
        }
    }
}

fn dispatch(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    match command {
        Commands::Validate { file, framework } => cmd_validate(container, file, *framework),
        Commands::Normalize { file } => cmd_normalize(container, file),
        Commands::Brief { file } => cmd_brief(container, file),
        Commands::Tree { file } => cmd_tree(container, file),
        Commands::Import { file, id } => cmd_import(container, file, id.as_deref()),
        Commands::Export { id, output } => cmd_export(container, id, output.as_deref()),
        Commands::Apply {
            id,
            framework,
            path,
        } => cmd_apply(container, id, framework, path),
        Commands::Frameworks => cmd_frameworks(container),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not need loaded settings".to_string(),
        )),
    }
}

fn read_json(container: &ServiceContainer, file: &Path) -> CliResult<Value> {
    let content = container
        .fs
        .read_to_string(file)
        .with_path_context("read", file)?;
    let value = serde_json::from_str(&content).map_err(|e| ApplicationError::OperationFailed {
        context: format!("parse {}", file.display()),
        source: Box::new(e),
    })?;
    Ok(value)
}

fn to_pretty(value: &Value) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "serialize JSON".to_string(),
            source: Box::new(e),
        }
        .into()
    })
}

/// Read a document, normalizing brief form when enabled.
fn load_tree(container: &ServiceContainer, file: &Path) -> CliResult<EaogTree> {
    let value = read_json(container, file)?;
    let tree = EaogTree::import(&value, container.settings.accept_brief)
        .map_err(ApplicationError::from)?;
    Ok(tree)
}

#[instrument(skip(container))]
fn cmd_validate(container: &ServiceContainer, file: &Path, framework: bool) -> CliResult<()> {
    let mut value = read_json(container, file)?;
    if container.settings.accept_brief {
        value = normalize_brief(value);
    }
    let result = if framework {
        validate_framework(&value)
    } else {
        validate(&value)
    };

    match result {
        Ok(record) => {
            output::success(&format!("{} is valid ({})", file.display(), record.data.name));
            Ok(())
        }
        Err(errors) => {
            output::header(&format!("{} is invalid", file.display()));
            for error in errors.errors() {
                output::failure(error);
            }
            Err(ApplicationError::Validation(errors).into())
        }
    }
}

#[instrument(skip(container))]
fn cmd_normalize(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let value = read_json(container, file)?;
    let tree = EaogTree::import(&value, true).map_err(ApplicationError::from)?;
    output::info(&to_pretty(&tree.to_value())?);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_brief(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let tree = load_tree(container, file)?;
    output::info(&to_pretty(&to_brief(&tree.to_value()))?);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let tree = load_tree(container, file)?;
    output::info(&output::tree_view(&tree));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_import(container: &ServiceContainer, file: &Path, id: Option<&str>) -> CliResult<()> {
    let tree = load_tree(container, file)?;
    let session = match id {
        Some(id) => EditingSession::with_tree(container.store.clone(), id.to_string(), tree),
        None => container.new_session(tree),
    };
    session.save()?;
    output::action("Imported", &session.file_id());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_export(container: &ServiceContainer, id: &str, target: Option<&Path>) -> CliResult<()> {
    let session = container.open_session(id)?;
    let json = to_pretty(&session.tree().to_value())?;
    match target {
        Some(path) => {
            container
                .fs
                .ensure_parent(path)
                .with_path_context("create parent of", path)?;
            container
                .fs
                .write(path, &json)
                .with_path_context("write", path)?;
            output::action("Exported", &path.display());
        }
        None => output::info(&json),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_apply(container: &ServiceContainer, id: &str, framework: &str, path: &str) -> CliResult<()> {
    let catalog = container.framework_catalog()?;
    let framework = catalog.require(framework)?;
    let mut session = container.open_session(id)?;

    let root = session.apply_framework(framework, path)?;
    session.save()?;

    let new_path = session.tree().path(root).unwrap_or_default();
    debug!("cmd_apply: framework root at {}", new_path);
    output::action("Applied", &format!("{} at {}", framework.name(), new_path));
    output::info(&output::tree_view(session.tree()));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_frameworks(container: &ServiceContainer) -> CliResult<()> {
    let catalog = container.framework_catalog()?;
    if catalog.is_empty() {
        output::info(&format!(
            "No frameworks in {}",
            container.settings.frameworks_dir().display()
        ));
    }
    for framework in catalog.frameworks() {
        output::header(framework.name());
        if let Some(description) = framework.description() {
            output::detail(description);
        }
        output::detail(&format!(
            "mount points: {}",
            framework.mount_point_names().join(", ")
        ));
    }
    for rejected in catalog.rejected() {
        output::warning(&format!("{}: {}", rejected.source, rejected.reason));
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action("local", &local_config_path(project_dir).display());
        }
    }
    Ok(())
}

fn cmd_completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
