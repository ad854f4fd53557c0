//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Editable EAOG process graphs: validate, normalize, inspect and decorate with frameworks
#[derive(Parser, Debug)]
#[command(name = "eaog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Project directory for local config (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate an EAOG document
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Validate as framework definition
        #[arg(long)]
        framework: bool,
    },

    /// Convert brief form to canonical JSON
    Normalize {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Convert canonical JSON to brief form
    Brief {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show the node hierarchy
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Store a document in the project
    Import {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Document id (default: new uuid)
        #[arg(long)]
        id: Option<String>,
    },

    /// Print a stored document as canonical JSON
    Export {
        /// Document id
        id: String,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Decorate a node of a stored document with a framework
    Apply {
        /// Document id
        id: String,
        /// Framework name
        #[arg(short, long)]
        framework: String,
        /// Slash-delimited path of the node to decorate
        #[arg(short, long)]
        path: String,
    },

    /// List available frameworks
    Frameworks,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
