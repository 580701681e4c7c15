//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Stack Builder - Generate a container stack from layered .env files
#[derive(Parser, Debug)]
#[command(name = "stack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Environment requested by the calling process
    #[arg(long, env = "STACK_ENV", global = true, hide = true)]
    pub stack_env: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command that resolves configuration
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvArgs {
    /// Target environment (dev, staging, prod or a synonym)
    #[arg(short, long)]
    pub env: Option<String>,

    /// Project name to use when no source sets PROJECT_NAME
    #[arg(long)]
    pub name: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve, validate and generate every stale artifact
    ///
    /// Examples:
    ///   stack build                  # Incremental build for the detected environment
    ///   stack build --env prod       # Build production artifacts
    ///   stack build --force          # Regenerate everything
    Build {
        #[command(flatten)]
        env: EnvArgs,

        /// Regenerate every artifact family
        #[arg(short, long)]
        force: bool,

        /// Fail on route conflicts instead of reassigning routes
        #[arg(long)]
        no_auto_fix: bool,

        /// Output the build summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the detected environment and the configuration cascade
    Env {
        #[command(flatten)]
        env: EnvArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration without building
    ///
    /// Automatic fixes are written to the local .env override.
    Validate {
        #[command(flatten)]
        env: EnvArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the services the configuration describes
    Services {
        #[command(flatten)]
        env: EnvArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List snapshots of the local .env override, or restore one
    ///
    /// Examples:
    ///   stack backups                                # List snapshots
    ///   stack backups --restore 20260102T030405.000Z # Put .env back
    Backups {
        /// Snapshot id to restore
        #[arg(long, value_name = "ID")]
        restore: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
