//! Stack Builder CLI
//!
//! Turns a project's layered `.env` files into a validated configuration
//! and the artifacts of a container stack.

mod cli;
mod commands;
mod error;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let Some(command) = cli.command else {
        println!("{} Stack Builder CLI", "stack".green().bold());
        println!();
        println!("Run {} for available commands.", "stack --help".cyan());
        return Ok(0);
    };

    let root = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    execute_command(command, root, cli.stack_env.as_deref(), cli.verbose)
}

fn execute_command(
    cmd: Commands,
    root: PathBuf,
    process_env: Option<&str>,
    verbose: bool,
) -> Result<i32> {
    if !root.is_dir() {
        return Err(error::CliError::user(format!(
            "Project directory {} does not exist",
            root.display()
        )));
    }
    tracing::debug!(root = %root.display(), process_env, "Dispatching command");

    match cmd {
        Commands::Build {
            env,
            force,
            no_auto_fix,
            json,
        } => {
            let mut request = commands::request(&root, &env, process_env);
            request.force = force;
            request.verbose = verbose;
            if no_auto_fix {
                request.auto_fix = Some(false);
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(commands::run_build(&request, json))
        }
        Commands::Env { env, json } => {
            commands::run_env(&commands::request(&root, &env, process_env), json)?;
            Ok(0)
        }
        Commands::Validate { env, json } => {
            commands::run_validate(&commands::request(&root, &env, process_env), json)
        }
        Commands::Services { env, json } => {
            commands::run_services(&commands::request(&root, &env, process_env), json)?;
            Ok(0)
        }
        Commands::Backups { restore, json } => {
            commands::run_backups(&root, restore.as_deref(), json)?;
            Ok(0)
        }
    }
}
