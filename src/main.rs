use anyhow::{bail, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use tracing::error;

use edgekit::config::ToolConfig;
use edgekit::context;
use edgekit::flow::{Flow, FlowOutcome};
use edgekit::primitives::default_registry;
use edgekit::prompt::TermPrompter;
use edgekit::tools::{CommandTools, DryRunTools, ToolRunner};

#[derive(Parser)]
#[command(name = "edgekit", version)]
#[command(about = "Set up queue-backed edge worker projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Scaffold a new project even when run inside an existing one
    #[arg(short = 'n', long = "new", conflicts_with = "add")]
    new: bool,

    /// Add a primitive to the existing project in the current directory
    #[arg(short = 'a', long = "add")]
    add: bool,

    /// Path to config file (defaults to ./edgekit.toml or ~/.config/edgekit/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Scaffold on disk but log the external tool invocations instead of running them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the queue primitive directly, skipping the selection menu
    Queues,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests are successes; real parse errors
            // exit 1.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = e.print();
            return code;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ToolConfig::load_with_path(cli.config.clone())?;
    let registry = default_registry(&config);

    let prompter = TermPrompter;
    let tools: Box<dyn ToolRunner> = if cli.dry_run {
        Box::new(DryRunTools)
    } else {
        Box::new(CommandTools::new(config.tools.clone()))
    };
    let flow = Flow::new(&registry, &prompter, tools.as_ref());

    let primitive_id = match cli.command {
        Some(Commands::Queues) => Some("queues"),
        None => None,
    };

    let cwd = Path::new(".");
    let ctx = context::detect(cwd);

    let outcome = if cli.add {
        if !ctx.is_existing_project {
            bail!(
                "No worker configuration found in the current directory \
                 (looked for wrangler.jsonc, wrangler.json, wrangler.toml)"
            );
        }
        flow.run_existing(cwd, &ctx, primitive_id)?
    } else if cli.new || !ctx.is_existing_project {
        flow.run_new(cwd, primitive_id)?
    } else {
        flow.run_existing(cwd, &ctx, primitive_id)?
    };

    if outcome == FlowOutcome::Cancelled {
        println!("Cancelled.");
    }
    Ok(())
}
