use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};

use pipewright::config::Settings;
use pipewright::pipeline::{
    create_pipeline, ensure_pipeline, EnsureOutcome, NotificationRequest, PipelineRequest,
};

/// Generate and maintain Drone CI pipeline configurations
#[derive(Parser)]
#[command(name = "pipewright")]
#[command(about = "Generate and maintain Drone CI pipeline configurations", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh configuration, overwriting any existing one
    Generate(PipelineArgs),
    /// Validate an existing configuration and update it in place, or
    /// regenerate it when it deviates from the preparation baseline
    Ensure(PipelineArgs),
}

#[derive(Args)]
struct PipelineArgs {
    /// Directory containing the repository checkout
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Workflow engine ("snakemake"), anything else treats the supplied
    /// commands as literal shell commands
    #[arg(short, long, default_value = "snakemake")]
    workflow: String,

    /// User-supplied workflow command (repeatable)
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Input file to retrieve before the workflow runs (repeatable)
    #[arg(short, long = "input")]
    inputs: Vec<String>,

    /// Output file to publish after the workflow runs (repeatable)
    #[arg(short, long = "output")]
    outputs: Vec<String>,

    /// Notification provider to enable, e.g. "Slack" (repeatable)
    #[arg(short, long = "notify")]
    notifications: Vec<String>,

    /// Path to a settings override file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl PipelineArgs {
    fn resolve(&self) -> anyhow::Result<(Settings, PipelineRequest)> {
        let settings = Settings::load(self.config.as_deref())?;
        let request = PipelineRequest {
            workflow: self.workflow.clone(),
            user_commands: self.commands.clone(),
            input_files: self.inputs.clone(),
            output_files: self.outputs.clone(),
            notifications: self
                .notifications
                .iter()
                .map(|name| NotificationRequest::enabled(name.as_str()))
                .collect(),
        };
        Ok((settings, request))
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("pipewright started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli) {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => {
            let (settings, request) = args.resolve()?;
            create_pipeline(&args.path, &settings, &request)?;
            println!("Configuration written to {}", args.path.display());
        }
        Commands::Ensure(args) => {
            let (settings, request) = args.resolve()?;
            match ensure_pipeline(&args.path, &settings, &request)? {
                EnsureOutcome::Updated => {
                    println!("Existing configuration updated in place");
                }
                EnsureOutcome::Regenerated => {
                    println!("Configuration regenerated from scratch");
                }
            }
        }
    }

    Ok(())
}
