//! CLI command definitions for devloop.
//!
//! Provides commands for running a development session against a request
//! and for listing the built-in sample requests.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::config::LoopConfig;
use crate::llm::{ChatClient, RoleRouter};
use crate::prompts::sample_requests;
use crate::sandbox::DockerSandboxExecutor;
use crate::session::{DevelopmentSession, OutputOptions, SessionStatus};

/// Iterative code development loop driven by LLM agents.
#[derive(Parser)]
#[command(name = "devloop")]
#[command(about = "Generate, sandbox-execute, and review code until it passes")]
#[command(version)]
#[command(
    long_about = "devloop drives a natural-language request through an iterative \
loop: an LLM coder writes code, a Docker sandbox runs it, an LLM reviewer \
critiques it, and the loop repeats until approval or the iteration budget \
runs out.\n\nExample usage:\n  devloop run --request \"Write a script that \
prints the first 20 primes\" --max-iterations 5"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run a development session for a request.
    Run(RunArgs),

    /// List the built-in sample requests.
    Samples,
}

/// Arguments for `devloop run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// The natural-language request to develop.
    #[arg(short, long, conflicts_with = "sample")]
    pub request: Option<String>,

    /// Run one of the built-in sample requests by index (see `samples`).
    #[arg(short, long)]
    pub sample: Option<usize>,

    /// Generation budget for the session. Falls back to the configured
    /// default (DEVLOOP_ITERATION_LIMIT, or 5) when omitted.
    #[arg(short = 'n', long)]
    pub max_iterations: Option<u32>,

    /// Directory the final code is written into.
    #[arg(short, long, default_value = "./devloop-output")]
    pub output: String,

    /// Filename for the final code artifact.
    #[arg(long, default_value = "output.py")]
    pub output_file: String,

    /// Also write a JSON metadata record next to the final code.
    #[arg(long)]
    pub metadata: bool,

    /// Docker image the sandbox runs code in.
    #[arg(long)]
    pub image: Option<String>,

    /// Model for the coder role (overrides DEVLOOP_CODER_MODEL).
    #[arg(long)]
    pub coder_model: Option<String>,

    /// Model for the reviewer role (overrides DEVLOOP_REVIEWER_MODEL).
    #[arg(long)]
    pub reviewer_model: Option<String>,

    /// API key (can also be set via DEVLOOP_API_KEY env var).
    #[arg(long, env = "DEVLOOP_API_KEY")]
    pub api_key: Option<String>,
}

/// Parse CLI arguments without running any command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_session_command(args).await,
        Commands::Samples => {
            for (i, request) in sample_requests().iter().enumerate() {
                println!("{i}: {request}");
            }
            Ok(())
        }
    }
}

async fn run_session_command(args: RunArgs) -> anyhow::Result<()> {
    let request = resolve_request(&args)?;

    let mut config = LoopConfig::from_env()?;
    if let Some(key) = args.api_key {
        config = config.with_api_key(key);
    }
    if let Some(image) = args.image {
        config = config.with_sandbox_image(image);
    }
    if let Some(model) = args.coder_model {
        config = config.with_coder_model(model);
    }
    if let Some(model) = args.reviewer_model {
        config = config.with_reviewer_model(model);
    }

    let client = ChatClient::new(&config.api_base, config.api_key.clone());
    let router = RoleRouter::from_config(Arc::new(client), &config);
    let executor = DockerSandboxExecutor::from_config(&config)?;

    let mut output = OutputOptions::new(&args.output).with_filename(&args.output_file);
    if args.metadata {
        output = output.with_metadata();
    }

    let session = DevelopmentSession::new(Arc::new(router), Arc::new(executor))
        .with_output(output);

    let iteration_limit = effective_iteration_limit(args.max_iterations, &config);
    info!(%request, iteration_limit, "Starting development session");
    let state = session.develop(&request, iteration_limit).await;

    println!("Status:     {}", state.status);
    println!("Iterations: {}/{}", state.iteration_count, state.iteration_limit);
    if let Some(execution) = &state.execution {
        println!("Exit:       {}", execution.exit_status);
    }
    if let Some(review) = &state.review {
        println!("Review:\n{}", review.feedback());
    }
    if !state.errors.is_empty() {
        println!("Errors encountered:");
        for error in &state.errors {
            println!("  - {error}");
        }
    }
    println!("\nFinal code:\n{}", state.code);

    if state.status == SessionStatus::Failed {
        anyhow::bail!("development session failed");
    }
    Ok(())
}

fn effective_iteration_limit(requested: Option<u32>, config: &LoopConfig) -> u32 {
    requested.unwrap_or(config.default_iteration_limit)
}

fn resolve_request(args: &RunArgs) -> anyhow::Result<String> {
    if let Some(request) = &args.request {
        return Ok(request.clone());
    }
    if let Some(index) = args.sample {
        let samples = sample_requests();
        return samples
            .get(index)
            .map(|s| s.to_string())
            .ok_or_else(|| {
                anyhow::anyhow!("sample index {index} out of range (0..{})", samples.len())
            });
    }
    anyhow::bail!("either --request or --sample is required")
}
