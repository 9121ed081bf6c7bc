//! Command-line interface for clipforge.
//!
//! Provides commands for a single run, the scheduled trigger loop, inspecting
//! the resolved configuration, and checking gate verdicts offline.

use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::config::{load_config, mask_secret, ResolvedConfig};
use crate::core::{GateKind, Orchestrator, Scheduler, Verdict};

/// clipforge - Quality-gated short video generation pipeline
#[derive(Parser, Debug)]
#[command(name = "clipforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .clipforge/config.yaml discovery)
    #[arg(short, long, global = true, env = "CLIPFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Produce one video now
    Run {
        /// Topic override
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Produce a video on a fixed interval
    Schedule {
        /// Topic override
        #[arg(short, long)]
        topic: Option<String>,

        /// Seconds between triggers (defaults to the configured interval)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Stop after this many runs
        #[arg(long)]
        max_runs: Option<u32>,
    },

    /// Show resolved configuration (secrets masked)
    Config,

    /// Apply a quality gate to evaluator text
    Gate {
        /// Which gate to apply
        #[arg(value_enum)]
        kind: GateArg,

        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Gate selection for the CLI (maps to GateKind)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GateArg {
    /// Score marker gate used on scripts
    Script,

    /// Keyword gate used on the voiceover and final video
    Media,
}

impl From<GateArg> for GateKind {
    fn from(arg: GateArg) -> Self {
        match arg {
            GateArg::Script => GateKind::Script,
            GateArg::Media => GateKind::Media,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run { topic } => run_once(self.config, topic).await,
            Commands::Schedule {
                topic,
                interval_secs,
                max_runs,
            } => schedule(self.config, topic, interval_secs, max_runs).await,
            Commands::Config => show_config(self.config),
            Commands::Gate { kind, input } => check_gate(kind, input),
        }
    }
}

/// Load config and refuse to go further while credentials are placeholders
fn admitted_config(path: Option<PathBuf>) -> Result<ResolvedConfig> {
    let config = load_config(path.as_deref())?;

    if let Err(err) = config.admission_check() {
        warn!("Please set real API keys and ids before running (env vars or .clipforge/config.yaml)");
        return Err(err.into());
    }

    Ok(config)
}

fn build_orchestrator(config: &ResolvedConfig) -> Result<Orchestrator> {
    Ok(Orchestrator::new(
        config.collaborators()?,
        config.pipeline.clone(),
        config.asset_targets(),
    ))
}

async fn run_once(config_path: Option<PathBuf>, topic: Option<String>) -> Result<()> {
    let config = admitted_config(config_path)?;
    let orchestrator = build_orchestrator(&config)?;
    let topic = topic.unwrap_or_else(|| config.topic.clone());

    info!(%topic, "Video creation automation");
    let run = orchestrator.run_once(&topic).await?;

    println!("Run:      {}", run.id);
    println!("Topic:    {}", run.topic);
    println!("Scripts:  {}", run.script_generations);
    println!("Restarts: {}", run.restarts);
    if let Some(ref name) = run.output_name {
        println!("Saved:    {}", name);
    }

    Ok(())
}

async fn schedule(
    config_path: Option<PathBuf>,
    topic: Option<String>,
    interval_secs: Option<u64>,
    max_runs: Option<u32>,
) -> Result<()> {
    let config = admitted_config(config_path)?;
    let orchestrator = build_orchestrator(&config)?;
    let topic = topic.unwrap_or_else(|| config.topic.clone());
    let interval = interval_secs
        .map(Duration::from_secs)
        .unwrap_or(config.interval);

    info!(%topic, interval_secs = interval.as_secs(), "Starting scheduled automation");
    let report = Scheduler::new(&orchestrator, topic, interval)
        .with_max_runs(max_runs)
        .run()
        .await;

    println!(
        "Runs: {} ({} succeeded, {} failed)",
        report.runs, report.succeeded, report.failed
    );
    Ok(())
}

fn show_config(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;

    let config_file = config
        .config_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    println!("Config file:     {}", config_file);
    println!("Topic:           {}", config.topic);
    println!("Interval:        {}s", config.interval.as_secs());
    println!("Request timeout: {}s", config.request_timeout.as_secs());
    println!("Gemini model:    {}", config.gemini_model);
    println!("Gemini key:      {}", mask_secret(&config.gemini_api_key));
    println!("TTS endpoint:    {}", config.tts_url);
    println!("TTS key:         {}", mask_secret(&config.tts_api_key));
    println!("Drive token:     {}", mask_secret(&config.drive_access_token));
    println!("Merge service:   {}", config.merge_service_url);
    println!("Raw video id:    {}", config.raw_video_file_id);
    println!("Output folder:   {}", config.output_folder_id);
    println!("Speech review:   {}", config.pipeline.speech_evaluation);

    let placeholders = config.placeholder_fields();
    if !placeholders.is_empty() {
        println!();
        println!("Placeholders:    {}", placeholders.join(", "));
    }

    Ok(())
}

fn check_gate(kind: GateArg, input: Option<PathBuf>) -> Result<()> {
    let text = match input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let gate = GateKind::from(kind).build();
    match gate.verdict(&text) {
        Verdict::Pass => println!("pass"),
        Verdict::NeedsRework => println!("needs-rework"),
    }

    Ok(())
}
