// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Forge CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use forge::cli::{init_tracing, Reporter};
use forge::viewer::StageStatus;
use forge::{CommandOutcome, EditorSession, ForgeConfig, Pipeline, RenderQueue, ViewerStage};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Forge - OpenSCAD render/export pipeline with STL preview", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./forge.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a script and display it on the headless stage
    Render {
        /// Input SCAD file
        input: PathBuf,

        /// Frame intervals to keep the presentation loop running once the
        /// mesh is queued
        #[arg(long, default_value_t = 1)]
        frames: u32,
    },

    /// Compile a script and write the mesh as STL
    Export {
        /// Input SCAD file
        input: PathBuf,

        /// Output file (defaults to the configured export name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a script and print line-corrected diagnostics
    Check {
        /// Input SCAD file
        input: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ForgeConfig::from_file(path)?,
        None => ForgeConfig::load()?,
    };

    match cli.command {
        Commands::Render { input, frames } => render_command(&config, input, frames).await,
        Commands::Export { input, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&config.export_filename));
            export_command(&config, input, output).await
        }
        Commands::Check { input, json } => check_command(&config, input, json).await,
        Commands::Version => {
            println!("Forge v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load the script into a fresh editor, or exit with the alert text
fn open_editor(pipeline: &Pipeline, input: &PathBuf) -> EditorSession {
    let mut editor = EditorSession::new("");
    if let CommandOutcome::IoFailed = pipeline.open_source(&mut editor, input) {
        let alert = pipeline.panel().take_alert().unwrap_or_default();
        Reporter::report_error(&alert);
        std::process::exit(1);
    }
    editor
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn warn_if_kernel_missing(pipeline: &Pipeline) {
    let backend = pipeline.session().backend();
    if !backend.is_available().await {
        Reporter::report_warning(&format!(
            "OpenSCAD executable `{}` could not be started. Set FORGE_OPENSCAD_PATH or openscad_path in forge.toml.",
            backend.program()
        ));
    }
}

fn exit_with_diagnostics(pipeline: &Pipeline) -> ! {
    Reporter::report_error("kernel rejected the script");
    Reporter::report_diagnostics(&pipeline.panel().message());
    std::process::exit(1);
}

async fn render_command(config: &ForgeConfig, input: PathBuf, frames: u32) -> Result<()> {
    let queue = Arc::new(RenderQueue::new());
    let pipeline = Pipeline::from_config(config, queue.clone());
    let editor = open_editor(&pipeline, &input);
    warn_if_kernel_missing(&pipeline).await;

    let start = Instant::now();
    let pb = spinner("Compiling");
    let outcome = pipeline.render(&editor).await;
    pb.finish_and_clear();

    if let CommandOutcome::Failed(_) = outcome {
        exit_with_diagnostics(&pipeline);
    }

    let frame_interval = config.frame_interval();
    let stage = ViewerStage::headless(queue)
        .with_panel(pipeline.panel().clone())
        .run(frame_interval, tokio::time::sleep(frame_interval * frames.max(1)))
        .await;

    if let Some(alert) = pipeline.panel().take_alert() {
        Reporter::report_error(&alert);
        std::process::exit(1);
    }

    match stage.status() {
        StageStatus::Displaying { triangles, bounds, .. } => {
            Reporter::report_render(&input.display().to_string(), triangles, &bounds, start.elapsed());
        }
        StageStatus::Idle => Reporter::report_warning("no mesh reached the stage"),
    }

    Ok(())
}

async fn export_command(config: &ForgeConfig, input: PathBuf, output: PathBuf) -> Result<()> {
    let pipeline = Pipeline::from_config(config, Arc::new(RenderQueue::new()));
    let editor = open_editor(&pipeline, &input);
    warn_if_kernel_missing(&pipeline).await;

    let start = Instant::now();
    let pb = spinner("Exporting");
    let outcome = pipeline.export(&editor, &output).await;
    pb.finish_and_clear();

    match outcome {
        CommandOutcome::Exported { path, bytes, .. } => {
            Reporter::report_export(&input.display().to_string(), &path, bytes, start.elapsed());
        }
        CommandOutcome::IoFailed => {
            Reporter::report_error(&pipeline.panel().take_alert().unwrap_or_default());
            std::process::exit(1);
        }
        _ => exit_with_diagnostics(&pipeline),
    }

    Ok(())
}

async fn check_command(config: &ForgeConfig, input: PathBuf, json: bool) -> Result<()> {
    let pipeline = Pipeline::from_config(config, Arc::new(RenderQueue::new()));
    let editor = open_editor(&pipeline, &input);

    let outcome = pipeline.check(&editor).await;
    let ok = matches!(outcome, CommandOutcome::Compiled(_));
    let message = pipeline.panel().message();

    if json {
        let report = serde_json::json!({
            "file": input.display().to_string(),
            "ok": ok,
            "message": message,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if ok {
        Reporter::success(&message);
    } else {
        Reporter::report_diagnostics(&message);
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
