//! mdlive - Live browser preview for a single markdown file.

mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod render;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use cli::serve::ServeState;
use config::PreviewConfig;
use reload::{AppContext, ReloadOrchestrator};

/// Exit status for every startup-fatal error.
const EXIT_FAILURE: i32 = 1;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(parse_exit_code(&e));
        }
    };

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    std::process::exit(exit_code(run(&cli)));
}

/// Usage errors exit 1; --help/--version exit 0.
fn parse_exit_code(e: &clap::Error) -> i32 {
    if e.use_stderr() { EXIT_FAILURE } else { 0 }
}

/// Report a failed run on stderr and map it to the process exit status.
fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_FAILURE
        }
    }
}

/// Load config and the initial content. Any error here is startup-fatal.
fn startup(cli: &Cli) -> Result<(PreviewConfig, Arc<AppContext>)> {
    let config = PreviewConfig::load(cli)?;
    let ctx = Arc::new(AppContext::load(config.content_path.clone())?);
    Ok((config, ctx))
}

fn run(cli: &Cli) -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let (config, ctx) = startup(cli)?;
    log!("serve"; "previewing {}", config.content_path.display());

    if !config.serve.vendor_dir.is_dir() {
        log!("warning"; "vendor dir {} not found, diagrams and highlighting are disabled",
            config.serve.vendor_dir.display());
    }

    let bound_server = cli::serve::bind_server(&config.serve)?;
    let mut orchestrator = ReloadOrchestrator::start(Arc::clone(&ctx), &config)?;

    let state = Arc::new(ServeState::new(ctx, config.serve.vendor_dir.clone()));
    let result = bound_server.run(state);

    orchestrator.stop();
    debug!("serve"; "stopped");
    result
}
