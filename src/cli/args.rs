//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::net::IpAddr;
use std::path::PathBuf;

/// Preview a markdown file in the browser with live reload
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Markdown file to preview (relative to the current directory)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (ignored when it does not exist)
    #[arg(short = 'C', long, default_value = "mdlive.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding the vendored front-end libraries
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub vendor_dir: Option<PathBuf>,

    /// Source tree watched in development mode (MDLIVE_DEV=true)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub source_dir: Option<PathBuf>,

    /// Source extensions that trigger a rebuild in development mode
    #[arg(long = "ext", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
