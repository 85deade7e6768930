use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Serve per-region latency statistics over a static telemetry file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CmdArgs {
    /// Base directory, holds `files/service_config.yaml` and the data file
    pub files_dir: PathBuf,
    /// Listen address, overrides the config file
    #[arg(long)]
    pub addr: Option<SocketAddr>,
    /// Telemetry JSON file, relative paths resolve against `files_dir`
    #[arg(long)]
    pub data_file: Option<PathBuf>,
    /// Breach threshold used when a request carries none
    #[arg(long)]
    pub threshold_ms: Option<f64>,
}
