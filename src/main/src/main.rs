use anyhow::Context;
use clap::Parser;
use latency_metrics::{cmd_arg::CmdArgs, config, start_tracing, sys::Sys};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    start_tracing();
    let args = CmdArgs::parse();
    let config = config::read_config(&args.files_dir)
        .and_then(|c| c.apply_args(&args))
        .context("load service config")?;
    tracing::info!("config: {:?}", config);

    let mut sys = Sys::new(config).context("load telemetry data")?;
    if let Err(err) = sys.wait_for_end().await {
        tracing::error!("service stopped: {}", err);
        return Err(err).context("serve latency metrics");
    }
    Ok(())
}
