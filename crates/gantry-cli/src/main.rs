//! Gantry: modular event pipeline for IoT edge gateways.
//!
//! Loads the configuration tree, assembles the pipeline with the
//! bundled component factories, runs until SIGINT/SIGTERM and shuts
//! down in order. Exits non-zero when a fault escalated under
//! fail-fast.
//!
//! # Environment
//!
//! - `RUST_LOG`: tracing filter (overrides `--debug`)

use anyhow::Result;
use clap::Parser;
use gantry_runtime::{config, FactoryRegistry, Pipeline};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Modular event pipeline for IoT edge gateways.
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "gantry.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose data-path logging (overrides engine.log_verbose)
    #[arg(short, long)]
    verbose: bool,

    /// Escalate the first handler fault into termination
    /// (overrides engine.fail_fast)
    #[arg(long)]
    fail_fast: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let mut tree = config::load_file(&args.config)?;
    if args.verbose {
        tree.engine.log_verbose = true;
    }
    if args.fail_fast {
        tree.engine.fail_fast = true;
    }

    if args.check {
        let components = tree.plugins.len()
            + tree.outputs.len()
            + tree.interceptors.len()
            + tree.drivers.len()
            + tree.inputs.len()
            + tree.logics.len();
        println!(
            "{} OK: {components} component(s), events_capacity {}",
            args.config.display(),
            tree.engine.events_capacity
        );
        return Ok(());
    }

    let factories = FactoryRegistry::with_builtins();
    let mut pipeline = Pipeline::init(tree, &factories)?;

    pipeline.start().await;
    pipeline.await_termination().await;
    pipeline.stop().await;

    if pipeline.fault_tripped() {
        info!("exiting after fail-fast escalation");
        std::process::exit(1);
    }
    Ok(())
}
