mod cli;
mod commands;
mod error;
mod output;
mod processing;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use crate::cli::{
    Args,
    Commands,
};
use crate::error::CliError;

// The default allocator makes the parallel merging crawl on windows
#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Logs go to stderr at `info` unless `RUST_LOG` says otherwise,
/// span timings are reported when a span closes.
fn init_tracing() -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let subscriber = Registry::default().with(env_filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), CliError> {
    init_tracing()?;
    match Args::parse().command {
        Commands::Merge(args) => commands::main_merge(args),
        Commands::WriteTemplate(args) => commands::main_write_template(args),
    }
}
