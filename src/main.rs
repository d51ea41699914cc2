mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Config};
use lumatrace::{convert, ConversionOptions, PosterizeParams, TraceParams};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let output_path = cli.output_path();

    let trace_update = cli.trace_update(config.trace);
    trace_update.validate()?;
    let mut trace = TraceParams::default();
    trace.apply(&trace_update);

    let posterize = if cli.posterize || config.posterize {
        let update = cli.posterize_update(config.layers);
        update.validate()?;
        let mut posterize = PosterizeParams::default();
        posterize.apply(&update);
        Some(posterize)
    } else {
        None
    };

    info!(
        "Converting {} to {} ({})...",
        cli.input.display(),
        output_path.display(),
        if posterize.is_some() { "posterized" } else { "single pass" }
    );

    let options = ConversionOptions {
        trace,
        posterize,
        width: cli.width,
        height: cli.height,
    };
    convert(&cli.input, &output_path, &options)?;

    info!("Conversion complete!");
    Ok(())
}
