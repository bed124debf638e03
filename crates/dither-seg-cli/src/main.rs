//! dither-seg - command line host for segmentation sessions
//!
//! Usage:
//!   dither-seg patterns                               List dither patterns
//!   dither-seg segment <image> --script <yaml>        Replay a session and export SVG
//!   dither-seg repattern <svg> -a key=pattern[@dx,dy] Re-pattern an existing SVG
//!   dither-seg inspect <svg>                          Show editable paths
//!   dither-seg preview <svg> -o <png>                 Render SVG to PNG
//!
//! Logs go to stderr; set `RUST_LOG=debug` for capture transitions.

mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands, SegmentArgs};

/// Install the tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` level. Output goes to stderr so
/// stdout stays clean for file lists and JSON.
fn init_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = cli::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Patterns { json } => cli::cmd_patterns(&config, json)?,
        Commands::Segment { image, script, out_dir, export, canvas, json } => {
            cli::cmd_segment(
                config,
                SegmentArgs {
                    image: &image,
                    script: &script,
                    out_dir: &out_dir,
                    exports: export.into_iter().map(Into::into).collect(),
                    canvas: canvas.as_deref(),
                    json,
                },
            )?;
        }
        Commands::Repattern { svg, assignments, output } => {
            cli::cmd_repattern(&config, &svg, &assignments, output.as_deref())?;
        }
        Commands::Inspect { svg, json } => cli::cmd_inspect(&svg, json)?,
        Commands::Preview { svg, output, width } => cli::cmd_preview(&svg, &output, width)?,
    }

    Ok(())
}
