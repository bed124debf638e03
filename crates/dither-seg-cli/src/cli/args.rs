//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Outline image regions, fill them with dither patterns, export SVG.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Session configuration (YAML). Missing keys keep their defaults.
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List available dither patterns
    #[command(visible_alias = "p")]
    Patterns {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a scripted segmentation session over an image and export
    #[command(visible_alias = "s")]
    Segment {
        /// Raster image to segment
        #[arg(value_hint = clap::ValueHint::FilePath)]
        image: PathBuf,

        /// Session script (YAML)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        script: PathBuf,

        /// Directory exported documents are written to
        #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
        out_dir: PathBuf,

        /// Exports to produce; overrides the script's list
        #[arg(short, long, value_enum)]
        export: Vec<ExportKind>,

        /// Also write the canvas (image, segment tints, pending capture) as PNG
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        canvas: Option<PathBuf>,

        /// Print the resulting segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assign patterns to paths of an existing SVG
    #[command(visible_alias = "r")]
    Repattern {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        svg: PathBuf,

        /// `key=pattern[@dx,dy]`; key may be `@x,y` to pick the path under
        /// a point. Pattern `none` clears the assignment.
        #[arg(short, long = "assign", value_name = "ASSIGNMENT")]
        assignments: Vec<String>,

        /// Output file (default: `<name>-patterned.svg` next to the input)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Show the editable paths of an SVG
    #[command(visible_alias = "i")]
    Inspect {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        svg: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render an SVG to PNG
    Preview {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        svg: PathBuf,

        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: PathBuf,

        /// Output width in pixels (default: document width)
        #[arg(short, long)]
        width: Option<u32>,
    },
}

/// Export request as named on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    All,
    Separate,
    Patterns,
}

impl From<ExportKind> for dither_seg::ExportRequest {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::All => dither_seg::ExportRequest::All,
            ExportKind::Separate => dither_seg::ExportRequest::Separate,
            ExportKind::Patterns => dither_seg::ExportRequest::PatternsOnly,
        }
    }
}
