//! `segment` - replay a session script over an image and export.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use dither_seg::{Config, ExportRequest, Segment, SegmentationSession};

use super::common::{read_text, write_documents};
use super::script::Script;

/// Per-segment summary for `--json`.
#[derive(Debug, Serialize)]
struct SegmentSummary<'a> {
    id: &'a str,
    name: &'a str,
    pattern: Option<&'static str>,
    offset: Option<[f64; 2]>,
    points: usize,
    path: Option<&'a str>,
}

impl<'a> From<&'a Segment> for SegmentSummary<'a> {
    fn from(s: &'a Segment) -> Self {
        Self {
            id: s.id.as_str(),
            name: &s.name,
            pattern: s.pattern.map(|p| p.name()),
            offset: s.offset.map(|o| [o.x, o.y]),
            points: s.points.len(),
            path: s.path.as_deref(),
        }
    }
}

pub struct SegmentArgs<'a> {
    pub image: &'a Path,
    pub script: &'a Path,
    pub out_dir: &'a Path,
    pub exports: Vec<ExportRequest>,
    pub canvas: Option<&'a Path>,
    pub json: bool,
}

pub fn cmd_segment(config: Config, args: SegmentArgs<'_>) -> Result<Vec<PathBuf>> {
    let bytes = fs::read(args.image).with_context(|| format!("reading {}", args.image.display()))?;
    let script = Script::from_yaml(&read_text(args.script)?)?;

    let mut session = SegmentationSession::new(config);
    session
        .load_image(&bytes)
        .with_context(|| format!("loading {}", args.image.display()))?;

    let report = script.run(&mut session)?;
    info!(completed = ?report.completed, "session replayed");

    let requests = if args.exports.is_empty() {
        script.export_requests()?
    } else {
        args.exports
    };

    let mut written = Vec::new();
    for request in requests {
        let docs = session.export(request);
        written.extend(write_documents(&docs, args.out_dir)?);
    }

    if let Some(path) = args.canvas {
        if let Some(layers) = session.layers() {
            layers
                .composite()
                .save(path)
                .with_context(|| format!("writing canvas {}", path.display()))?;
            written.push(path.to_path_buf());
        }
    }

    if args.json {
        let summary: Vec<SegmentSummary> = session.segments().iter().map(SegmentSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for path in &written {
            println!("{}", path.display());
        }
    }

    Ok(written)
}
