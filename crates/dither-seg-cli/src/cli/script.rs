//! Scripted segmentation sessions.
//!
//! A script is a YAML file listing the pointer events and pattern choices a
//! user would make, replayed against a [`SegmentationSession`]:
//!
//! ```yaml
//! name: portrait
//! steps:
//!   - select: hair
//!   - click: [120, 40]
//!   - click: [300, 40]
//!   - click: [210, 160]
//!   - double-click
//!   - pattern: { segment: hair, name: dots, offset: [2, 0] }
//! exports: [all, separate]
//! ```
//!
//! With a `viewport`, click and hover coordinates are read as positions on
//! an element of that size and mapped onto the canvas.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dither_seg::{
    CanvasMapping, CaptureEvent, ExportRequest, PatternId, PatternOffset, SegmentId,
    SegmentationSession,
};

/// A complete scripted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: Option<String>,

    /// Displayed element rectangle, when events are in client space
    #[serde(default)]
    pub viewport: Option<Viewport>,

    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,

    /// `all`, `separate` and/or `patterns`
    #[serde(default = "default_exports")]
    pub exports: Vec<String>,
}

fn default_exports() -> Vec<String> {
    vec!["all".to_string()]
}

/// On-screen rectangle the canvas is drawn into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Choose the segment type; `~` stops capturing.
    Select(Option<String>),
    Click([f64; 2]),
    DoubleClick,
    Hover([f64; 2]),
    Pattern {
        segment: String,
        /// Pattern name; omit or `none` to clear
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        offset: Option<[f64; 2]>,
    },
    Remove(String),
}

/// What a replay did.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScriptReport {
    pub points_added: usize,
    pub completed: Vec<String>,
    pub ignored: usize,
}

impl Script {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing session script")
    }

    pub fn export_requests(&self) -> Result<Vec<ExportRequest>> {
        self.exports
            .iter()
            .map(|name| ExportRequest::from_name(name).ok_or_else(|| anyhow!("unknown export '{}'", name)))
            .collect()
    }

    fn mapping(&self, session: &SegmentationSession) -> Option<CanvasMapping> {
        let (canvas_width, canvas_height) = session.canvas_size()?;
        Some(match self.viewport {
            Some(v) => CanvasMapping {
                rect_left: v.left,
                rect_top: v.top,
                rect_width: v.width,
                rect_height: v.height,
                canvas_width,
                canvas_height,
            },
            None => CanvasMapping::identity(canvas_width, canvas_height),
        })
    }

    /// Replay every step against `session`, which must have an image.
    ///
    /// Hover steps advance a synthetic clock past the debounce delay so each
    /// one settles before the next step.
    pub fn run(&self, session: &mut SegmentationSession) -> Result<ScriptReport> {
        let Some(mapping) = self.mapping(session) else {
            bail!("no image loaded");
        };
        let settle = Duration::from_millis(session.config().hover_debounce_ms + 1);
        let mut clock = Instant::now();
        let mut report = ScriptReport::default();

        for (i, step) in self.steps.iter().enumerate() {
            debug!(step = i, ?step, "replaying");
            let event = match step {
                Step::Select(id) => {
                    session.select_segment_type(id.as_deref().map(SegmentId::parse));
                    None
                }
                Step::Click([x, y]) => Some(session.click(*x, *y, &mapping)?),
                Step::DoubleClick => Some(session.double_click()?),
                Step::Hover([x, y]) => {
                    session.hover_client(*x, *y, &mapping, clock);
                    clock += settle;
                    session.tick(clock);
                    None
                }
                Step::Pattern { segment, name, offset } => {
                    let id = SegmentId::parse(segment);
                    let pattern = match name.as_deref() {
                        None | Some("none") => None,
                        Some(n) => Some(n.parse::<PatternId>().with_context(|| format!("step {}", i + 1))?),
                    };
                    session
                        .set_pattern(&id, pattern)
                        .with_context(|| format!("step {}", i + 1))?;
                    if let Some([dx, dy]) = offset {
                        session.set_offset(&id, PatternOffset::new(*dx, *dy))?;
                    }
                    None
                }
                Step::Remove(segment) => {
                    session.remove_segment(&SegmentId::parse(segment));
                    None
                }
            };

            match event {
                Some(CaptureEvent::PointAdded(_)) => report.points_added += 1,
                Some(CaptureEvent::Completed(shape)) => report.completed.push(shape.segment.to_string()),
                Some(CaptureEvent::Ignored) => report.ignored += 1,
                None => {}
            }
        }

        info!(
            script = self.name.as_deref().unwrap_or("unnamed"),
            completed = report.completed.len(),
            ignored = report.ignored,
            "script finished"
        );
        Ok(report)
    }
}
