//! Segmentation session: one image, one capture, one segment collection.
//!
//! The session is the host-facing surface. A host (UI, script runner,
//! test) feeds it uploads, pointer events and pattern choices, and reads
//! back layers and exported documents. Everything is synchronous and owned;
//! the session never spawns work of its own.

use std::time::{Duration, Instant};

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::capture::{CanvasMapping, CaptureEvent, CaptureState, CompletedShape};
use crate::canvas::Layers;
use crate::color::Rgb;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::{SegmentError, SessionError};
use crate::export::{ExportMode, ExportRequest, ExportedDocument, export_documents, generate_svg};
use crate::geometry::Point;
use crate::image_source::DisplayImage;
use crate::patterns::{PatternId, PatternOffset};
use crate::segment::{Segment, SegmentId, SegmentStore};

pub struct SegmentationSession {
    config: Config,
    layers: Option<Layers>,
    capture: CaptureState,
    store: SegmentStore,
    hover: Debouncer<Option<SegmentId>>,
}

impl SegmentationSession {
    pub fn new(config: Config) -> Self {
        let delay = Duration::from_millis(config.hover_debounce_ms);
        Self {
            config,
            layers: None,
            capture: CaptureState::default(),
            store: SegmentStore::new(),
            hover: Debouncer::new(delay),
        }
    }

    // ========================================================================
    // IMAGE
    // ========================================================================

    /// Decode an upload and make it the working image.
    ///
    /// On failure nothing changes: the previous image, segments and capture
    /// stay as they were. On success existing segments are dropped, since
    /// their masks belong to the old canvas.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let image = DisplayImage::from_bytes(bytes, self.config.display).inspect_err(|e| {
            warn!(error = %e, "upload rejected");
        })?;
        self.install(image)
    }

    /// Use an already-decoded image.
    pub fn load_rgba(&mut self, pixels: RgbaImage) -> Result<(), SessionError> {
        let image = DisplayImage::from_rgba(pixels, self.config.display);
        self.install(image)
    }

    fn install(&mut self, image: DisplayImage) -> Result<(), SessionError> {
        let (sw, sh) = image.source_size();
        let layers = Layers::new(image, self.config.highlight.clone())?;
        info!(
            source_width = sw,
            source_height = sh,
            width = layers.width(),
            height = layers.height(),
            "image loaded"
        );

        self.layers = Some(layers);
        self.store.clear();
        self.hover.cancel();
        let active = self.capture.active_segment().cloned();
        self.capture.select(active);
        Ok(())
    }

    pub fn has_image(&self) -> bool {
        self.layers.is_some()
    }

    /// Canvas size, if an image is loaded.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        self.layers.as_ref().map(|l| (l.width(), l.height()))
    }

    /// Identity mapping for the current canvas.
    pub fn identity_mapping(&self) -> Option<CanvasMapping> {
        self.canvas_size().map(|(w, h)| CanvasMapping::identity(w, h))
    }

    // ========================================================================
    // CAPTURE
    // ========================================================================

    /// Choose the segment type to outline next, or `None` to stop capturing.
    pub fn select_segment_type(&mut self, segment: Option<SegmentId>) {
        debug!(segment = ?segment.as_ref().map(|s| s.as_str()), "segment type selected");
        self.capture.select(segment);
        if let Some(layers) = self.layers.as_mut() {
            layers.clear_live();
        }
    }

    /// Pointer click in client coordinates.
    pub fn click(&mut self, client_x: f64, client_y: f64, mapping: &CanvasMapping) -> Result<CaptureEvent, SessionError> {
        self.click_canvas(mapping.to_canvas(client_x, client_y))
    }

    /// Pointer click already in canvas pixels.
    pub fn click_canvas(&mut self, at: Point) -> Result<CaptureEvent, SessionError> {
        if self.layers.is_none() {
            debug!("click ignored, no image loaded");
            return Ok(CaptureEvent::Ignored);
        }
        let event = self.capture.click(at, &self.config.capture);
        self.after_capture_event(&event)?;
        Ok(event)
    }

    pub fn double_click(&mut self) -> Result<CaptureEvent, SessionError> {
        if self.layers.is_none() {
            return Ok(CaptureEvent::Ignored);
        }
        let event = self.capture.double_click(&self.config.capture);
        self.after_capture_event(&event)?;
        Ok(event)
    }

    fn after_capture_event(&mut self, event: &CaptureEvent) -> Result<(), SessionError> {
        match event {
            CaptureEvent::Ignored => Ok(()),
            CaptureEvent::PointAdded(_) => {
                self.repaint_live();
                Ok(())
            }
            CaptureEvent::Completed(shape) => self.complete(shape),
        }
    }

    fn repaint_live(&mut self) {
        let Some(layers) = self.layers.as_mut() else {
            return;
        };
        let color = self
            .capture
            .active_segment()
            .map(|s| s.color())
            .unwrap_or(Rgb::BLACK);
        layers.repaint_live(self.capture.points(), color);
    }

    fn complete(&mut self, shape: &CompletedShape) -> Result<(), SessionError> {
        let Some(layers) = self.layers.as_mut() else {
            return Ok(());
        };

        let segment = match Segment::from_polygon(
            shape.segment.clone(),
            shape.points.clone(),
            layers.width(),
            layers.height(),
        ) {
            Ok(segment) => segment,
            Err(e) => {
                warn!(segment = %shape.segment, error = %e, "could not build segment, keeping outline");
                self.capture.restore(shape.clone());
                return Err(e.into());
            }
        };
        self.store.upsert(segment);

        layers.repaint_static(self.store.as_slice());
        layers.clear_live();
        info!(segment = %shape.segment, points = shape.points.len(), total = self.store.len(), "segment captured");
        Ok(())
    }

    pub fn capture(&self) -> &CaptureState {
        &self.capture
    }

    // ========================================================================
    // HOVER
    // ========================================================================

    /// Pointer moved over the canvas. The highlight follows after the
    /// debounce delay; call [`tick`](Self::tick) to apply it.
    pub fn hover(&mut self, at: Point, now: Instant) {
        let target = self.store.segment_at(at).map(|s| s.id.clone());
        self.hover.request(target, now);
    }

    pub fn hover_client(&mut self, client_x: f64, client_y: f64, mapping: &CanvasMapping, now: Instant) {
        self.hover(mapping.to_canvas(client_x, client_y), now);
    }

    /// Pointer left the canvas.
    pub fn hover_leave(&mut self, now: Instant) {
        self.hover.request(None, now);
    }

    /// Apply a pending highlight if its delay elapsed. Returns whether one
    /// was applied.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(target) = self.hover.poll(now) else {
            return false;
        };
        if let Some(layers) = self.layers.as_mut() {
            layers.highlight(target.as_ref());
        }
        true
    }

    // ========================================================================
    // SEGMENTS & PATTERNS
    // ========================================================================

    pub fn segments(&self) -> &[Segment] {
        self.store.as_slice()
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn set_pattern(&mut self, id: &SegmentId, pattern: Option<PatternId>) -> Result<(), SegmentError> {
        self.store.set_pattern(id, pattern)
    }

    pub fn set_offset(&mut self, id: &SegmentId, offset: PatternOffset) -> Result<(), SegmentError> {
        self.store.set_offset(id, offset)
    }

    /// Drop a segment and repaint the static layer.
    pub fn remove_segment(&mut self, id: &SegmentId) -> Option<Segment> {
        let removed = self.store.remove(id)?;
        if let Some(layers) = self.layers.as_mut() {
            layers.repaint_static(self.store.as_slice());
        }
        info!(segment = %id, "segment removed");
        Some(removed)
    }

    pub fn layers(&self) -> Option<&Layers> {
        self.layers.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Export size: the canvas, or the display bound before any upload.
    fn export_size(&self) -> (u32, u32) {
        self.canvas_size()
            .unwrap_or((self.config.display.max_width, self.config.display.max_height))
    }

    pub fn export_svg(&self, mode: ExportMode) -> String {
        let (w, h) = self.export_size();
        generate_svg(self.store.as_slice(), w, h, mode, &self.config.export)
    }

    pub fn export(&self, request: ExportRequest) -> Vec<ExportedDocument> {
        let (w, h) = self.export_size();
        export_documents(
            self.store.as_slice(),
            w,
            h,
            request,
            &self.config.export.file_prefix,
            &self.config.export,
        )
    }
}

impl Default for SegmentationSession {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
