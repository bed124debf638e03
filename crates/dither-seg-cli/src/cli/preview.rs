//! `preview` - rasterize an SVG with resvg.
//!
//! Image-backed pattern tiles are resolved relative to the SVG's directory.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use image::{Rgba, RgbaImage};
use tiny_skia::{Pixmap, Transform};
use tracing::info;

use super::common::read_text;

/// Render SVG text to an RGBA image `width` pixels wide.
pub fn render_svg(text: &str, resources_dir: Option<&Path>, width: Option<u32>) -> Result<RgbaImage> {
    let options = usvg::Options {
        resources_dir: resources_dir.map(Path::to_path_buf),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(text, &options).context("parsing SVG")?;

    let size = tree.size();
    let scale = match width {
        Some(w) => w as f32 / size.width(),
        None => 1.0,
    };
    let out_w = (size.width() * scale).ceil().max(1.0) as u32;
    let out_h = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = Pixmap::new(out_w, out_h).ok_or_else(|| anyhow!("cannot allocate {}x{} pixmap", out_w, out_h))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let mut image = RgbaImage::new(out_w, out_h);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(image)
}

pub fn cmd_preview(svg: &Path, output: &Path, width: Option<u32>) -> Result<()> {
    let text = read_text(svg)?;
    let image = render_svg(&text, svg.parent(), width)?;
    image
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(path = %output.display(), width = image.width(), height = image.height(), "preview written");
    println!("{}", output.display());
    Ok(())
}
