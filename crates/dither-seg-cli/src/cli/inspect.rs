//! `inspect` - show what the editor sees in an SVG.

use std::path::Path;

use anyhow::Result;

use dither_seg::editor::Outline;
use dither_seg::{EditorSession, UploadedDocument};

use super::common::read_text;

pub fn cmd_inspect(svg: &Path, json: bool) -> Result<()> {
    let name = svg
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.svg".to_string());
    let editor = EditorSession::open(UploadedDocument::new(name, read_text(svg)?));

    if json {
        println!("{}", serde_json::to_string_pretty(editor.parsed())?);
        return Ok(());
    }

    if let Some(message) = editor.empty_state_message() {
        println!("{}", message);
        return Ok(());
    }

    let parsed = editor.parsed();
    println!("{} x {}, {} paths", parsed.width, parsed.height, parsed.paths.len());
    println!("{:<16} {:<12} {:<24} {:>5}", "KEY", "SEGMENT", "FILL", "RINGS");
    for path in &parsed.paths {
        println!(
            "{:<16} {:<12} {:<24} {:>5}",
            path.key,
            path.segment.as_deref().unwrap_or("-"),
            path.fill.as_deref().unwrap_or("-"),
            Outline::from_path_data(&path.d).rings().len(),
        );
    }
    Ok(())
}
