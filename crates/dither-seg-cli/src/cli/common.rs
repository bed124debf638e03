//! Common utilities shared across CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dither_seg::{Config, ExportedDocument};
use tracing::{debug, info};

/// Load a YAML config, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// The download step: write each document under `dir` by its file name.
pub fn write_documents(docs: &[ExportedDocument], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::with_capacity(docs.len());
    for doc in docs {
        let path = dir.join(&doc.filename);
        write_document(doc, &path)?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_document(doc: &ExportedDocument, path: &Path) -> Result<()> {
    fs::write(path, &doc.bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), mime = doc.mime, bytes = doc.bytes.len(), "wrote document");
    Ok(())
}

/// Parse `x,y` (whitespace tolerated).
pub fn parse_pair(raw: &str) -> Option<(f64, f64)> {
    let (x, y) = raw.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}
