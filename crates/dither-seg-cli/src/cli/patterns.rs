//! `patterns` - list the dither catalogue.

use anyhow::Result;
use serde::Serialize;

use dither_seg::patterns::{TileSource, tile_size};
use dither_seg::{Config, PatternId};

#[derive(Debug, Serialize)]
struct PatternRow {
    name: &'static str,
    title: &'static str,
    kind: &'static str,
    /// Tile side at the default display size
    tile: f64,
}

fn rows(config: &Config) -> Vec<PatternRow> {
    let (w, h) = (config.display.max_width, config.display.max_height);
    PatternId::all()
        .iter()
        .map(|p| {
            let def = p.definition();
            PatternRow {
                name: p.name(),
                title: def.name,
                kind: match def.source {
                    TileSource::Vector { .. } => "vector",
                    TileSource::Image { .. } => "image",
                },
                tile: tile_size(&def, w, h, &config.export),
            }
        })
        .collect()
}

pub fn cmd_patterns(config: &Config, json: bool) -> Result<()> {
    let rows = rows(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<12} {:<18} {:<7} {:>6}", "NAME", "TITLE", "KIND", "TILE");
    for row in &rows {
        println!("{:<12} {:<18} {:<7} {:>6}", row.name, row.title, row.kind, row.tile);
    }
    Ok(())
}
