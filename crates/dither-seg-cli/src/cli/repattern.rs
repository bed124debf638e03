//! `repattern` - assign patterns to paths of an uploaded SVG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};

use dither_seg::{Config, EditorSession, PatternId, PatternOffset, Point, UploadedDocument};

use super::common::{parse_pair, read_text, write_document};

/// Which path an assignment targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Key(String),
    At(Point),
}

/// One parsed `--assign` value.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignArg {
    pub target: Target,
    pub pattern: Option<PatternId>,
    pub offset: Option<PatternOffset>,
}

/// Parse `key=pattern[@dx,dy]` or `@x,y=pattern[@dx,dy]`.
pub fn parse_assignment(raw: &str) -> Result<AssignArg> {
    let (target, rest) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=pattern, got '{}'", raw))?;

    let target = match target.strip_prefix('@') {
        Some(pair) => {
            let (x, y) = parse_pair(pair).ok_or_else(|| anyhow!("bad point '{}'", pair))?;
            Target::At(Point::new(x, y))
        }
        None if target.trim().is_empty() => bail!("empty path key in '{}'", raw),
        None => Target::Key(target.trim().to_string()),
    };

    let (name, offset) = match rest.split_once('@') {
        Some((name, pair)) => {
            let (dx, dy) = parse_pair(pair).ok_or_else(|| anyhow!("bad offset '{}'", pair))?;
            (name, Some(PatternOffset::new(dx, dy)))
        }
        None => (rest, None),
    };

    let pattern = match name.trim() {
        "none" | "" => None,
        other => Some(other.parse::<PatternId>()?),
    };

    Ok(AssignArg { target, pattern, offset })
}

fn apply(editor: &mut EditorSession, arg: &AssignArg) -> Result<()> {
    match &arg.target {
        Target::Key(key) => editor.select(key)?,
        Target::At(p) => {
            if editor.select_at(*p).is_none() {
                bail!("no path under {},{}", p.x, p.y);
            }
        }
    }
    editor.assign_selected(arg.pattern)?;
    if let Some(offset) = arg.offset {
        editor.offset_selected(offset)?;
    }
    Ok(())
}

pub fn cmd_repattern(config: &Config, svg: &Path, assignments: &[String], output: Option<&Path>) -> Result<PathBuf> {
    let name = svg
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.svg".to_string());
    let mut editor = EditorSession::open(UploadedDocument::new(name, read_text(svg)?));

    if let Some(message) = editor.empty_state_message() {
        bail!("{}", message);
    }

    for raw in assignments {
        let arg = parse_assignment(raw)?;
        apply(&mut editor, &arg).with_context(|| format!("applying '{}'", raw))?;
    }

    let doc = editor.export(&config.export);
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => svg.with_file_name(&doc.filename),
    };
    write_document(&doc, &path)?;
    println!("{}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_assignments() {
        let arg = parse_assignment("hair=dots@2,-3").unwrap();
        assert_eq!(arg.target, Target::Key("hair".to_string()));
        assert_eq!(arg.pattern, Some(PatternId::Dots));
        assert_eq!(arg.offset, Some(PatternOffset::new(2.0, -3.0)));

        let cleared = parse_assignment("face=none").unwrap();
        assert_eq!(cleared.pattern, None);
        assert_eq!(cleared.offset, None);
    }

    #[test]
    fn parses_point_targets() {
        let arg = parse_assignment("@10,20=crosshatch").unwrap();
        assert_eq!(arg.target, Target::At(Point::new(10.0, 20.0)));
        assert_eq!(arg.pattern, Some(PatternId::Crosshatch));
    }

    #[test]
    fn rejects_malformed() {
        assert!(parse_assignment("hair").is_err());
        assert!(parse_assignment("=dots").is_err());
        assert!(parse_assignment("hair=plaid").is_err());
        assert!(parse_assignment("@x,1=dots").is_err());
    }
}
