//! Scripted viewer input for headless runs. A script is either a JSON array
//! of steps or one step per line (NDJSON); each step is an object tagged by
//! `"kind"`.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::presentation::SceneTicket;
use crate::rotation::PointerSource;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptStep {
    PointerDown {
        x: f32,
        y: f32,
        #[serde(default)]
        source: PointerSource,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp,
    PointerLeave,
    PointerCancel,
    Key {
        key: String,
    },
    Focus {
        #[serde(default = "default_true")]
        focused: bool,
    },
    /// Moves the manual clock forward and fires due timers.
    Advance {
        ms: u64,
    },
    /// Completes the pending image load. Without a ticket the current
    /// selection's ticket is used.
    LoadOk {
        #[serde(default)]
        ticket: Option<SceneTicket>,
    },
    LoadFail {
        #[serde(default)]
        ticket: Option<SceneTicket>,
        #[serde(default)]
        detail: Option<String>,
    },
    /// Fullscreen flipped outside the viewer's control.
    ExternalFullscreen {
        fullscreen: bool,
    },
    DenyFullscreen {
        #[serde(default = "default_true")]
        deny: bool,
    },
    ActivateHotspot {
        index: usize,
    },
    ToggleHotspots,
    ToggleAutoRotate,
    ToggleFullscreen,
    GoTo {
        index: usize,
    },
    Next,
    Previous,
    Destroy,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("script array: {0}")]
    Array(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptFormat {
    Array,
    Ndjson,
}

fn detect_format(contents: &str) -> ScriptFormat {
    if contents.as_bytes().first() == Some(&b'[') {
        ScriptFormat::Array
    } else {
        ScriptFormat::Ndjson
    }
}

/// Parses a whole script. Blank lines and lines starting with `#` or `//`
/// are skipped in NDJSON form.
pub fn parse_script(contents: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    match detect_format(trimmed) {
        ScriptFormat::Array => Ok(serde_json::from_str(trimmed)?),
        ScriptFormat::Ndjson => {
            let mut steps = Vec::new();
            for (idx, line) in trimmed.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                    continue;
                }
                let step = serde_json::from_str(line).map_err(|source| ScriptError::Line {
                    line: idx + 1,
                    source,
                })?;
                steps.push(step);
            }
            Ok(steps)
        }
    }
}

pub fn load_script_file(path: &Path) -> Result<Vec<ScriptStep>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading input script {}", path.display()))?;
    parse_script(&contents).with_context(|| format!("parsing input script {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_array() {
        let steps = parse_script(
            r#"[
                {"kind": "load_ok"},
                {"kind": "pointer_down", "x": 10, "y": 20, "source": "touch"},
                {"kind": "pointer_move", "x": 30, "y": 20},
                {"kind": "pointer_up"}
            ]"#,
        )
        .expect("parse");
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], ScriptStep::LoadOk { ticket: None });
        assert_eq!(
            steps[1],
            ScriptStep::PointerDown {
                x: 10.0,
                y: 20.0,
                source: PointerSource::Touch
            }
        );
    }

    #[test]
    fn parses_ndjson_with_comments_and_defaults() {
        let steps = parse_script(
            "# warm up\n\
             {\"kind\": \"focus\"}\n\
             \n\
             {\"kind\": \"key\", \"key\": \"ArrowRight\"}\n\
             {\"kind\": \"load_fail\", \"ticket\": {\"scene\": 1, \"generation\": 2}}\n\
             {\"kind\": \"pointer_down\", \"x\": 0, \"y\": 0}\n",
        )
        .expect("parse");
        assert_eq!(steps[0], ScriptStep::Focus { focused: true });
        assert_eq!(
            steps[1],
            ScriptStep::Key {
                key: "ArrowRight".to_string()
            }
        );
        assert_eq!(
            steps[2],
            ScriptStep::LoadFail {
                ticket: Some(SceneTicket {
                    scene: 1,
                    generation: 2
                }),
                detail: None
            }
        );
        assert!(matches!(
            steps[3],
            ScriptStep::PointerDown {
                source: PointerSource::Mouse,
                ..
            }
        ));
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_script("{\"kind\": \"next\"}\n{\"kind\": \"warp\"}\n").unwrap_err();
        match err {
            ScriptError::Line { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_script_has_no_steps() {
        assert!(parse_script("  \n").expect("parse").is_empty());
    }
}
