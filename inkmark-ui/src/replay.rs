//! Scripted editing sessions.
//!
//! A script is a JSON list of editor actions replayed against a fresh canvas.
//! Used by the `inkmark-replay` binary and by integration tests.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, Context};
use egui::{pos2, Color32};
use inkmark_history::HistoryConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    AnnotationCanvas, AnnotationTools, CanvasDocument, Stroke, ToolKind, UndoRedoController,
};

/// File extension recommended for replay scripts.
pub const SCRIPT_FILE_EXT: &str = "replay.json";

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Tool { tool: ToolKind },
    Color { rgba: [u8; 4] },
    Width { width: f32 },
    Text { content: String },
    /// Pointer positions from press to release, applied with the active tool.
    Stroke { points: Vec<[f32; 2]> },
    Undo,
    Redo,
    Clear,
    Checkpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub background: Option<String>,
    pub actions: Vec<Action>,
}

/// Final state after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub len: usize,
    pub position: isize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub document: CanvasDocument,
}

/// Load a replay script from disk.
pub fn load_script(path: impl AsRef<Path>) -> anyhow::Result<ReplayScript> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read replay script: {}", path.display()))?;
    let script: ReplayScript = serde_json::from_str(&data).context("parse replay script json")?;
    Ok(script)
}

/// Run every action in order against a new canvas and report where history ended up.
pub fn replay(script: &ReplayScript, config: HistoryConfig) -> anyhow::Result<ReplayReport> {
    let mut canvas = AnnotationCanvas::new(script.width, script.height);
    canvas.background = script.background.clone();
    let canvas = Rc::new(RefCell::new(canvas));

    let mut controller = UndoRedoController::bound(Rc::clone(&canvas), config)
        .context("create undo/redo controller")?;
    let mut tools = AnnotationTools::default();

    info!("Replaying {} action(s)", script.actions.len());
    for (i, action) in script.actions.iter().enumerate() {
        debug!("Action {}: {:?}", i, action);
        match action {
            Action::Tool { tool } => tools.set_tool(*tool),
            Action::Color { rgba: [r, g, b, a] } => {
                tools.set_color(Color32::from_rgba_unmultiplied(*r, *g, *b, *a))
            }
            Action::Width { width } => tools.stroke_width = *width,
            Action::Text { content } => tools.text = content.clone(),
            Action::Stroke { points } => {
                let points = points.iter().map(|[x, y]| pos2(*x, *y)).collect();
                let stroke = Stroke::from_points(points)
                    .ok_or_else(|| anyhow!("action {}: stroke has no points", i))?;
                tools.apply(&mut canvas.borrow_mut(), &stroke);
            }
            Action::Undo => {
                controller
                    .undo()
                    .with_context(|| format!("action {}: undo", i))?;
            }
            Action::Redo => {
                controller
                    .redo()
                    .with_context(|| format!("action {}: redo", i))?;
            }
            Action::Clear => controller.clear(),
            Action::Checkpoint => {
                controller
                    .checkpoint()
                    .with_context(|| format!("action {}: checkpoint", i))?;
            }
        }
    }

    let state = controller.state();
    let document = canvas.borrow().to_document();
    info!(
        len = state.len,
        position = state.position,
        objects = document.objects.len(),
        "Replay finished"
    );

    Ok(ReplayReport {
        len: state.len,
        position: state.position,
        can_undo: state.can_undo,
        can_redo: state.can_redo,
        document,
    })
}
