// History toolbar for the editor view.

use egui::{Button, Key, KeyboardShortcut, Modifiers, Ui};
use tracing::{debug, warn};

use crate::editor::canvas::Canvas;
use crate::editor::history::{EditorError, UndoRedoController};

const UNDO_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
const REDO_SHORTCUT: KeyboardShortcut =
    KeyboardShortcut::new(Modifiers::COMMAND.plus(Modifiers::SHIFT), Key::Z);
const REDO_SHORTCUT_ALT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Undo,
    Redo,
    Clear,
}

impl ToolbarAction {
    /// Run the action. Returns true if the canvas or history changed.
    pub fn apply<C: Canvas>(
        self,
        controller: &mut UndoRedoController<C>,
    ) -> Result<bool, EditorError> {
        match self {
            ToolbarAction::Undo => controller.undo(),
            ToolbarAction::Redo => controller.redo(),
            ToolbarAction::Clear => {
                let had_history = !controller.history().is_empty();
                controller.clear();
                Ok(had_history)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryToolbar {
    /// Show the position counter next to the buttons.
    pub show_position: bool,
}

impl HistoryToolbar {
    /// Draw Undo / Redo / Clear and run whatever was clicked or pressed.
    pub fn show<C: Canvas>(
        &self,
        ui: &mut Ui,
        controller: &mut UndoRedoController<C>,
    ) -> Option<ToolbarAction> {
        let state = controller.state();
        let mut action = shortcut_action(ui);

        ui.horizontal(|ui| {
            let undo = ui
                .add_enabled(state.can_undo, Button::new("Undo"))
                .on_hover_text(ui.ctx().format_shortcut(&UNDO_SHORTCUT));
            if undo.clicked() {
                action = Some(ToolbarAction::Undo);
            }

            let redo = ui
                .add_enabled(state.can_redo, Button::new("Redo"))
                .on_hover_text(ui.ctx().format_shortcut(&REDO_SHORTCUT));
            if redo.clicked() {
                action = Some(ToolbarAction::Redo);
            }

            if ui
                .add_enabled(state.len > 0, Button::new("Clear history"))
                .clicked()
            {
                action = Some(ToolbarAction::Clear);
            }

            if self.show_position {
                ui.label(format!("{}/{}", state.position + 1, state.len));
            }
        });

        let action = action?;
        debug!("Toolbar action {:?}", action);
        if let Err(err) = action.apply(controller) {
            warn!("{:?} failed: {}", action, err);
        }
        Some(action)
    }
}

/// Keyboard shortcuts, checked before the buttons so one frame runs at most one action.
fn shortcut_action(ui: &Ui) -> Option<ToolbarAction> {
    ui.input_mut(|input| {
        // Redo first: the undo shortcut would also match Cmd+Shift+Z.
        if input.consume_shortcut(&REDO_SHORTCUT) || input.consume_shortcut(&REDO_SHORTCUT_ALT) {
            Some(ToolbarAction::Redo)
        } else if input.consume_shortcut(&UNDO_SHORTCUT) {
            Some(ToolbarAction::Undo)
        } else {
            None
        }
    })
}
