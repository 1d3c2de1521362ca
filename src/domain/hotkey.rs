use serde::{Deserialize, Serialize};

use crate::domain::config::HotkeyConfig;

/// Action bound to a global shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyAction {
    /// Ctrl+Alt+C by default.
    ToggleAudio,
    /// Ctrl+Alt+W by default.
    ToggleDetection,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 2] = [HotkeyAction::ToggleAudio, HotkeyAction::ToggleDetection];

    /// Configured binding for this action.
    pub fn binding<'a>(&self, config: &'a HotkeyConfig) -> &'a str {
        match self {
            HotkeyAction::ToggleAudio => &config.toggle_audio,
            HotkeyAction::ToggleDetection => &config.toggle_detection,
        }
    }
}
