use std::io::{self, Write};
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::app::RuntimeOrchestrator;
use crate::domain::RuntimeStatus;

/// A parsed control command, one per stdin line:
///
/// ```text
/// toggle_audio | toggle_detection | disconnect_audio | get_status
/// set_keybind_enabled:<bool> | set_auto_enabled:<bool>
/// set_webcam_index:<int> | clear_manual_override | exit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleAudio,
    ToggleDetection,
    DisconnectAudio,
    GetStatus,
    SetKeybindEnabled(bool),
    SetAutoEnabled(bool),
    SetWebcamIndex(i32),
    ClearManualOverride,
    Exit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("invalid webcam index: {0}")]
    InvalidIndex(String),
}

/// `1`, `true` and `yes` are true; anything else is false.
fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes")
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().to_lowercase();
        if line.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let (name, arg) = match line.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (line.as_str(), None),
        };

        let command = match (name, arg) {
            ("toggle_audio", None) => Command::ToggleAudio,
            ("toggle_detection", None) => Command::ToggleDetection,
            ("disconnect_audio", None) => Command::DisconnectAudio,
            ("get_status", None) => Command::GetStatus,
            ("clear_manual_override", None) => Command::ClearManualOverride,
            ("exit", None) => Command::Exit,
            ("set_keybind_enabled", Some(value)) => Command::SetKeybindEnabled(parse_flag(value)),
            ("set_auto_enabled", Some(value)) => Command::SetAutoEnabled(parse_flag(value)),
            ("set_webcam_index", Some(value)) => Command::SetWebcamIndex(
                value
                    .parse()
                    .map_err(|_| CommandParseError::InvalidIndex(value.to_string()))?,
            ),
            _ => return Err(CommandParseError::Unknown(line.clone())),
        };

        Ok(command)
    }
}

/// What the caller should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

/// Render a snapshot as protocol lines.
pub fn status_lines(status: &RuntimeStatus) -> Vec<String> {
    let manual_override = status
        .manual_override
        .map(|o| o.as_str())
        .unwrap_or("none");

    vec![
        format!("STATUS:detection_enabled:{}", status.detection_enabled),
        format!("STATUS:phone_detected:{}", status.phone_detected),
        format!("STATUS:audio_active:{}", status.audio_active),
        format!("STATUS:keybind_enabled:{}", status.keybind_enabled),
        format!("STATUS:manual_override:{}", manual_override),
        format!(
            "STATUS:auto_detection_available:{}",
            status.auto_detection_available
        ),
    ]
}

/// Run one command against the orchestrator, writing any reply to `out`.
pub async fn execute<W: Write>(
    orchestrator: &RuntimeOrchestrator,
    command: Command,
    out: &mut W,
) -> io::Result<CommandOutcome> {
    info!(?command, "Control command");

    match command {
        Command::ToggleAudio => orchestrator.toggle_audio().await,
        Command::ToggleDetection => {
            let enabled = !orchestrator.status().await.detection_enabled;
            orchestrator.set_auto_enabled(enabled).await;
            let status = orchestrator.status().await;
            writeln!(out, "STATUS:detection_enabled:{}", status.detection_enabled)?;
        }
        Command::DisconnectAudio => orchestrator.disconnect_audio().await,
        Command::GetStatus => {
            for line in status_lines(&orchestrator.status().await) {
                writeln!(out, "{}", line)?;
            }
        }
        Command::SetKeybindEnabled(enabled) => orchestrator.set_keybind_enabled(enabled).await,
        Command::SetAutoEnabled(enabled) => orchestrator.set_auto_enabled(enabled).await,
        Command::SetWebcamIndex(index) if index < 0 => {
            warn!(index, "Ignoring negative webcam index");
        }
        Command::SetWebcamIndex(index) => orchestrator.set_webcam_index(index).await,
        Command::ClearManualOverride => orchestrator.clear_manual_override().await,
        Command::Exit => return Ok(CommandOutcome::Exit),
    }

    out.flush()?;
    Ok(CommandOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::{
        InactiveHotkeys, LocalModelStore, TomlConfigStore, UnavailableCamera, UnavailableInference,
        UnsupportedAudioLink, YoloDetectorLoader,
    };
    use crate::app::{DetectionRuntime, LoopSettings};
    use crate::domain::{DetectorSettings, ManualOverride};

    #[test]
    fn test_parse_plain_commands() {
        assert_eq!("toggle_audio".parse::<Command>(), Ok(Command::ToggleAudio));
        assert_eq!("  TOGGLE_DETECTION \n".parse::<Command>(), Ok(Command::ToggleDetection));
        assert_eq!("get_status".parse::<Command>(), Ok(Command::GetStatus));
        assert_eq!("Exit".parse::<Command>(), Ok(Command::Exit));
        assert_eq!(
            "clear_manual_override".parse::<Command>(),
            Ok(Command::ClearManualOverride)
        );
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(
            "set_keybind_enabled:yes".parse::<Command>(),
            Ok(Command::SetKeybindEnabled(true))
        );
        assert_eq!(
            "set_auto_enabled: 1".parse::<Command>(),
            Ok(Command::SetAutoEnabled(true))
        );
        assert_eq!(
            "set_auto_enabled:TRUE".parse::<Command>(),
            Ok(Command::SetAutoEnabled(true))
        );
        assert_eq!(
            "set_auto_enabled:on".parse::<Command>(),
            Ok(Command::SetAutoEnabled(false))
        );
    }

    #[test]
    fn test_parse_webcam_index() {
        assert_eq!("set_webcam_index:2".parse::<Command>(), Ok(Command::SetWebcamIndex(2)));
        assert_eq!(
            "set_webcam_index:-1".parse::<Command>(),
            Ok(Command::SetWebcamIndex(-1))
        );
        assert_eq!(
            "set_webcam_index:front".parse::<Command>(),
            Err(CommandParseError::InvalidIndex("front".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!("".parse::<Command>(), Err(CommandParseError::Empty));
        assert!(matches!(
            "toggle_audio:now".parse::<Command>(),
            Err(CommandParseError::Unknown(_))
        ));
        assert!(matches!(
            "reboot".parse::<Command>(),
            Err(CommandParseError::Unknown(_))
        ));
    }

    #[test]
    fn test_status_lines() {
        let status = RuntimeStatus {
            manual_override: Some(ManualOverride::Off),
            ..Default::default()
        };
        let lines = status_lines(&status);
        assert_eq!(lines[0], "STATUS:detection_enabled:false");
        assert_eq!(lines[3], "STATUS:keybind_enabled:true");
        assert_eq!(lines[4], "STATUS:manual_override:off");
        assert_eq!(
            status_lines(&RuntimeStatus::default())[4],
            "STATUS:manual_override:none"
        );
    }

    /// Runtime with no camera, no model and no Bluetooth backend.
    fn headless(dir: &std::path::Path) -> RuntimeOrchestrator {
        let detection = DetectionRuntime::new(
            Arc::new(UnavailableCamera),
            Arc::new(YoloDetectorLoader::new(
                Arc::new(UnavailableInference),
                DetectorSettings::default(),
            )),
            Arc::new(LocalModelStore::with_search_dirs(None, Vec::new())),
            LoopSettings::default(),
        );
        RuntimeOrchestrator::new(
            Arc::new(TomlConfigStore::with_data_dir(dir).unwrap()),
            Arc::new(UnsupportedAudioLink::default()),
            Arc::new(InactiveHotkeys::new(true)),
            detection,
        )
    }

    #[tokio::test]
    async fn test_execute_against_headless_runtime() {
        let temp = tempfile::tempdir().unwrap();
        let orchestrator = headless(temp.path());
        orchestrator.start().await;

        let mut out = Vec::new();
        let outcome = execute(&orchestrator, Command::GetStatus, &mut out)
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Continue);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("STATUS:audio_active:false\n"));
        assert!(text.contains("STATUS:auto_detection_available:false\n"));

        // No model: toggling detection stays off.
        let mut out = Vec::new();
        execute(&orchestrator, Command::ToggleDetection, &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "STATUS:detection_enabled:false\n");

        let mut sink = Vec::new();
        execute(&orchestrator, Command::SetKeybindEnabled(false), &mut sink)
            .await
            .unwrap();
        assert!(!orchestrator.status().await.keybind_enabled);

        execute(&orchestrator, Command::DisconnectAudio, &mut sink)
            .await
            .unwrap();
        assert_eq!(
            orchestrator.status().await.manual_override,
            Some(ManualOverride::Off)
        );

        let outcome = execute(&orchestrator, Command::Exit, &mut sink)
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Exit);
        orchestrator.stop().await;
    }
}
