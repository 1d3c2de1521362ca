use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, ErrorKind};

/// A user-initiated pin of the audio link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualOverride {
    On,
    Off,
}

impl ManualOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManualOverride::On => "on",
            ManualOverride::Off => "off",
        }
    }
}

/// Immutable snapshot of the runtime, published on every meaningful change.
///
/// `detection_enabled` implies `auto_detection_available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub audio_active: bool,
    pub detection_enabled: bool,
    pub phone_detected: bool,
    pub auto_detection_available: bool,
    pub keybind_enabled: bool,
    pub manual_override: Option<ManualOverride>,
}

impl Default for RuntimeStatus {
    fn default() -> Self {
        Self {
            audio_active: false,
            detection_enabled: false,
            phone_detected: false,
            auto_detection_available: true,
            keybind_enabled: true,
            manual_override: None,
        }
    }
}

/// Error surfaced to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DomainError> for RuntimeError {
    fn from(err: &DomainError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Events published by the orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum RuntimeEvent {
    StatusChanged(RuntimeStatus),
    Error(RuntimeError),
}

/// Remembers the last emitted snapshot so identical snapshots are not re-sent.
#[derive(Debug, Default)]
pub struct StatusTracker {
    last: Option<RuntimeStatus>,
}

impl StatusTracker {
    /// Returns true when `status` must be emitted, and records it as the last one.
    pub fn should_emit(&mut self, status: RuntimeStatus, force: bool) -> bool {
        if !force && self.last == Some(status) {
            return false;
        }
        self.last = Some(status);
        true
    }

    pub fn last(&self) -> Option<RuntimeStatus> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_suppresses_identical_snapshots() {
        let mut tracker = StatusTracker::default();
        let status = RuntimeStatus::default();

        assert!(tracker.should_emit(status, false));
        assert!(!tracker.should_emit(status, false));

        let changed = RuntimeStatus {
            audio_active: true,
            ..status
        };
        assert!(tracker.should_emit(changed, false));
        assert_eq!(tracker.last(), Some(changed));
    }

    #[test]
    fn test_tracker_force_always_emits() {
        let mut tracker = StatusTracker::default();
        let status = RuntimeStatus::default();
        assert!(tracker.should_emit(status, true));
        assert!(tracker.should_emit(status, true));
    }

    #[test]
    fn test_override_field_participates_in_equality() {
        let mut tracker = StatusTracker::default();
        let status = RuntimeStatus::default();
        tracker.should_emit(status, false);

        let pinned = RuntimeStatus {
            manual_override: Some(ManualOverride::Off),
            ..status
        };
        assert!(tracker.should_emit(pinned, false));
    }

    #[test]
    fn test_runtime_error_from_domain_error() {
        let err = RuntimeError::from(&DomainError::NoTargetDevice);
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert_eq!(err.message, "No Bluetooth device configured");
    }
}
