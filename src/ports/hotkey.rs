use tokio::sync::broadcast;

use crate::domain::{DomainError, HotkeyAction};

/// Port for system-wide keyboard shortcuts.
pub trait HotkeySource: Send + Sync {
    /// Register the bindings and start listening. Blocking; call off the async runtime.
    ///
    /// Calling `start` on a running source is a no-op.
    fn start(&self) -> Result<(), DomainError>;

    /// Unregister and stop listening. Joins the listener thread.
    fn stop(&self);

    /// Presses are delivered only while enabled.
    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<HotkeyAction>;
}
