use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::DomainError;

/// Port for the Bluetooth A2DP audio link to the phone.
///
/// The host acts as the audio sink; connecting routes the phone's media
/// audio to this machine.
#[async_trait]
pub trait AudioLink: Send + Sync {
    /// Connect to `device_id` (MAC address or native platform id).
    ///
    /// Fails with `NoTargetDevice` for an empty id. Connecting while already
    /// connected succeeds without doing anything.
    async fn connect(&self, device_id: &str) -> Result<(), DomainError>;

    /// Disconnect. Succeeds when nothing is connected.
    async fn disconnect(&self) -> Result<(), DomainError>;

    fn is_connected(&self) -> bool;

    /// Connected/disconnected transitions, including ones the platform
    /// reports on its own (phone walked away, link dropped).
    fn subscribe(&self) -> broadcast::Receiver<bool>;
}
