use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::link_state::ConnectionSignal;
use crate::domain::{DeviceIdentifier, DomainError};
use crate::ports::AudioLink;

const BLUEZ_SERVICE: &str = "org.bluez";
const DEVICE_INTERFACE: &str = "org.bluez.Device1";

/// A2DP Audio Source service class.
const A2DP_SOURCE_UUID: &str = "0000110a-0000-1000-8000-00805f9b34fb";

/// How often a connected device is checked for a drop initiated elsewhere.
const WATCH_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Default)]
struct BluezState {
    bus: Option<zbus::Connection>,
    device_path: Option<String>,
    watcher: Option<CancellationToken>,
}

/// [`AudioLink`] backed by BlueZ `Device1.ConnectProfile` on the system bus.
///
/// The host plays the A2DP sink role, so BlueZ needs a sink endpoint
/// registered (PipeWire and PulseAudio both do this).
pub struct BluezAudioLink {
    adapter: String,
    timeout: Duration,
    signal: Arc<ConnectionSignal>,
    state: Mutex<BluezState>,
}

impl BluezAudioLink {
    pub fn new(adapter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            adapter: adapter.into(),
            timeout,
            signal: Arc::new(ConnectionSignal::new()),
            state: Mutex::new(BluezState::default()),
        }
    }

    async fn bus(state: &mut BluezState) -> Result<zbus::Connection, DomainError> {
        if let Some(bus) = &state.bus {
            return Ok(bus.clone());
        }

        let bus = zbus::Connection::system()
            .await
            .map_err(|e| DomainError::AudioLink(format!("Failed to connect to system D-Bus: {}", e)))?;
        state.bus = Some(bus.clone());
        Ok(bus)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = zbus::Result<T>>,
    ) -> Result<T, DomainError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| DomainError::AudioLink(e.to_string())),
            Err(_) => Err(DomainError::AudioLinkTimeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Poll `Connected` until the device drops or the token is cancelled.
    fn spawn_watcher(&self, bus: zbus::Connection, path: String) -> CancellationToken {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let signal = self.signal.clone();

        tokio::spawn(async move {
            let proxy =
                match zbus::Proxy::new(&bus, BLUEZ_SERVICE, path.as_str(), DEVICE_INTERFACE).await {
                    Ok(proxy) => proxy,
                    Err(e) => {
                        warn!(path = %path, error = %e, "Cannot watch device state");
                        return;
                    }
                };

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(WATCH_INTERVAL) => {}
                }

                match proxy.get_property::<bool>("Connected").await {
                    Ok(true) => {}
                    Ok(false) => {
                        info!(path = %path, "Device disconnected");
                        signal.set(false);
                        break;
                    }
                    Err(e) => debug!(path = %path, error = %e, "Connected property unavailable"),
                }
            }
        });

        token
    }
}

#[async_trait]
impl AudioLink for BluezAudioLink {
    async fn connect(&self, device_id: &str) -> Result<(), DomainError> {
        let id = DeviceIdentifier::parse(device_id)?;
        let path = id.bluez_path(&self.adapter)?;

        let mut state = self.state.lock().await;
        if self.signal.get() {
            return Ok(());
        }

        let bus = Self::bus(&mut state).await?;
        info!(device = %id, path = %path, "Connecting A2DP source profile");

        let result = self
            .bounded(async {
                let proxy =
                    zbus::Proxy::new(&bus, BLUEZ_SERVICE, path.as_str(), DEVICE_INTERFACE).await?;
                let _: () = proxy.call("ConnectProfile", &(A2DP_SOURCE_UUID,)).await?;
                Ok::<(), zbus::Error>(())
            })
            .await;

        if let Err(err) = result {
            warn!(device = %id, error = %err, "Audio connect failed");
            return Err(err);
        }

        if let Some(old) = state.watcher.replace(self.spawn_watcher(bus, path.clone())) {
            old.cancel();
        }
        state.device_path = Some(path);
        self.signal.set(true);
        info!(device = %id, "Audio connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        if let Some(watcher) = state.watcher.take() {
            watcher.cancel();
        }

        let Some(path) = state.device_path.take() else {
            self.signal.set(false);
            return Ok(());
        };

        let bus = Self::bus(&mut state).await?;
        info!(path = %path, "Disconnecting A2DP source profile");

        let result = self
            .bounded(async {
                let proxy =
                    zbus::Proxy::new(&bus, BLUEZ_SERVICE, path.as_str(), DEVICE_INTERFACE).await?;
                let _: () = proxy
                    .call("DisconnectProfile", &(A2DP_SOURCE_UUID,))
                    .await?;
                Ok::<(), zbus::Error>(())
            })
            .await;

        self.signal.set(false);
        if let Err(err) = &result {
            warn!(path = %path, error = %err, "Audio disconnect failed");
        }
        result
    }

    fn is_connected(&self) -> bool {
        self.signal.get()
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.signal.subscribe()
    }
}
