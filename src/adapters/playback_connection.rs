use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use windows::core::{IInspectable, HSTRING};
use windows::Devices::Enumeration::DeviceInformation;
use windows::Foundation::TypedEventHandler;
use windows::Media::Audio::{
    AudioPlaybackConnection, AudioPlaybackConnectionOpenResultStatus, AudioPlaybackConnectionState,
};

use crate::adapters::link_state::{run_bounded, ConnectionSignal};
use crate::domain::{DeviceIdentifier, DomainError};
use crate::ports::AudioLink;

struct OpenConnection {
    connection: AudioPlaybackConnection,
    state_token: i64,
}

impl OpenConnection {
    fn close(self) {
        let _ = self.connection.RemoveStateChanged(self.state_token);
        let _ = self.connection.Close();
    }
}

#[derive(Default)]
struct PlaybackState {
    /// Resolved native id, cached across connects.
    resolved: Option<(String, String)>,
    open: Option<OpenConnection>,
}

/// [`AudioLink`] that makes this PC the A2DP sink for the phone, through
/// `AudioPlaybackConnection` (Windows 10 2004+).
///
/// WinRT async calls are awaited with the blocking `get()` on the blocking
/// pool, bounded by the configured timeout.
pub struct PlaybackConnectionLink {
    timeout: Duration,
    signal: Arc<ConnectionSignal>,
    state: Arc<Mutex<PlaybackState>>,
}

impl PlaybackConnectionLink {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            signal: Arc::new(ConnectionSignal::new()),
            state: Arc::new(Mutex::new(PlaybackState::default())),
        }
    }
}

fn winrt_err(e: windows::core::Error) -> DomainError {
    DomainError::AudioLink(e.message().to_string())
}

/// Find the playback-capable device whose id embeds the given MAC.
fn resolve_native_id(id: &DeviceIdentifier) -> Result<String, DomainError> {
    let needle = match (id, id.compact_hex()) {
        (DeviceIdentifier::Native(native), _) => return Ok(native.clone()),
        (_, Some(hex)) => hex,
        _ => return Err(DomainError::InvalidDeviceIdentifier(id.to_string())),
    };

    let selector = AudioPlaybackConnection::GetDeviceSelector().map_err(winrt_err)?;
    let devices = DeviceInformation::FindAllAsyncAqsFilter(&selector)
        .and_then(|op| op.get())
        .map_err(winrt_err)?;

    for device in devices {
        let device_id = device.Id().map_err(winrt_err)?.to_string();
        if device_id.to_uppercase().contains(&needle) {
            debug!(device_id = %device_id, "Resolved playback device");
            return Ok(device_id);
        }
    }

    Err(DomainError::AudioLink(format!(
        "{} is not paired as an audio source",
        id
    )))
}

fn open(native_id: &str, signal: Arc<ConnectionSignal>) -> Result<OpenConnection, DomainError> {
    let connection =
        AudioPlaybackConnection::TryCreateFromId(&HSTRING::from(native_id)).map_err(winrt_err)?;

    let watched = connection.clone();
    let handler = TypedEventHandler::<AudioPlaybackConnection, IInspectable>::new(move |_, _| {
        match watched.State()? {
            AudioPlaybackConnectionState::Opened => {
                signal.set(true);
            }
            AudioPlaybackConnectionState::Closed => {
                signal.set(false);
            }
            _ => {}
        }
        Ok(())
    });
    let state_token = connection.StateChanged(&handler).map_err(winrt_err)?;
    let open = OpenConnection {
        connection,
        state_token,
    };

    let opened = open
        .connection
        .StartAsync()
        .and_then(|op| op.get())
        .and_then(|_| open.connection.OpenAsync())
        .and_then(|op| op.get())
        .and_then(|result| result.Status());

    match opened {
        Ok(AudioPlaybackConnectionOpenResultStatus::Success) => Ok(open),
        Ok(status) => {
            open.close();
            Err(DomainError::AudioLink(format!(
                "Playback connection refused: {:?}",
                status
            )))
        }
        Err(e) => {
            open.close();
            Err(winrt_err(e))
        }
    }
}

#[async_trait]
impl AudioLink for PlaybackConnectionLink {
    async fn connect(&self, device_id: &str) -> Result<(), DomainError> {
        let id = DeviceIdentifier::parse(device_id)?;

        let mut state = self.state.lock().await;
        if self.signal.get() {
            return Ok(());
        }
        if let Some(stale) = state.open.take() {
            stale.close();
        }

        let native_id = match &state.resolved {
            Some((configured, native)) if configured == device_id => native.clone(),
            _ => {
                let lookup = id.clone();
                let native = run_bounded(
                    self.timeout,
                    move || resolve_native_id(&lookup),
                    |_: String| async {},
                )
                .await?;
                state.resolved = Some((device_id.to_string(), native.clone()));
                native
            }
        };

        info!(device = %id, "Opening playback connection");
        let signal = self.signal.clone();
        let target = native_id.clone();
        // An open that outlives the timeout may still raise the signal; close
        // it and lower the signal unless a newer connection owns the link.
        let owner = self.state.clone();
        let late_signal = self.signal.clone();
        let close_orphan = move |orphan: OpenConnection| async move {
            let owner = owner.lock().await;
            warn!("Closing playback connection that opened after the timeout");
            orphan.close();
            if owner.open.is_none() {
                late_signal.set(false);
            }
        };

        match run_bounded(self.timeout, move || open(&target, signal), close_orphan).await {
            Ok(open) => {
                state.open = Some(open);
                self.signal.set(true);
                info!(device = %id, "Audio connected");
                Ok(())
            }
            Err(err) => {
                // Ids can go stale after re-pairing.
                state.resolved = None;
                warn!(device = %id, error = %err, "Audio connect failed");
                Err(err)
            }
        }
    }

    async fn disconnect(&self) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        if let Some(open) = state.open.take() {
            info!("Closing playback connection");
            open.close();
        }
        self.signal.set(false);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.signal.get()
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.signal.subscribe()
    }
}
