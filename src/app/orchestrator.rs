use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::detection_runtime::{DetectionEvent, DetectionRuntime};
use crate::domain::policy::{decide, Debouncer, LinkCommand};
use crate::domain::status::StatusTracker;
use crate::domain::{
    AppConfig, DomainError, HotkeyAction, ManualOverride, RuntimeError, RuntimeEvent,
    RuntimeStatus,
};
use crate::ports::{AudioLink, ConfigStore, HotkeySource};

#[derive(Debug, Default)]
struct OrchestratorState {
    running: bool,
    detection_enabled: bool,
    auto_detection_available: bool,
    keybind_enabled: bool,
    audio_active: bool,
    phone_detected: bool,
    manual_override: Option<ManualOverride>,
    debouncer: Debouncer,
    device_id: String,
    webcam_index: i32,
}

impl OrchestratorState {
    fn snapshot(&self) -> RuntimeStatus {
        RuntimeStatus {
            audio_active: self.audio_active,
            detection_enabled: self.detection_enabled,
            phone_detected: self.phone_detected,
            auto_detection_available: self.auto_detection_available,
            keybind_enabled: self.keybind_enabled,
            manual_override: self.manual_override,
        }
    }
}

struct PumpTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    config_store: Arc<dyn ConfigStore>,
    audio: Arc<dyn AudioLink>,
    hotkeys: Arc<dyn HotkeySource>,
    detection: DetectionRuntime,
    /// Serialises start and stop against each other.
    lifecycle: tokio::sync::Mutex<()>,
    state: tokio::sync::Mutex<OrchestratorState>,
    tracker: Mutex<StatusTracker>,
    events: broadcast::Sender<RuntimeEvent>,
    pump: Mutex<Option<PumpTask>>,
}

/// Central state machine: detection samples, hotkeys and manual commands
/// in, audio link commands and status snapshots out.
///
/// Every mutation goes through one async mutex, including the awaited
/// connect or disconnect call, so concurrent triggers are applied in order.
/// Waiting on the detection loop always happens after that mutex is released.
#[derive(Clone)]
pub struct RuntimeOrchestrator {
    inner: Arc<Inner>,
}

impl RuntimeOrchestrator {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        audio: Arc<dyn AudioLink>,
        hotkeys: Arc<dyn HotkeySource>,
        detection: DetectionRuntime,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let state = OrchestratorState {
            auto_detection_available: detection.is_auto_detection_available(),
            keybind_enabled: true,
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                config_store,
                audio,
                hotkeys,
                detection,
                lifecycle: tokio::sync::Mutex::new(()),
                state: tokio::sync::Mutex::new(state),
                tracker: Mutex::new(StatusTracker::default()),
                events,
                pump: Mutex::new(None),
            }),
        }
    }

    /// Status changes and runtime errors.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.inner.events.subscribe()
    }

    pub async fn status(&self) -> RuntimeStatus {
        self.inner.state.lock().await.snapshot()
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.running
    }

    /// Load the persisted settings and bring every component up.
    pub async fn start(&self) {
        let inner = &self.inner;
        let _lifecycle = inner.lifecycle.lock().await;
        let mut state = inner.state.lock().await;
        if state.running {
            return;
        }

        let config = inner.config_store.load().unwrap_or_else(|err| {
            warn!(error = %err, "Failed to load config, using defaults");
            AppConfig::default()
        });

        let available = inner.detection.is_auto_detection_available();
        state.device_id = config.audio.device_id.trim().to_string();
        state.auto_detection_available = available;
        state.detection_enabled = config.detection.enabled && available;
        state.keybind_enabled = config.hotkeys.enabled;
        state.webcam_index = config.detection.webcam_index.max(0);
        state.manual_override = None;
        state.debouncer.reset();
        state.phone_detected = false;
        state.audio_active = inner.audio.is_connected();

        info!(
            device = %state.device_id,
            detection_enabled = state.detection_enabled,
            auto_detection_available = available,
            keybind_enabled = state.keybind_enabled,
            webcam_index = state.webcam_index,
            "Starting runtime"
        );

        // Subscribe before anything can publish.
        let detection_rx = inner.detection.subscribe();
        let hotkey_rx = inner.hotkeys.subscribe();
        let link_rx = inner.audio.subscribe();

        inner.detection.start(state.webcam_index);
        inner.detection.request_enabled(state.detection_enabled);

        inner.hotkeys.set_enabled(state.keybind_enabled);
        let hotkeys = inner.hotkeys.clone();
        match tokio::task::spawn_blocking(move || hotkeys.start()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => inner.report(&err),
            Err(join) => inner.report(&DomainError::Internal(join.to_string())),
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(pump(
            Arc::downgrade(inner),
            cancel.clone(),
            detection_rx,
            hotkey_rx,
            link_rx,
        ));
        *inner.pump.lock() = Some(PumpTask { cancel, handle });

        state.running = true;
        if state.device_id.is_empty() {
            inner.report(&DomainError::NoTargetDevice);
        }
        inner.publish(&state, true);
    }

    /// Tear everything down and drop the audio link.
    pub async fn stop(&self) {
        let inner = &self.inner;
        let _lifecycle = inner.lifecycle.lock().await;
        {
            let mut state = inner.state.lock().await;
            if !state.running {
                return;
            }
            state.running = false;
        }

        // Handlers already waiting on the state lock see `running == false`.
        let pump = inner.pump.lock().take();
        if let Some(pump) = pump {
            pump.cancel.cancel();
            if let Err(err) = pump.handle.await {
                warn!(error = %err, "Event pump ended abnormally");
            }
        }

        let hotkeys = inner.hotkeys.clone();
        if let Err(err) = tokio::task::spawn_blocking(move || hotkeys.stop()).await {
            warn!(error = %err, "Stopping hotkeys failed");
        }
        // May wait out a blocking camera open; status readers stay unblocked.
        inner.detection.stop().await;

        let mut state = inner.state.lock().await;
        if let Err(err) = inner.audio.disconnect().await {
            inner.report(&err);
        }
        state.audio_active = inner.audio.is_connected();
        state.debouncer.reset();
        state.phone_detected = false;

        info!("Runtime stopped");
        inner.publish(&state, true);
    }

    /// Flip the link and pin the result as a manual override.
    pub async fn toggle_audio(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.toggle_audio_locked(&mut state).await;
    }

    /// Pin the link off and disconnect unconditionally.
    pub async fn disconnect_audio(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        state.manual_override = Some(ManualOverride::Off);
        inner.execute(&mut state, LinkCommand::Disconnect).await;
        inner.publish(&state, false);
    }

    pub async fn set_auto_enabled(&self, enabled: bool) {
        let release = {
            let mut state = self.inner.state.lock().await;
            self.inner.set_auto_enabled_locked(&mut state, enabled)
        };
        if release {
            self.inner.detection.release_if_disabled().await;
        }
    }

    pub async fn set_keybind_enabled(&self, enabled: bool) {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        state.keybind_enabled = enabled;
        inner.hotkeys.set_enabled(enabled);
        inner.publish(&state, false);
    }

    pub async fn set_webcam_index(&self, index: i32) {
        let inner = &self.inner;
        let running = {
            let mut state = inner.state.lock().await;
            state.webcam_index = index.max(0);
            if state.running {
                inner.detection.request_camera_index(state.webcam_index);
            }
            state.running
        };
        if running {
            inner.detection.release_camera().await;
        }
    }

    pub async fn clear_manual_override(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        state.manual_override = None;
        inner.publish(&state, false);
    }
}

impl Inner {
    fn report(&self, err: &DomainError) {
        warn!(error = %err, kind = ?err.kind(), "Runtime error");
        let _ = self.events.send(RuntimeEvent::Error(RuntimeError::from(err)));
    }

    fn forward(&self, err: RuntimeError) {
        let _ = self.events.send(RuntimeEvent::Error(err));
    }

    fn publish(&self, state: &OrchestratorState, force: bool) {
        let status = state.snapshot();
        if self.tracker.lock().should_emit(status, force) {
            debug!(?status, force, "Publishing status");
            let _ = self.events.send(RuntimeEvent::StatusChanged(status));
        }
    }

    async fn toggle_audio_locked(&self, state: &mut OrchestratorState) {
        if !state.running {
            return;
        }

        if state.audio_active {
            state.manual_override = Some(ManualOverride::Off);
            self.execute(state, LinkCommand::Disconnect).await;
        } else {
            state.manual_override = Some(ManualOverride::On);
            self.execute(state, LinkCommand::Connect).await;
        }
        self.publish(state, false);
    }

    /// Returns true when the caller must release detection resources once
    /// the state lock is dropped.
    fn set_auto_enabled_locked(&self, state: &mut OrchestratorState, enabled: bool) -> bool {
        let available = self.detection.is_auto_detection_available();
        state.auto_detection_available = available;
        if enabled && !available {
            self.report(&DomainError::ModelUnavailable);
        }

        let effective = enabled && available;
        state.detection_enabled = effective;
        if !effective {
            state.debouncer.reset();
            state.phone_detected = false;
        }
        if state.running {
            self.detection.request_enabled(effective);
        }
        info!(enabled = effective, "Auto-detection updated");
        self.publish(state, false);
        state.running && !effective
    }

    /// Run one link command and fold the outcome into `audio_active`.
    async fn execute(&self, state: &mut OrchestratorState, command: LinkCommand) {
        match command {
            LinkCommand::Connect => {
                if state.device_id.is_empty() {
                    self.report(&DomainError::NoTargetDevice);
                    state.audio_active = false;
                    return;
                }

                info!(device = %state.device_id, "Connecting audio");
                if let Err(err) = self.audio.connect(&state.device_id).await {
                    self.report(&err);
                }
            }
            LinkCommand::Disconnect => {
                info!("Disconnecting audio");
                if let Err(err) = self.audio.disconnect().await {
                    self.report(&err);
                }
            }
        }
        state.audio_active = self.audio.is_connected();
    }

    /// One processed frame: debounce, decide, act, then publish once.
    ///
    /// `phone_detected` follows the debounced decision, so a flickering
    /// detector does not churn the status.
    async fn handle_sample(&self, detected: bool) {
        let mut state = self.state.lock().await;
        if !state.running {
            return;
        }

        let enabled = state.detection_enabled;
        let auto_wants_on = state.debouncer.observe(enabled, detected);
        if let Some(present) = auto_wants_on {
            state.phone_detected = present;
        }
        let command = decide(
            state.keybind_enabled,
            state.manual_override,
            auto_wants_on,
            state.audio_active,
        );

        if let Some(command) = command {
            debug!(?command, ?auto_wants_on, "Detection decision");
            self.execute(&mut state, command).await;
        }
        self.publish(&state, false);
    }

    async fn handle_hotkey(&self, action: HotkeyAction) {
        let mut state = self.state.lock().await;
        if !state.running || !state.keybind_enabled {
            return;
        }

        info!(?action, "Hotkey action");
        match action {
            HotkeyAction::ToggleAudio => self.toggle_audio_locked(&mut state).await,
            HotkeyAction::ToggleDetection => {
                let enabled = !state.detection_enabled;
                let release = self.set_auto_enabled_locked(&mut state, enabled);
                drop(state);
                if release {
                    self.detection.release_if_disabled().await;
                }
            }
        }
    }

    async fn handle_link_state(&self, connected: bool) {
        let mut state = self.state.lock().await;
        state.audio_active = connected;
        self.publish(&state, false);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.get_mut().take() {
            pump.cancel.cancel();
        }
    }
}

/// Unpack a broadcast result; `None` means the channel is gone.
fn received<T>(result: Result<T, RecvError>, source: &str) -> Option<Option<T>> {
    match result {
        Ok(value) => Some(Some(value)),
        Err(RecvError::Lagged(skipped)) => {
            warn!(source, skipped, "Event pump lagged");
            Some(None)
        }
        Err(RecvError::Closed) => None,
    }
}

async fn pump(
    inner: Weak<Inner>,
    cancel: CancellationToken,
    mut detection_rx: broadcast::Receiver<DetectionEvent>,
    mut hotkey_rx: broadcast::Receiver<HotkeyAction>,
    mut link_rx: broadcast::Receiver<bool>,
) {
    debug!("Event pump started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = detection_rx.recv() => {
                let Some(event) = received(event, "detection") else { break };
                let (Some(event), Some(inner)) = (event, inner.upgrade()) else { continue };
                match event {
                    DetectionEvent::Sample(detected) => inner.handle_sample(detected).await,
                    // Raw per-frame edges; the status follows the debounced samples.
                    DetectionEvent::Changed(_) => {}
                    DetectionEvent::Error(err) => inner.forward(err),
                }
            }
            action = hotkey_rx.recv() => {
                let Some(action) = received(action, "hotkeys") else { break };
                if let (Some(action), Some(inner)) = (action, inner.upgrade()) {
                    inner.handle_hotkey(action).await;
                }
            }
            connected = link_rx.recv() => {
                let Some(connected) = received(connected, "audio link") else { break };
                if let (Some(connected), Some(inner)) = (connected, inner.upgrade()) {
                    inner.handle_link_state(connected).await;
                }
            }
        }

        if inner.strong_count() == 0 {
            break;
        }
    }
    debug!("Event pump stopped");
}
