use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::config::HotkeyConfig;
use crate::domain::{DomainError, HotkeyAction};
use crate::ports::HotkeySource;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

struct Listener {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// [`HotkeySource`] backed by a `GlobalHotKeyManager` on its own thread.
///
/// The manager is created, used and dropped on that thread. On Windows the
/// thread also pumps its message queue, which is where `WM_HOTKEY` arrives.
pub struct GlobalHotkeySource {
    config: HotkeyConfig,
    enabled: Arc<AtomicBool>,
    tx: broadcast::Sender<HotkeyAction>,
    listener: Mutex<Option<Listener>>,
}

impl GlobalHotkeySource {
    pub fn new(config: HotkeyConfig) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            enabled: Arc::new(AtomicBool::new(config.enabled)),
            config,
            tx,
            listener: Mutex::new(None),
        }
    }
}

impl HotkeySource for GlobalHotkeySource {
    fn start(&self) -> Result<(), DomainError> {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return Ok(());
        }

        let (bindings, rejected) = parse_bindings(&self.config);
        for (binding, err) in &rejected {
            warn!(binding = %binding, error = %err, "Ignoring invalid hotkey binding");
        }

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let context = ListenerContext {
            bindings,
            enabled: self.enabled.clone(),
            tx: self.tx.clone(),
            stop: stop.clone(),
        };

        let handle = thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || context.run(ready_tx))
            .map_err(|e| DomainError::Hotkey(format!("Failed to spawn listener: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *listener = Some(Listener { stop, handle });
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(DomainError::Hotkey("Listener exited during startup".to_string()))
            }
        }
    }

    fn stop(&self) {
        let Some(listener) = self.listener.lock().take() else {
            return;
        };

        listener.stop.store(true, Ordering::SeqCst);
        listener.handle.thread().unpark();
        if listener.handle.join().is_err() {
            warn!("Hotkey listener panicked");
        }
        info!("Hotkey listener stopped");
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        debug!(enabled, "Hotkeys toggled");
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<HotkeyAction> {
        self.tx.subscribe()
    }
}

impl Drop for GlobalHotkeySource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Parse every configured binding, splitting out the ones that do not parse.
fn parse_bindings(config: &HotkeyConfig) -> (Vec<(HotKey, HotkeyAction)>, Vec<(String, String)>) {
    let mut parsed = Vec::new();
    let mut rejected = Vec::new();

    for action in HotkeyAction::ALL {
        let binding = action.binding(config);
        match HotKey::from_str(binding) {
            Ok(hotkey) => parsed.push((hotkey, action)),
            Err(e) => rejected.push((binding.to_string(), e.to_string())),
        }
    }

    (parsed, rejected)
}

/// Map a raw event to an action. Only presses count, and only while enabled.
fn route(
    actions: &HashMap<u32, HotkeyAction>,
    id: u32,
    state: HotKeyState,
    enabled: bool,
) -> Option<HotkeyAction> {
    if !enabled || state != HotKeyState::Pressed {
        return None;
    }
    actions.get(&id).copied()
}

struct ListenerContext {
    bindings: Vec<(HotKey, HotkeyAction)>,
    enabled: Arc<AtomicBool>,
    tx: broadcast::Sender<HotkeyAction>,
    stop: Arc<AtomicBool>,
}

/// Unregisters everything when the listener thread exits.
struct Registrations {
    manager: GlobalHotKeyManager,
    hotkeys: Vec<HotKey>,
}

impl Drop for Registrations {
    fn drop(&mut self) {
        for hotkey in &self.hotkeys {
            let _ = self.manager.unregister(*hotkey);
        }
        debug!(count = self.hotkeys.len(), "Hotkeys unregistered");
    }
}

impl ListenerContext {
    fn run(self, ready: mpsc::Sender<Result<(), DomainError>>) {
        let manager = match GlobalHotKeyManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                let _ = ready.send(Err(DomainError::Hotkey(e.to_string())));
                return;
            }
        };

        let mut registrations = Registrations {
            manager,
            hotkeys: Vec::new(),
        };
        let mut actions = HashMap::new();

        for (hotkey, action) in &self.bindings {
            match registrations.manager.register(*hotkey) {
                Ok(()) => {
                    info!(action = ?action, hotkey = ?hotkey, "Hotkey registered");
                    registrations.hotkeys.push(*hotkey);
                    actions.insert(hotkey.id(), *action);
                }
                Err(e) => {
                    warn!(action = ?action, hotkey = ?hotkey, error = %e, "Hotkey registration failed");
                }
            }
        }

        let _ = ready.send(Ok(()));
        let events = GlobalHotKeyEvent::receiver();

        while !self.stop.load(Ordering::SeqCst) {
            #[cfg(target_os = "windows")]
            pump_messages();

            while let Ok(event) = events.try_recv() {
                let enabled = self.enabled.load(Ordering::SeqCst);
                if let Some(action) = route(&actions, event.id, event.state, enabled) {
                    debug!(action = ?action, "Hotkey pressed");
                    let _ = self.tx.send(action);
                }
            }

            thread::park_timeout(POLL_INTERVAL);
        }

        drop(registrations);
    }
}

#[cfg(target_os = "windows")]
#[allow(unsafe_code)]
fn pump_messages() {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
    };

    let mut msg = MSG::default();
    // SAFETY: `msg` is a valid, exclusively borrowed MSG for every call.
    unsafe {
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
