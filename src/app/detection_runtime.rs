use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::config::DetectionConfig;
use crate::domain::{DomainError, Frame, RuntimeError};
use crate::ports::{CameraProvider, DetectorLoader, FrameSource, ModelProvider, ObjectDetector};

/// Events published by the frame loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionEvent {
    /// Result of one processed frame.
    Sample(bool),
    /// The per-frame signal flipped. Raw and undebounced.
    Changed(bool),
    /// Non-fatal fault; the loop keeps going.
    Error(RuntimeError),
}

/// Cadence and backoffs of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Only every n-th successfully read frame is run through the detector.
    pub process_every_n_frames: u32,
    pub disabled_poll: Duration,
    pub model_retry: Duration,
    pub camera_retry: Duration,
    pub empty_read_delay: Duration,
    pub inference_error_delay: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            process_every_n_frames: 2,
            disabled_poll: Duration::from_millis(200),
            model_retry: Duration::from_millis(500),
            camera_retry: Duration::from_millis(100),
            empty_read_delay: Duration::from_millis(10),
            inference_error_delay: Duration::from_millis(100),
        }
    }
}

impl LoopSettings {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            process_every_n_frames: config.process_every_n_frames.max(1),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct LoopResources {
    camera: Option<Box<dyn FrameSource>>,
    detector: Option<Box<dyn ObjectDetector>>,
    frame_counter: u64,
    camera_fault_reported: bool,
    model_fault_reported: bool,
}

impl LoopResources {
    fn release_camera(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.close();
            debug!("Camera handle released");
        }
        self.camera_fault_reported = false;
    }

    fn release_all(&mut self) {
        self.release_camera();
        if self.detector.take().is_some() {
            debug!("Detection model released");
        }
        self.model_fault_reported = false;
        self.frame_counter = 0;
    }
}

struct Shared {
    cameras: Arc<dyn CameraProvider>,
    detectors: Arc<dyn DetectorLoader>,
    models: Arc<dyn ModelProvider>,
    settings: LoopSettings,
    enabled: AtomicBool,
    camera_index: AtomicU32,
    detected: AtomicBool,
    resources: Mutex<LoopResources>,
    events: broadcast::Sender<DetectionEvent>,
}

impl Shared {
    fn report(&self, err: &DomainError) {
        warn!(error = %err, "Detection fault");
        let _ = self.events.send(DetectionEvent::Error(RuntimeError::from(err)));
    }

    fn set_detected(&self, detected: bool) {
        if self.detected.swap(detected, Ordering::SeqCst) != detected {
            debug!(detected, "Detection signal changed");
            let _ = self.events.send(DetectionEvent::Changed(detected));
        }
    }

    /// One iteration of the loop. Returns how long to wait before the next.
    fn step(&self) -> Duration {
        let settings = &self.settings;
        if !self.enabled.load(Ordering::SeqCst) {
            return settings.disabled_poll;
        }

        let mut guard = self.resources.lock();
        // Disabled while waiting for the lock.
        if !self.enabled.load(Ordering::SeqCst) {
            return settings.disabled_poll;
        }
        let res = &mut *guard;

        if res.detector.is_none() {
            let Some(path) = self.models.model_path() else {
                return settings.model_retry;
            };
            match self.detectors.load(&path) {
                Ok(detector) => {
                    res.detector = Some(detector);
                    res.model_fault_reported = false;
                }
                Err(err) => {
                    if !res.model_fault_reported {
                        self.report(&err);
                        res.model_fault_reported = true;
                    }
                    return settings.model_retry;
                }
            }
        }

        if !res.camera.as_ref().is_some_and(|camera| camera.is_open()) {
            if let Some(mut stale) = res.camera.take() {
                stale.close();
            }
            let index = self.camera_index.load(Ordering::SeqCst);
            match self.cameras.open(index) {
                Ok(camera) => {
                    res.camera = Some(camera);
                    res.camera_fault_reported = false;
                    // Opening can be slow; disabled in the meantime.
                    if !self.enabled.load(Ordering::SeqCst) {
                        return settings.disabled_poll;
                    }
                }
                Err(err) => {
                    if !res.camera_fault_reported {
                        self.report(&err);
                        res.camera_fault_reported = true;
                    }
                    return settings.camera_retry;
                }
            }
        }

        let frame: Option<Frame> = res
            .camera
            .as_mut()
            .and_then(|camera| camera.read())
            .filter(|frame| !frame.is_empty());
        let Some(frame) = frame else {
            return settings.empty_read_delay;
        };

        res.frame_counter += 1;
        if res.frame_counter % u64::from(settings.process_every_n_frames.max(1)) != 0 {
            return Duration::ZERO;
        }

        let Some(detector) = res.detector.as_mut() else {
            return settings.model_retry;
        };
        match detector.infer(&frame) {
            Ok(detected) => {
                self.set_detected(detected);
                let _ = self.events.send(DetectionEvent::Sample(detected));
                Duration::ZERO
            }
            Err(err) => {
                // Counts as "nothing seen".
                self.report(&err);
                self.set_detected(false);
                let _ = self.events.send(DetectionEvent::Sample(false));
                settings.inference_error_delay
            }
        }
    }
}

struct LoopTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

async fn run_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    info!(
        camera_index = shared.camera_index.load(Ordering::SeqCst),
        "Detection loop started"
    );

    while !cancel.is_cancelled() {
        let step_shared = shared.clone();
        let delay = match tokio::task::spawn_blocking(move || step_shared.step()).await {
            Ok(delay) => delay,
            Err(join) => {
                shared.report(&DomainError::Internal(format!("Detection step failed: {}", join)));
                shared.settings.inference_error_delay
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!("Detection loop stopped");
}

/// Background frame loop: camera in, boolean "phone in view" out.
///
/// ```text
/// Stopped --start--> Running{enabled=false} --set_enabled(true)--> Running{enabled=true}
///    ^                      |    ^                                      |
///    +-------stop-----------+    +---------set_enabled(false)-----------+
/// ```
///
/// Camera and model are opened lazily by the loop and only while enabled.
/// Each step runs on the blocking pool under the resources lock, so a
/// release never races an in-flight frame.
pub struct DetectionRuntime {
    shared: Arc<Shared>,
    task: Mutex<Option<LoopTask>>,
}

impl DetectionRuntime {
    pub fn new(
        cameras: Arc<dyn CameraProvider>,
        detectors: Arc<dyn DetectorLoader>,
        models: Arc<dyn ModelProvider>,
        settings: LoopSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            shared: Arc::new(Shared {
                cameras,
                detectors,
                models,
                settings,
                enabled: AtomicBool::new(false),
                camera_index: AtomicU32::new(0),
                detected: AtomicBool::new(false),
                resources: Mutex::new(LoopResources::default()),
                events,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetectionEvent> {
        self.shared.events.subscribe()
    }

    /// Spawn the frame loop. No-op when already running. Must be called
    /// from within a Tokio runtime.
    pub fn start(&self, camera_index: i32) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        self.shared
            .camera_index
            .store(camera_index.max(0) as u32, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(self.shared.clone(), cancel.clone()));
        *task = Some(LoopTask { cancel, handle });
    }

    /// Cancel the loop, wait for it to exit, then release everything.
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().take() else {
            return;
        };

        task.cancel.cancel();
        if let Err(err) = task.handle.await {
            warn!(error = %err, "Detection loop ended abnormally");
        }

        self.shared.enabled.store(false, Ordering::SeqCst);
        self.release(true).await;
    }

    /// Enabling lets the loop acquire resources; disabling releases them
    /// before returning. The loop itself keeps running.
    pub async fn set_enabled(&self, enabled: bool) {
        self.request_enabled(enabled);
        if !enabled {
            self.release_if_disabled().await;
        }
    }

    /// Flip the enabled flag without waiting for the loop. The loop stops
    /// acquiring resources on its next step.
    pub fn request_enabled(&self, enabled: bool) {
        let previous = self.shared.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!(enabled, "Detection toggled");
        }
    }

    /// Release camera and model unless detection was re-enabled meanwhile.
    /// Waits for an in-flight step to finish.
    pub async fn release_if_disabled(&self) {
        self.release(true).await;
    }

    /// Switch cameras. The current camera is closed; the loop reopens lazily.
    pub async fn set_camera_index(&self, index: i32) {
        self.request_camera_index(index);
        self.release_camera().await;
    }

    /// Store the camera index for the next open without touching the
    /// current handle.
    pub fn request_camera_index(&self, index: i32) {
        let index = index.max(0) as u32;
        self.shared.camera_index.store(index, Ordering::SeqCst);
        info!(index, "Webcam index changed");
    }

    /// Close the current camera so the loop reopens it at the stored index.
    pub async fn release_camera(&self) {
        self.release(false).await;
    }

    async fn release(&self, everything: bool) {
        let shared = self.shared.clone();
        let released = tokio::task::spawn_blocking(move || {
            let mut res = shared.resources.lock();
            if !everything {
                res.release_camera();
            } else if !shared.enabled.load(Ordering::SeqCst) {
                res.release_all();
                drop(res);
                shared.set_detected(false);
            }
        })
        .await;

        if let Err(err) = released {
            warn!(error = %err, "Releasing detection resources failed");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    pub fn phone_detected(&self) -> bool {
        self.shared.detected.load(Ordering::SeqCst)
    }

    pub fn camera_index(&self) -> u32 {
        self.shared.camera_index.load(Ordering::SeqCst)
    }

    pub fn is_auto_detection_available(&self) -> bool {
        self.shared.models.is_model_available()
    }
}

impl Drop for DetectionRuntime {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::time::Instant;

    use super::*;
    use crate::domain::ErrorKind;

    /// Shared record of what the fake camera was asked to do.
    #[derive(Default)]
    pub struct CameraLog {
        pub opened: Vec<u32>,
        pub closed: usize,
        pub reads: usize,
        pub live: bool,
        /// Scripted reads; once empty, `endless` decides what follows.
        pub script: VecDeque<Option<Frame>>,
        pub endless: bool,
        pub fail_open: bool,
        /// Each open blocks this long before returning.
        pub open_delay: Duration,
        pub open_attempts: usize,
    }

    #[derive(Clone, Default)]
    pub struct FakeCameras {
        pub log: Arc<Mutex<CameraLog>>,
    }

    impl FakeCameras {
        pub fn endless() -> Self {
            let cameras = Self::default();
            cameras.log.lock().endless = true;
            cameras
        }

        pub fn scripted(script: Vec<Option<Frame>>) -> Self {
            let cameras = Self::default();
            cameras.log.lock().script = script.into();
            cameras
        }

        pub fn slow(open_delay: Duration) -> Self {
            let cameras = Self::endless();
            cameras.log.lock().open_delay = open_delay;
            cameras
        }
    }

    impl CameraProvider for FakeCameras {
        fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, DomainError> {
            let delay = {
                let mut log = self.log.lock();
                log.open_attempts += 1;
                log.open_delay
            };
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }

            let mut log = self.log.lock();
            if log.fail_open {
                return Err(DomainError::CameraUnavailable { index });
            }
            log.opened.push(index);
            log.live = true;
            Ok(Box::new(FakeSource {
                log: self.log.clone(),
                open: true,
            }))
        }
    }

    struct FakeSource {
        log: Arc<Mutex<CameraLog>>,
        open: bool,
    }

    impl FrameSource for FakeSource {
        fn read(&mut self) -> Option<Frame> {
            let mut log = self.log.lock();
            log.reads += 1;
            match log.script.pop_front() {
                Some(scripted) => scripted,
                None if log.endless => Some(Frame::filled(4, 4, [0, 0, 0])),
                None => None,
            }
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn close(&mut self) {
            if self.open {
                self.open = false;
                let mut log = self.log.lock();
                log.closed += 1;
                log.live = false;
            }
        }
    }

    #[derive(Default)]
    pub struct DetectorLog {
        pub loads: usize,
        pub inferences: usize,
        pub script: VecDeque<Result<bool, DomainError>>,
        pub fallback: bool,
    }

    #[derive(Clone, Default)]
    pub struct FakeDetectors {
        pub log: Arc<Mutex<DetectorLog>>,
    }

    impl FakeDetectors {
        pub fn scripted(script: Vec<Result<bool, DomainError>>, fallback: bool) -> Self {
            let detectors = Self::default();
            {
                let mut log = detectors.log.lock();
                log.script = script.into();
                log.fallback = fallback;
            }
            detectors
        }
    }

    impl DetectorLoader for FakeDetectors {
        fn load(&self, _model_path: &Path) -> Result<Box<dyn ObjectDetector>, DomainError> {
            self.log.lock().loads += 1;
            Ok(Box::new(FakeDetector {
                log: self.log.clone(),
            }))
        }
    }

    struct FakeDetector {
        log: Arc<Mutex<DetectorLog>>,
    }

    impl ObjectDetector for FakeDetector {
        fn infer(&mut self, _frame: &Frame) -> Result<bool, DomainError> {
            let mut log = self.log.lock();
            log.inferences += 1;
            let fallback = log.fallback;
            log.script.pop_front().unwrap_or(Ok(fallback))
        }
    }

    pub struct StaticModels(pub bool);

    impl ModelProvider for StaticModels {
        fn is_model_available(&self) -> bool {
            self.0
        }

        fn model_path(&self) -> Option<PathBuf> {
            self.0.then(|| PathBuf::from("model.onnx"))
        }
    }

    pub fn fast_settings() -> LoopSettings {
        let tick = Duration::from_millis(1);
        LoopSettings {
            process_every_n_frames: 2,
            disabled_poll: tick,
            model_retry: tick,
            camera_retry: tick,
            empty_read_delay: tick,
            inference_error_delay: tick,
        }
    }

    pub async fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    fn runtime(cameras: &FakeCameras, detectors: &FakeDetectors, model: bool) -> DetectionRuntime {
        DetectionRuntime::new(
            Arc::new(cameras.clone()),
            Arc::new(detectors.clone()),
            Arc::new(StaticModels(model)),
            fast_settings(),
        )
    }

    fn drain(rx: &mut broadcast::Receiver<DetectionEvent>) -> Vec<DetectionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn frame() -> Option<Frame> {
        Some(Frame::filled(4, 4, [1, 2, 3]))
    }

    #[tokio::test]
    async fn test_disabled_loop_acquires_nothing() {
        let cameras = FakeCameras::endless();
        let detectors = FakeDetectors::default();
        let runtime = runtime(&cameras, &detectors, true);

        runtime.start(0);
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(runtime.is_running());
        assert!(cameras.log.lock().opened.is_empty());
        assert_eq!(detectors.log.lock().loads, 0);
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_missing_model_acquires_nothing() {
        let cameras = FakeCameras::endless();
        let detectors = FakeDetectors::default();
        let runtime = runtime(&cameras, &detectors, false);

        runtime.start(0);
        runtime.set_enabled(true).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(!runtime.is_auto_detection_available());
        assert!(cameras.log.lock().opened.is_empty());
        assert_eq!(detectors.log.lock().loads, 0);
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_every_second_frame_is_processed() {
        // Six real frames interleaved with failed grabs.
        let cameras = FakeCameras::scripted(vec![
            frame(),
            None,
            frame(),
            None,
            frame(),
            frame(),
            None,
            frame(),
            frame(),
        ]);
        let detectors = FakeDetectors::default();
        let runtime = runtime(&cameras, &detectors, true);

        runtime.start(0);
        runtime.set_enabled(true).await;
        wait_until(|| cameras.log.lock().script.is_empty()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(detectors.log.lock().inferences, 3);
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_changed_only_on_edges() {
        let cameras = FakeCameras::scripted(vec![frame(); 10]);
        let detectors =
            FakeDetectors::scripted(vec![Ok(true), Ok(true), Ok(true), Ok(false), Ok(false)], false);
        let runtime = runtime(&cameras, &detectors, true);
        let mut rx = runtime.subscribe();

        runtime.start(0);
        runtime.set_enabled(true).await;
        wait_until(|| detectors.log.lock().inferences == 5).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let events = drain(&mut rx);
        let changed: Vec<bool> = events
            .iter()
            .filter_map(|e| match e {
                DetectionEvent::Changed(v) => Some(*v),
                _ => None,
            })
            .collect();
        let samples = events
            .iter()
            .filter(|e| matches!(e, DetectionEvent::Sample(_)))
            .count();

        assert_eq!(changed, vec![true, false]);
        assert_eq!(samples, 5);
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_disable_releases_camera_and_model() {
        let cameras = FakeCameras::endless();
        let detectors = FakeDetectors::scripted(Vec::new(), true);
        let runtime = runtime(&cameras, &detectors, true);
        let mut rx = runtime.subscribe();

        runtime.start(0);
        runtime.set_enabled(true).await;
        wait_until(|| runtime.phone_detected()).await;

        runtime.set_enabled(false).await;
        {
            let log = cameras.log.lock();
            assert!(!log.live);
            assert_eq!(log.closed, 1);
        }
        assert!(!runtime.phone_detected());

        let opens = cameras.log.lock().opened.len();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cameras.log.lock().opened.len(), opens);
        assert!(runtime.is_running());

        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&DetectionEvent::Changed(false)));

        // Re-enabling reloads lazily.
        runtime.set_enabled(true).await;
        wait_until(|| detectors.log.lock().loads == 2).await;
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_stop_releases_and_resets_signal() {
        let cameras = FakeCameras::endless();
        let detectors = FakeDetectors::scripted(Vec::new(), true);
        let runtime = runtime(&cameras, &detectors, true);

        runtime.start(0);
        runtime.set_enabled(true).await;
        wait_until(|| runtime.phone_detected()).await;

        runtime.stop().await;
        assert!(!runtime.is_running());
        assert!(!runtime.phone_detected());
        assert!(!cameras.log.lock().live);

        // No stray work after stop.
        let reads = cameras.log.lock().reads;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cameras.log.lock().reads, reads);
    }

    #[tokio::test]
    async fn test_inference_error_is_reported_and_loop_continues() {
        let cameras = FakeCameras::endless();
        let detectors = FakeDetectors::scripted(
            vec![Err(DomainError::Inference("bad tensor".into()))],
            true,
        );
        let runtime = runtime(&cameras, &detectors, true);
        let mut rx = runtime.subscribe();

        runtime.start(0);
        runtime.set_enabled(true).await;
        wait_until(|| runtime.phone_detected()).await;
        runtime.stop().await;

        let events = drain(&mut rx);
        assert!(matches!(
            events.first(),
            Some(DetectionEvent::Error(RuntimeError { kind: ErrorKind::Inference, .. }))
        ));
    }

    #[tokio::test]
    async fn test_camera_failure_reported_once_per_streak() {
        let cameras = FakeCameras::endless();
        cameras.log.lock().fail_open = true;
        let detectors = FakeDetectors::default();
        let runtime = runtime(&cameras, &detectors, true);
        let mut rx = runtime.subscribe();

        runtime.start(3);
        runtime.set_enabled(true).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let errors: Vec<DetectionEvent> = drain(&mut rx);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            DetectionEvent::Error(err) => {
                assert_eq!(err.kind, ErrorKind::Resource);
                assert!(err.message.contains("3"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_camera_switch_reopens_lazily() {
        let cameras = FakeCameras::endless();
        let detectors = FakeDetectors::default();
        let runtime = runtime(&cameras, &detectors, true);

        runtime.start(-1);
        assert_eq!(runtime.camera_index(), 0);
        runtime.set_enabled(true).await;
        wait_until(|| cameras.log.lock().opened == vec![0]).await;

        runtime.set_camera_index(2).await;
        wait_until(|| cameras.log.lock().opened == vec![0, 2]).await;

        assert_eq!(cameras.log.lock().closed, 1);
        assert_eq!(detectors.log.lock().loads, 1);
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_request_enabled_returns_during_slow_open() {
        let cameras = FakeCameras::slow(Duration::from_millis(300));
        let detectors = FakeDetectors::default();
        let runtime = runtime(&cameras, &detectors, true);

        runtime.start(0);
        runtime.request_enabled(true);
        wait_until(|| cameras.log.lock().open_attempts == 1).await;

        let started = Instant::now();
        runtime.request_enabled(false);
        assert!(started.elapsed() < Duration::from_millis(50));
        assert!(!runtime.is_enabled());

        // The release waits for the open, then closes what it produced.
        runtime.release_if_disabled().await;
        assert!(!cameras.log.lock().live);
        assert_eq!(detectors.log.lock().inferences, 0);
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_release_skipped_when_reenabled() {
        let cameras = FakeCameras::endless();
        let detectors = FakeDetectors::scripted(Vec::new(), true);
        let runtime = runtime(&cameras, &detectors, true);

        runtime.start(0);
        runtime.set_enabled(true).await;
        wait_until(|| runtime.phone_detected()).await;

        // Disable then enable again before the release lands.
        runtime.request_enabled(false);
        runtime.request_enabled(true);
        runtime.release_if_disabled().await;

        assert!(cameras.log.lock().live);
        assert_eq!(detectors.log.lock().loads, 1);
        runtime.stop().await;
        assert!(!cameras.log.lock().live);
    }
}
