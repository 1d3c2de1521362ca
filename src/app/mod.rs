pub mod controller;
pub mod detection_runtime;
pub mod orchestrator;

pub use controller::{AppController, ControllerOptions};
pub use detection_runtime::{DetectionEvent, DetectionRuntime, LoopSettings};
pub use orchestrator::RuntimeOrchestrator;
