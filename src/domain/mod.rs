pub mod config;
pub mod detection;
pub mod device;
pub mod error;
pub mod frame;
pub mod hotkey;
pub mod policy;
pub mod status;

pub use config::AppConfig;
pub use detection::{BoundingBox, DetectionCandidate, DetectorSettings, InputShape, Letterbox};
pub use device::DeviceIdentifier;
pub use error::{DomainError, ErrorKind};
pub use frame::Frame;
pub use hotkey::HotkeyAction;
pub use policy::{Debouncer, LinkCommand};
pub use status::{ManualOverride, RuntimeError, RuntimeEvent, RuntimeStatus};
