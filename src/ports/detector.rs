use std::path::Path;

use crate::domain::{DomainError, Frame};

/// Builds detectors from a model file.
pub trait DetectorLoader: Send + Sync {
    fn load(&self, model_path: &Path) -> Result<Box<dyn ObjectDetector>, DomainError>;
}

/// Answers "is the target object in this frame?".
///
/// Stateless across frames. Blocking; never called concurrently.
pub trait ObjectDetector: Send {
    /// Run detection on one frame.
    ///
    /// Empty frames yield `Ok(false)`. Any candidate surviving confidence
    /// filtering and NMS yields `Ok(true)`.
    fn infer(&mut self, frame: &Frame) -> Result<bool, DomainError>;
}
