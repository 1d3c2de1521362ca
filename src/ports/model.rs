use std::path::PathBuf;

/// Locates the detection model on disk.
pub trait ModelProvider: Send + Sync {
    /// True when a usable model file is present.
    fn is_model_available(&self) -> bool;

    /// Path of the usable model file, if any.
    fn model_path(&self) -> Option<PathBuf>;
}
