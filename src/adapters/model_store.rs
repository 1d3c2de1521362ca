use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ports::ModelProvider;

/// Model file names, most preferred first.
pub const MODEL_FILE_NAMES: [&str; 3] = ["yolo26n_416_int8.onnx", "yolo26n.onnx", "yolo11n.onnx"];

/// Anything smaller is a truncated download or a placeholder.
pub const MIN_MODEL_BYTES: u64 = 2 * 1024 * 1024;

/// Finds the detection model on the local filesystem.
pub struct LocalModelStore {
    explicit: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl LocalModelStore {
    /// Search `<data_dir>/models`, the executable's directory and its
    /// ancestors, then the working directory. An explicit path replaces the
    /// search entirely.
    pub fn new(data_dir: &Path, explicit: Option<PathBuf>) -> Self {
        let mut search_dirs = vec![data_dir.join("models")];

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            search_dirs.extend(exe_dir.ancestors().map(Path::to_path_buf));
        }

        if let Ok(cwd) = std::env::current_dir() {
            search_dirs.push(cwd);
        }

        info!(
            explicit = ?explicit,
            search_dirs = search_dirs.len(),
            "LocalModelStore initialized"
        );

        Self::with_search_dirs(explicit, search_dirs)
    }

    pub fn with_search_dirs(explicit: Option<PathBuf>, search_dirs: Vec<PathBuf>) -> Self {
        Self {
            explicit,
            search_dirs,
        }
    }

    fn is_usable(path: &Path) -> bool {
        fs::metadata(path)
            .map(|meta| meta.is_file() && meta.len() >= MIN_MODEL_BYTES)
            .unwrap_or(false)
    }
}

impl ModelProvider for LocalModelStore {
    fn is_model_available(&self) -> bool {
        self.model_path().is_some()
    }

    fn model_path(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.explicit {
            let usable = Self::is_usable(explicit);
            debug!(path = ?explicit, usable, "Checked configured model path");
            return usable.then(|| explicit.clone());
        }

        let found = self
            .search_dirs
            .iter()
            .flat_map(|dir| MODEL_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| Self::is_usable(candidate));

        debug!(path = ?found, "Model search finished");
        found
    }
}
