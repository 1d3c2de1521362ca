use crate::domain::{DomainError, Frame};

/// Opens cameras by index.
pub trait CameraProvider: Send + Sync {
    /// Open the camera at `index`, trying the platform's capture backends in order.
    ///
    /// Fails with `CameraUnavailable` when no backend can open it.
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, DomainError>;
}

/// An open camera. Blocking; only ever driven from one thread at a time.
pub trait FrameSource: Send {
    /// Grab the next frame. `None` means no frame this time, not end of stream.
    fn read(&mut self) -> Option<Frame>;

    fn is_open(&self) -> bool;

    /// Release the device. Safe to call more than once.
    fn close(&mut self);
}
