use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{debug, info, warn};

use crate::domain::{DomainError, Frame};
use crate::ports::{CameraProvider, FrameSource};

const CAPTURE_WIDTH: f64 = 640.0;
const CAPTURE_HEIGHT: f64 = 480.0;
const CAPTURE_FPS: f64 = 30.0;

/// Capture backends in the order they are tried.
fn backends() -> &'static [i32] {
    #[cfg(target_os = "windows")]
    {
        &[videoio::CAP_DSHOW, videoio::CAP_MSMF, videoio::CAP_ANY]
    }

    #[cfg(target_os = "linux")]
    {
        &[videoio::CAP_V4L2, videoio::CAP_ANY]
    }

    #[cfg(target_os = "macos")]
    {
        &[videoio::CAP_AVFOUNDATION, videoio::CAP_ANY]
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        &[videoio::CAP_ANY]
    }
}

/// Opens webcams through OpenCV's `VideoCapture`.
#[derive(Debug, Default)]
pub struct OpenCvCameraProvider;

impl OpenCvCameraProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CameraProvider for OpenCvCameraProvider {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, DomainError> {
        for &backend in backends() {
            match VideoCapture::new(index as i32, backend) {
                Ok(mut cap) => {
                    if cap.is_opened().unwrap_or(false) {
                        configure(&mut cap);
                        info!(index, backend, "Webcam opened");
                        return Ok(Box::new(OpenCvFrameSource {
                            cap,
                            bgr: Mat::default(),
                            rgb: Mat::default(),
                        }));
                    }
                    let _ = cap.release();
                    debug!(index, backend, "Backend could not open webcam");
                }
                Err(err) => {
                    warn!(index, backend, error = %err, "Failed to create capture");
                }
            }
        }

        Err(DomainError::CameraUnavailable { index })
    }
}

/// Small frames keep inference cheap; a one-frame buffer keeps them fresh.
fn configure(cap: &mut VideoCapture) {
    if let Ok(mjpg) = videoio::VideoWriter::fourcc('M', 'J', 'P', 'G') {
        let _ = cap.set(videoio::CAP_PROP_FOURCC, mjpg as f64);
    }
    let _ = cap.set(videoio::CAP_PROP_FRAME_WIDTH, CAPTURE_WIDTH);
    let _ = cap.set(videoio::CAP_PROP_FRAME_HEIGHT, CAPTURE_HEIGHT);
    let _ = cap.set(videoio::CAP_PROP_FPS, CAPTURE_FPS);
    let _ = cap.set(videoio::CAP_PROP_BUFFERSIZE, 1.0);
}

struct OpenCvFrameSource {
    cap: VideoCapture,
    bgr: Mat,
    rgb: Mat,
}

impl OpenCvFrameSource {
    fn grab(&mut self) -> opencv::Result<Option<Frame>> {
        if !self.cap.read(&mut self.bgr)? || self.bgr.empty() {
            return Ok(None);
        }

        imgproc::cvt_color_def(&self.bgr, &mut self.rgb, imgproc::COLOR_BGR2RGB)?;
        let (width, height) = (self.rgb.cols() as u32, self.rgb.rows() as u32);
        let data = self.rgb.data_bytes()?.to_vec();

        Ok(Frame::new(width, height, data).ok())
    }
}

impl FrameSource for OpenCvFrameSource {
    fn read(&mut self) -> Option<Frame> {
        match self.grab() {
            Ok(frame) => frame,
            Err(err) => {
                debug!(error = %err, "Frame grab failed");
                None
            }
        }
    }

    fn is_open(&self) -> bool {
        self.cap.is_opened().unwrap_or(false)
    }

    fn close(&mut self) {
        if self.is_open() {
            let _ = self.cap.release();
            info!("Webcam released");
        }
    }
}

impl Drop for OpenCvFrameSource {
    fn drop(&mut self) {
        self.close();
    }
}
