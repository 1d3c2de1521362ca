use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::{info, trace};

use crate::domain::detection::{
    decode_candidates, non_max_suppression, DetectorSettings, InputShape, Letterbox, TensorLayout,
    PAD_VALUE,
};
use crate::domain::{DomainError, Frame};
use crate::ports::{DetectorLoader, InferenceEngine, InferenceSession, ObjectDetector};

/// Builds [`YoloDetector`]s on top of any inference engine.
pub struct YoloDetectorLoader {
    engine: Arc<dyn InferenceEngine>,
    settings: DetectorSettings,
}

impl YoloDetectorLoader {
    pub fn new(engine: Arc<dyn InferenceEngine>, settings: DetectorSettings) -> Self {
        Self { engine, settings }
    }
}

impl DetectorLoader for YoloDetectorLoader {
    fn load(&self, model_path: &Path) -> Result<Box<dyn ObjectDetector>, DomainError> {
        let session = self.engine.load(model_path)?;
        let detector = YoloDetector::new(session, self.settings);

        info!(
            path = ?model_path,
            width = detector.input.width,
            height = detector.input.height,
            layout = ?detector.input.layout,
            "Detection model loaded"
        );

        Ok(Box::new(detector))
    }
}

/// Single-class YOLO detector: letterbox, run, decode, suppress.
pub struct YoloDetector {
    session: Box<dyn InferenceSession>,
    input: InputShape,
    settings: DetectorSettings,
}

impl YoloDetector {
    pub fn new(session: Box<dyn InferenceSession>, settings: DetectorSettings) -> Self {
        let input = InputShape::from_dims(&session.input_dims());
        Self {
            session,
            input,
            settings,
        }
    }

    pub fn input_shape(&self) -> InputShape {
        self.input
    }
}

impl ObjectDetector for YoloDetector {
    fn infer(&mut self, frame: &Frame) -> Result<bool, DomainError> {
        if frame.is_empty() {
            return Err(DomainError::InvalidFrame("empty frame".to_string()));
        }

        let (tensor, letterbox) = preprocess(frame, &self.input)?;
        let output = self.session.run(tensor, self.input.tensor_dims())?;

        let candidates =
            decode_candidates(&output.shape, &output.data, &self.settings, &letterbox)?;
        let kept = non_max_suppression(candidates, self.settings.nms_threshold);

        trace!(kept = kept.len(), "Frame processed");
        Ok(!kept.is_empty())
    }
}

/// Letterbox `frame` into the model input and normalise to `[0, 1]`.
pub fn preprocess(frame: &Frame, input: &InputShape) -> Result<(Vec<f32>, Letterbox), DomainError> {
    let image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(|| DomainError::InvalidFrame("buffer does not match dimensions".to_string()))?;

    let letterbox = Letterbox::fit(frame.width(), frame.height(), input);
    let resized = imageops::resize(
        &image,
        letterbox.new_width,
        letterbox.new_height,
        FilterType::Triangle,
    );

    let mut canvas = RgbImage::from_pixel(input.width, input.height, Rgb([PAD_VALUE; 3]));
    imageops::replace(
        &mut canvas,
        &resized,
        letterbox.pad_x as i64,
        letterbox.pad_y as i64,
    );

    let tensor = match input.layout {
        TensorLayout::ChannelsLast => canvas.as_raw().iter().map(|&v| v as f32 / 255.0).collect(),
        TensorLayout::ChannelsFirst => {
            let plane = input.width as usize * input.height as usize;
            let mut out = vec![0.0f32; plane * 3];
            for (x, y, pixel) in canvas.enumerate_pixels() {
                let idx = y as usize * input.width as usize + x as usize;
                for c in 0..3 {
                    out[c * plane + idx] = pixel[c] as f32 / 255.0;
                }
            }
            out
        }
    };

    Ok((tensor, letterbox))
}
