use serde::{Deserialize, Serialize};

use crate::domain::config::DetectionConfig;
use crate::domain::error::DomainError;

/// Input side used when the model does not declare a fixed size.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Padding colour of the letterbox canvas.
pub const PAD_VALUE: u8 = 114;

/// Number of box attributes (cx, cy, w, h) preceding the class scores.
const BOX_ATTRIBUTES: usize = 4;

/// Post-processing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    pub target_class: usize,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self::from(&DetectionConfig::default())
    }
}

impl From<&DetectionConfig> for DetectorSettings {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            target_class: config.target_class,
            confidence_threshold: config.confidence_threshold,
            nms_threshold: config.nms_threshold,
        }
    }
}

/// Axis-aligned box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection-over-union. Zero when the boxes do not overlap or either is degenerate.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter_w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let inter_h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = inter_w * inter_h;
        if intersection <= 0.0 {
            return 0.0;
        }

        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// One surviving anchor of one frame. Never kept past that frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionCandidate {
    pub bbox: BoundingBox,
    pub score: f32,
}

/// Memory order of the model's image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[N, C, H, W]`
    ChannelsFirst,
    /// `[N, H, W, C]`
    ChannelsLast,
}

/// Fixed image input of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
}

impl Default for InputShape {
    fn default() -> Self {
        Self {
            width: DEFAULT_INPUT_SIZE,
            height: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::ChannelsFirst,
        }
    }
}

impl InputShape {
    /// Derive the input shape from declared tensor dims.
    ///
    /// A 3 in position 1 means channel-first, a 3 in position 3 channel-last.
    /// Dynamic (non-positive) sides fall back to [`DEFAULT_INPUT_SIZE`].
    pub fn from_dims(dims: &[i64]) -> Self {
        let side = |d: i64| if d > 0 { d as u32 } else { DEFAULT_INPUT_SIZE };
        match *dims {
            [_, 3, h, w] => Self {
                width: side(w),
                height: side(h),
                layout: TensorLayout::ChannelsFirst,
            },
            [_, h, w, 3] => Self {
                width: side(w),
                height: side(h),
                layout: TensorLayout::ChannelsLast,
            },
            _ => Self::default(),
        }
    }

    /// Tensor dims for a batch of one.
    pub fn tensor_dims(&self) -> [usize; 4] {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            TensorLayout::ChannelsFirst => [1, 3, h, w],
            TensorLayout::ChannelsLast => [1, h, w, 3],
        }
    }

    pub fn element_count(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Aspect-preserving fit of a frame into a model input: resized to fit,
/// then centred on a gray canvas. Raw boxes live in that input space and
/// are mapped back to frame pixels before NMS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub new_width: u32,
    pub new_height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Letterbox {
    /// Compute the transform for a non-empty frame.
    pub fn fit(frame_width: u32, frame_height: u32, input: &InputShape) -> Self {
        let scale = (input.width as f32 / frame_width as f32)
            .min(input.height as f32 / frame_height as f32);
        let new_width = ((frame_width as f32 * scale) as u32).clamp(1, input.width);
        let new_height = ((frame_height as f32 * scale) as u32).clamp(1, input.height);

        Self {
            scale,
            new_width,
            new_height,
            pad_x: (input.width - new_width) / 2,
            pad_y: (input.height - new_height) / 2,
            frame_width,
            frame_height,
        }
    }

    /// Map a centre-size box from input space back to clamped frame pixels.
    pub fn to_frame_box(&self, cx: f32, cy: f32, bw: f32, bh: f32) -> BoundingBox {
        let (pad_x, pad_y) = (self.pad_x as f32, self.pad_y as f32);
        let (max_x, max_y) = (self.frame_width as f32, self.frame_height as f32);

        BoundingBox {
            x1: ((cx - bw / 2.0 - pad_x) / self.scale).clamp(0.0, max_x),
            y1: ((cy - bh / 2.0 - pad_y) / self.scale).clamp(0.0, max_y),
            x2: ((cx + bw / 2.0 - pad_x) / self.scale).clamp(0.0, max_x),
            y2: ((cy + bh / 2.0 - pad_y) / self.scale).clamp(0.0, max_y),
        }
    }

    /// Map a frame box into input space as `[cx, cy, w, h]`.
    pub fn to_input_box(&self, bbox: &BoundingBox) -> [f32; 4] {
        let x1 = bbox.x1 * self.scale + self.pad_x as f32;
        let y1 = bbox.y1 * self.scale + self.pad_y as f32;
        let x2 = bbox.x2 * self.scale + self.pad_x as f32;
        let y2 = bbox.y2 * self.scale + self.pad_y as f32;
        [(x1 + x2) / 2.0, (y1 + y2) / 2.0, x2 - x1, y2 - y1]
    }
}

/// Turn a raw `[1, C, N]` or `[1, N, C]` output into frame-space candidates
/// for the configured class.
///
/// `C` is the attribute axis (4 box values + class scores). When both axes
/// could hold the attributes the shorter one is taken, which matches the
/// anchor counts real models produce.
pub fn decode_candidates(
    shape: &[usize],
    data: &[f32],
    settings: &DetectorSettings,
    letterbox: &Letterbox,
) -> Result<Vec<DetectionCandidate>, DomainError> {
    let shape_error = || DomainError::OutputShape {
        shape: shape.to_vec(),
    };

    let (a, b) = match *shape {
        [1, a, b] => (a, b),
        _ => return Err(shape_error()),
    };
    if data.len() != a * b {
        return Err(shape_error());
    }

    let min_attributes = BOX_ATTRIBUTES + settings.target_class + 1;
    let attributes_first = match (a >= min_attributes, b >= min_attributes) {
        (true, true) => a <= b,
        (true, false) => true,
        (false, true) => false,
        (false, false) => return Err(shape_error()),
    };

    let (attributes, anchors) = if attributes_first { (a, b) } else { (b, a) };
    let value = |attr: usize, anchor: usize| {
        if attributes_first {
            data[attr * anchors + anchor]
        } else {
            data[anchor * attributes + attr]
        }
    };

    let score_row = BOX_ATTRIBUTES + settings.target_class;
    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let score = value(score_row, anchor);
        if score < settings.confidence_threshold {
            continue;
        }

        let bbox = letterbox.to_frame_box(
            value(0, anchor),
            value(1, anchor),
            value(2, anchor),
            value(3, anchor),
        );
        candidates.push(DetectionCandidate { bbox, score });
    }

    Ok(candidates)
}

/// Greedy non-maximum suppression.
///
/// Candidates are visited by descending score; one is kept only if its IoU
/// with every kept candidate is at most `iou_threshold`.
pub fn non_max_suppression(
    mut candidates: Vec<DetectionCandidate>,
    iou_threshold: f32,
) -> Vec<DetectionCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<DetectionCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
