use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::domain::DomainError;
use crate::ports::{InferenceEngine, InferenceSession, OutputTensor};

/// ONNX Runtime backend. CPU execution.
pub struct OnnxInferenceEngine {
    intra_threads: usize,
}

impl OnnxInferenceEngine {
    /// `intra_threads == 0` leaves the thread count to the runtime.
    pub fn new(intra_threads: usize) -> Self {
        Self { intra_threads }
    }
}

impl InferenceEngine for OnnxInferenceEngine {
    fn load(&self, path: &Path) -> Result<Box<dyn InferenceSession>, DomainError> {
        if !path.exists() {
            return Err(DomainError::ModelNotFound(path.display().to_string()));
        }

        let load_err = |e: ort::Error| DomainError::ModelLoad(e.to_string());

        let mut builder = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_err)?;
        if self.intra_threads > 0 {
            builder = builder
                .with_intra_threads(self.intra_threads)
                .map_err(load_err)?;
        }
        let session = builder.commit_from_file(path).map_err(load_err)?;

        let input_dims = session
            .inputs
            .first()
            .and_then(|input| input.input_type.tensor_shape())
            .map(|shape| shape.to_vec())
            .unwrap_or_default();

        info!(path = ?path, input_dims = ?input_dims, "ONNX session created");

        Ok(Box::new(OnnxSession {
            session,
            input_dims,
        }))
    }
}

struct OnnxSession {
    session: Session,
    input_dims: Vec<i64>,
}

impl InferenceSession for OnnxSession {
    fn input_dims(&self) -> Vec<i64> {
        self.input_dims.clone()
    }

    fn run(&mut self, input: Vec<f32>, shape: [usize; 4]) -> Result<OutputTensor, DomainError> {
        let infer_err = |e: ort::Error| DomainError::Inference(e.to_string());

        let tensor = Tensor::from_array((shape, input)).map_err(infer_err)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(infer_err)?;

        let (out_shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(infer_err)?;
        let out_shape: Vec<usize> = out_shape.iter().map(|&d| d.max(0) as usize).collect();

        debug!(shape = ?out_shape, "Inference finished");

        Ok(OutputTensor {
            shape: out_shape,
            data: data.to_vec(),
        })
    }
}
