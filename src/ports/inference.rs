use std::path::Path;

use crate::domain::DomainError;

/// Dense `f32` output tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Loads model files into runnable sessions.
pub trait InferenceEngine: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn InferenceSession>, DomainError>;
}

/// A loaded single-input, single-output model.
pub trait InferenceSession: Send {
    /// Declared dims of the first input. Dynamic dims are reported as -1.
    fn input_dims(&self) -> Vec<i64>;

    /// Run the model on one input tensor and return the first output.
    fn run(&mut self, input: Vec<f32>, shape: [usize; 4]) -> Result<OutputTensor, DomainError>;
}
