//! Writes a [`Walkthrough`] to a `.safetensors` file so the synthetic
//! tensors can be inspected with ordinary tensor tooling.

use crate::pipeline::Walkthrough;
use log::info;
use ndarray::Array2;
use safetensors::tensor::{serialize_to_file, Dtype, SafeTensorError, TensorView};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("safetensors serialization failed: {0}")]
    SafeTensors(#[from] SafeTensorError),
    #[error("failed to encode metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

struct RawTensor {
    name: &'static str,
    dtype: Dtype,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

fn f32_tensor(name: &'static str, matrix: &Array2<f32>) -> RawTensor {
    let values: Vec<f32> = matrix.iter().copied().collect();
    RawTensor {
        name,
        dtype: Dtype::F32,
        shape: matrix.shape().to_vec(),
        bytes: bytemuck::cast_slice(&values).to_vec(),
    }
}

fn u32_tensor(name: &'static str, values: &[u32]) -> RawTensor {
    RawTensor {
        name,
        dtype: Dtype::U32,
        shape: vec![values.len()],
        bytes: bytemuck::cast_slice(values).to_vec(),
    }
}

/// Saves every tensor of `walkthrough` plus its tokens as metadata.
pub fn export_safetensors(walkthrough: &Walkthrough, path: &Path) -> Result<(), ExportError> {
    let raw = vec![
        u32_tensor("token_ids", &walkthrough.token_ids),
        f32_tensor("embeddings", &walkthrough.embeddings),
        f32_tensor("positional_encodings", &walkthrough.positional),
        f32_tensor("combined_input", &walkthrough.combined),
        f32_tensor("attention", &walkthrough.attention),
        f32_tensor("ffn_hidden", &walkthrough.feed_forward.hidden),
        f32_tensor("ffn_output", &walkthrough.feed_forward.output),
    ];

    let views = raw
        .iter()
        .map(|t| TensorView::new(t.dtype, t.shape.clone(), &t.bytes).map(|view| (t.name.to_string(), view)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut metadata = HashMap::new();
    metadata.insert("run_id".to_string(), walkthrough.run_id.clone());
    metadata.insert("input_text".to_string(), walkthrough.input_text.clone());
    metadata.insert("tokens".to_string(), serde_json::to_string(walkthrough.sequence.tokens())?);
    metadata.insert("truncated".to_string(), walkthrough.sequence.is_truncated().to_string());

    serialize_to_file(views, &Some(metadata), path)?;
    info!("Exported walkthrough {} to {:?}", walkthrough.run_id, path);
    Ok(())
}
