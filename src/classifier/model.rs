use anyhow::{bail, Context, Result};
use ndarray::ArrayD;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// 分類モデルの抽象。内部構造は問わず、入力形状とクラスごとのスコアだけを扱う
pub trait GestureModel {
    /// ロード時に宣言された入力次元 (バッチ含む)。動的次元は 0 以下
    fn input_dims(&self) -> &[i64];

    /// 1バッチ分の入力からクラスごとのスコアを返す
    fn infer(&mut self, input: ArrayD<f32>) -> Result<Vec<f32>>;
}

/// モデル入力の形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// [batch, T, D]
    Sequence {
        timesteps: Option<usize>,
        dim: Option<usize>,
    },
    /// [batch, D] (最新フレームのみ)
    Frame { dim: Option<usize> },
}

fn known(dim: i64) -> Option<usize> {
    if dim > 0 { Some(dim as usize) } else { None }
}

impl InputShape {
    pub fn from_dims(dims: &[i64]) -> Result<Self> {
        match dims.len() {
            3 => Ok(Self::Sequence {
                timesteps: known(dims[1]),
                dim: known(dims[2]),
            }),
            2 => Ok(Self::Frame { dim: known(dims[1]) }),
            n => bail!("Unsupported model input rank {} ({:?})", n, dims),
        }
    }

    pub fn dim(&self) -> Option<usize> {
        match *self {
            Self::Sequence { dim, .. } | Self::Frame { dim } => dim,
        }
    }

    pub fn timesteps(&self) -> Option<usize> {
        match *self {
            Self::Sequence { timesteps, .. } => timesteps,
            Self::Frame { .. } => None,
        }
    }
}

fn build_session(model_path: &Path) -> Result<Session> {
    let builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?;

    #[cfg(feature = "cuda")]
    let builder = {
        tracing::info!("[ort] Attempting CUDA execution provider...");
        builder.with_execution_providers([ort::execution_providers::CUDAExecutionProvider::default().build()])?
    };

    builder
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model {}", model_path.display()))
}

/// ONNX Runtime で動く分類モデル
pub struct OnnxModel {
    session: Session,
    input_name: String,
    input_dims: Vec<i64>,
}

impl OnnxModel {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = build_session(model_path.as_ref())?;

        let input = session
            .inputs
            .first()
            .context("Model declares no inputs")?;
        let input_name = input.name.clone();
        let input_dims: Vec<i64> = input
            .input_type
            .tensor_shape()
            .context("Model input is not a tensor")?
            .iter()
            .copied()
            .collect();

        tracing::info!("Model loaded: input {} {:?}", input_name, input_dims);

        Ok(Self {
            session,
            input_name,
            input_dims,
        })
    }
}

impl GestureModel for OnnxModel {
    fn input_dims(&self) -> &[i64] {
        &self.input_dims
    }

    fn infer(&mut self, input: ArrayD<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .context("Inference failed")?;

        let output: ndarray::ArrayViewD<f32> = outputs[0]
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        Ok(output.iter().copied().collect())
    }
}
