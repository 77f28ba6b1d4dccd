use ndarray::{Array2, Array3};
use thiserror::Error;

use crate::config::ModelConfig;
use crate::recognition::buffer::Snapshot;

use super::labels::LabelSet;
use super::model::{GestureModel, InputShape};

/// 1回の推論結果
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub index: usize,
    pub label: String,
    /// 0.0〜1.0
    pub confidence: f32,
}

/// 推論できなかった理由。いずれもパイプラインを止めない
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("feature dimension is 0")]
    ZeroDimension,

    #[error("only {have} real frames buffered, need {need}")]
    InsufficientFrames { have: usize, need: usize },

    #[error("model returned no scores")]
    EmptyOutput,

    #[error("inference failed: {0:#}")]
    Inference(#[from] anyhow::Error),
}

/// バッファの内容をモデル入力に整形し、出力分布から最尤ラベルを選ぶ
pub struct ClassifierAdapter<M> {
    model: M,
    labels: LabelSet,
    shape: InputShape,
    timesteps: usize,
    min_frames: usize,
    softmax: bool,
}

impl<M: GestureModel> ClassifierAdapter<M> {
    /// 入力形状はここで一度だけ決める
    pub fn new(model: M, labels: LabelSet, config: &ModelConfig) -> anyhow::Result<Self> {
        let shape = InputShape::from_dims(model.input_dims())?;
        let timesteps = shape.timesteps().unwrap_or(config.default_timesteps).max(1);
        tracing::info!(
            "Classifier: {:?}, window {} frames, {} labels",
            shape,
            timesteps,
            labels.len()
        );
        Ok(Self {
            model,
            labels,
            shape,
            timesteps,
            min_frames: config.min_frames,
            softmax: config.softmax,
        })
    }

    pub fn shape(&self) -> InputShape {
        self.shape
    }

    /// 時系列バッファの長さ T
    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn predict(&mut self, snapshot: &Snapshot) -> Result<PredictionResult, PredictError> {
        let dim = self
            .shape
            .dim()
            .or_else(|| snapshot.latest().map(|v| v.len()))
            .unwrap_or(0);
        if dim == 0 {
            return Err(PredictError::ZeroDimension);
        }
        let need = self.min_frames.max(1);
        if snapshot.real_frames < need {
            return Err(PredictError::InsufficientFrames {
                have: snapshot.real_frames,
                need,
            });
        }

        let input = match self.shape {
            InputShape::Sequence { .. } => sequence_input(snapshot, self.timesteps, dim).into_dyn(),
            InputShape::Frame { .. } => frame_input(snapshot, dim).into_dyn(),
        };

        let mut scores = self.model.infer(input)?;
        if scores.is_empty() {
            return Err(PredictError::EmptyOutput);
        }
        if self.softmax {
            softmax_in_place(&mut scores);
        }

        let (index, confidence) = argmax(&scores).ok_or(PredictError::EmptyOutput)?;
        Ok(PredictionResult {
            index,
            label: self.labels.get(index),
            confidence,
        })
    }
}

/// [1, T, D]。古い側をゼロで埋め、各フレームは D に切り詰め/ゼロ埋め
fn sequence_input(snapshot: &Snapshot, timesteps: usize, dim: usize) -> Array3<f32> {
    let mut input = Array3::<f32>::zeros((1, timesteps, dim));
    let frames = &snapshot.frames;
    let offset = timesteps.saturating_sub(frames.len());
    let skip = frames.len().saturating_sub(timesteps);
    for (t, frame) in frames.iter().skip(skip).enumerate() {
        for (d, &v) in frame.iter().take(dim).enumerate() {
            input[[0, offset + t, d]] = v;
        }
    }
    input
}

/// [1, D]。最新フレームのみ
fn frame_input(snapshot: &Snapshot, dim: usize) -> Array2<f32> {
    let mut input = Array2::<f32>::zeros((1, dim));
    if let Some(frame) = snapshot.latest() {
        for (d, &v) in frame.iter().take(dim).enumerate() {
            input[[0, d]] = v;
        }
    }
    input
}

pub fn softmax_in_place(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    if sum > 0.0 {
        for s in scores.iter_mut() {
            *s /= sum;
        }
    }
}

fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::ScriptedModel;

    fn config(min_frames: usize, softmax: bool) -> ModelConfig {
        ModelConfig {
            min_frames,
            softmax,
            ..ModelConfig::default()
        }
    }

    fn snapshot(frames: Vec<Vec<f32>>, real_frames: usize) -> Snapshot {
        Snapshot { frames, real_frames }
    }

    fn labels() -> LabelSet {
        LabelSet::new(vec!["HELLO".into(), "THANKS".into(), "YES".into()])
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let mut v = [1.0f32, 2.0, 3.0];
        softmax_in_place(&mut v);
        let sum: f32 = v.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(v[2] > v[1] && v[1] > v[0]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let mut v = [1000.0f32, 1000.0];
        softmax_in_place(&mut v);
        assert!((v[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some((1, 0.7)));
        assert_eq!(argmax(&[] as &[f32]), None);
        assert_eq!(argmax(&[f32::NAN, 0.2]), Some((1, 0.2)));
    }

    #[test]
    fn test_timesteps_from_model_or_default() {
        let model = ScriptedModel::new(vec![1, 30, 4], vec![0.0, 1.0]);
        let adapter = ClassifierAdapter::new(model, labels(), &config(1, true)).unwrap();
        assert_eq!(adapter.timesteps(), 30);

        let model = ScriptedModel::new(vec![1, 4], vec![0.0, 1.0]);
        let adapter = ClassifierAdapter::new(model, labels(), &config(1, true)).unwrap();
        assert_eq!(adapter.timesteps(), 20);
    }

    #[test]
    fn test_unsupported_rank_fails_at_startup() {
        let model = ScriptedModel::new(vec![1, 2, 3, 4], vec![1.0]);
        assert!(ClassifierAdapter::new(model, labels(), &config(1, true)).is_err());
    }

    #[test]
    fn test_predict_sequence_shape_and_label() {
        let model = ScriptedModel::new(vec![1, 3, 2], vec![0.1, 0.8, 0.1]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(1, false)).unwrap();
        let snap = snapshot(vec![vec![0.0, 0.0], vec![1.0, 2.0], vec![3.0, 4.0]], 2);
        let result = adapter.predict(&snap).unwrap();
        assert_eq!(result.label, "THANKS");
        assert!((result.confidence - 0.8).abs() < 1e-6);

        let inputs = &adapter.model.inputs;
        assert_eq!(inputs[0].shape(), &[1, 3, 2]);
        let flat: Vec<f32> = inputs[0].iter().copied().collect();
        assert_eq!(flat, vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_predict_frame_mode_uses_latest() {
        let model = ScriptedModel::new(vec![-1, 2], vec![5.0, 0.0, 0.0]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(1, true)).unwrap();
        let snap = snapshot(vec![vec![1.0, 2.0], vec![3.0, 4.0]], 2);
        let result = adapter.predict(&snap).unwrap();
        assert_eq!(result.label, "HELLO");
        assert!(result.confidence > 0.9);

        let inputs = &adapter.model.inputs;
        assert_eq!(inputs[0].shape(), &[1, 2]);
        let flat: Vec<f32> = inputs[0].iter().copied().collect();
        assert_eq!(flat, vec![3.0, 4.0]);
    }

    #[test]
    fn test_predict_fits_frames_to_model_dim() {
        let model = ScriptedModel::new(vec![1, 2, 3], vec![1.0]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(1, true)).unwrap();
        let snap = snapshot(vec![vec![1.0, 2.0], vec![3.0, 4.0, 5.0, 6.0]], 2);
        adapter.predict(&snap).unwrap();
        let inputs = &adapter.model.inputs;
        let flat: Vec<f32> = inputs[0].iter().copied().collect();
        assert_eq!(flat, vec![1.0, 2.0, 0.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_unknown_dim_uses_latest_vector() {
        let model = ScriptedModel::new(vec![1, -1, -1], vec![1.0, 0.0]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(1, true)).unwrap();
        let snap = snapshot(vec![vec![7.0; 5]], 1);
        adapter.predict(&snap).unwrap();
        let inputs = &adapter.model.inputs;
        assert_eq!(inputs[0].shape(), &[1, 20, 5]);
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let model = ScriptedModel::new(vec![1, -1, -1], vec![1.0]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(1, true)).unwrap();
        let err = adapter.predict(&snapshot(vec![vec![]; 20], 0)).unwrap_err();
        assert!(matches!(err, PredictError::ZeroDimension));
        assert_eq!(adapter.model.calls(), 0);
    }

    #[test]
    fn test_insufficient_frames_is_rejected() {
        let model = ScriptedModel::new(vec![1, 4, 2], vec![1.0]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(3, true)).unwrap();
        let snap = snapshot(vec![vec![0.0; 2], vec![0.0; 2], vec![1.0; 2], vec![1.0; 2]], 2);
        let err = adapter.predict(&snap).unwrap_err();
        assert!(matches!(err, PredictError::InsufficientFrames { have: 2, need: 3 }));
        assert_eq!(adapter.model.calls(), 0);
    }

    #[test]
    fn test_empty_output_is_rejected() {
        let model = ScriptedModel::new(vec![1, 2], vec![]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(1, true)).unwrap();
        let err = adapter.predict(&snapshot(vec![vec![1.0, 1.0]], 1)).unwrap_err();
        assert!(matches!(err, PredictError::EmptyOutput));
    }

    #[test]
    fn test_label_fallback_for_unknown_index() {
        let model = ScriptedModel::new(vec![1, 2], vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        let mut adapter = ClassifierAdapter::new(model, labels(), &config(1, false)).unwrap();
        let result = adapter.predict(&snapshot(vec![vec![1.0, 1.0]], 1)).unwrap();
        assert_eq!(result.label, "class_4");
    }
}
