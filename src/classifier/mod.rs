pub mod adapter;
pub mod labels;
pub mod model;

pub use adapter::{ClassifierAdapter, PredictError, PredictionResult};
pub use labels::LabelSet;
pub use model::{GestureModel, InputShape, OnnxModel};

use anyhow::Result;

use crate::config::ModelConfig;

/// モデルとラベルを読み込む。失敗は起動エラー
pub fn load(config: &ModelConfig) -> Result<ClassifierAdapter<OnnxModel>> {
    let model = OnnxModel::new(&config.path)?;
    let labels = LabelSet::load(config.labels_path())?;
    ClassifierAdapter::new(model, labels, config)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use anyhow::{bail, Result};
    use ndarray::ArrayD;

    use super::GestureModel;

    /// 決められたスコアを順に返すテスト用モデル。最後のスコアは繰り返す
    pub struct ScriptedModel {
        dims: Vec<i64>,
        script: VecDeque<Vec<f32>>,
        last: Vec<f32>,
        fail: bool,
        pub inputs: Vec<ArrayD<f32>>,
    }

    impl ScriptedModel {
        pub fn new(dims: Vec<i64>, scores: Vec<f32>) -> Self {
            Self::scripted(dims, vec![scores])
        }

        pub fn scripted(dims: Vec<i64>, script: Vec<Vec<f32>>) -> Self {
            Self {
                dims,
                script: script.into(),
                last: Vec::new(),
                fail: false,
                inputs: Vec::new(),
            }
        }

        pub fn failing(dims: Vec<i64>) -> Self {
            let mut model = Self::scripted(dims, Vec::new());
            model.fail = true;
            model
        }

        pub fn calls(&self) -> usize {
            self.inputs.len()
        }
    }

    impl GestureModel for ScriptedModel {
        fn input_dims(&self) -> &[i64] {
            &self.dims
        }

        fn infer(&mut self, input: ArrayD<f32>) -> Result<Vec<f32>> {
            self.inputs.push(input);
            if self.fail {
                bail!("scripted failure");
            }
            if let Some(next) = self.script.pop_front() {
                self.last = next;
            }
            Ok(self.last.clone())
        }
    }
}
