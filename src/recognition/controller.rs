//! Per-observation recognition pipeline.
//!
//! observation → features → motion → buffer → (still) pause timer →
//! on expiry classify → confidence / repeat policy → [`Emission`].

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::classifier::{ClassifierAdapter, GestureModel, PredictError, PredictionResult};
use crate::config::{Config, EmissionConfig};
use crate::pose::{FeatureLayout, FeatureVector, Observation};

use super::buffer::SequenceBuffer;
use super::motion::{Motion, MotionDetector};
use super::pause::PauseScheduler;

/// 確定したラベル
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emission {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    LowConfidence,
    Repeat,
}

/// 信頼度と連続重複の判定
#[derive(Debug, Clone, Copy)]
pub struct EmissionPolicy {
    pub min_confidence: f32,
    pub suppress_repeats: bool,
}

impl EmissionPolicy {
    pub fn from_config(config: &EmissionConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            suppress_repeats: config.suppress_repeats,
        }
    }

    pub fn decide(&self, prediction: &PredictionResult, last_emitted: Option<&str>) -> Decision {
        if prediction.confidence < self.min_confidence {
            Decision::LowConfidence
        } else if self.suppress_repeats && last_emitted == Some(prediction.label.as_str()) {
            Decision::Repeat
        } else {
            Decision::Accept
        }
    }
}

/// セッション中に変化する状態。reset / stop で丸ごと作り直す
struct PipelineState {
    last_vector: Option<FeatureVector>,
    last_delta: f32,
    buffer: SequenceBuffer,
    pause: PauseScheduler,
    last_emitted: Option<String>,
}

impl PipelineState {
    fn new(capacity: usize, pause: Duration) -> Self {
        Self {
            last_vector: None,
            last_delta: 0.0,
            buffer: SequenceBuffer::new(capacity),
            pause: PauseScheduler::new(pause),
            last_emitted: None,
        }
    }
}

pub struct RecognitionController<M> {
    layout: FeatureLayout,
    motion: MotionDetector,
    classifier: ClassifierAdapter<M>,
    policy: EmissionPolicy,
    pause: Duration,
    state: PipelineState,
    running: bool,
}

impl<M: GestureModel> RecognitionController<M> {
    pub fn new(config: &Config, classifier: ClassifierAdapter<M>) -> Self {
        let layout = FeatureLayout::from_config(&config.features);
        if let Some(dim) = classifier.shape().dim() {
            if dim != layout.dim() {
                tracing::warn!(
                    "Model expects D={} but feature layout produces D={}; frames will be truncated or padded",
                    dim,
                    layout.dim()
                );
            }
        }
        let pause = Duration::from_millis(config.pause.pause_ms);
        let state = PipelineState::new(classifier.timesteps(), pause);
        Self {
            layout,
            motion: MotionDetector::from_config(&config.motion),
            classifier,
            policy: EmissionPolicy::from_config(&config.emission),
            pause,
            state,
            running: true,
        }
    }

    pub fn classifier(&self) -> &ClassifierAdapter<M> {
        &self.classifier
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 保留中の発火時刻
    pub fn deadline(&self) -> Option<Instant> {
        self.state.pause.deadline()
    }

    pub fn last_delta(&self) -> f32 {
        self.state.last_delta
    }

    pub fn last_emitted(&self) -> Option<&str> {
        self.state.last_emitted.as_deref()
    }

    pub fn buffered_frames(&self) -> usize {
        self.state.buffer.len()
    }

    /// 1フレーム分を処理する。`None` は検出なしのフレーム
    ///
    /// 期限切れのタイマーはフレームより先に発火する。
    pub fn process(&mut self, observation: Option<&Observation>, now: Instant) -> Option<Emission> {
        if !self.running {
            return None;
        }
        let emission = self.tick(now);
        if let Some(observation) = observation {
            self.observe(observation, now);
        }
        emission
    }

    /// タイマーの期限が来ていれば分類を1回実行する
    pub fn tick(&mut self, now: Instant) -> Option<Emission> {
        if !self.running || !self.state.pause.poll(now) {
            return None;
        }
        self.fire()
    }

    fn observe(&mut self, observation: &Observation, now: Instant) {
        if observation.is_empty() {
            return;
        }
        let vector = self.layout.extract(observation);
        if vector.is_empty() {
            return;
        }

        let delta = self.motion.measure(self.state.last_vector.as_deref(), &vector);
        self.state.last_delta = delta;
        self.state.last_vector = Some(vector.clone());
        self.state.buffer.push(vector);

        match self.motion.classify(delta) {
            Motion::Moving => {
                if self.state.pause.cancel() {
                    tracing::debug!("pause cancelled (delta={:.4})", delta);
                }
            }
            Motion::Still => {
                if self.state.pause.arm(now) {
                    tracing::debug!("pause armed (delta={:.4})", delta);
                }
            }
        }
    }

    fn fire(&mut self) -> Option<Emission> {
        let snapshot = self.state.buffer.snapshot();
        let prediction = match self.classifier.predict(&snapshot) {
            Ok(p) => p,
            Err(PredictError::ZeroDimension) => {
                tracing::warn!("Skipping prediction: feature dimension is 0");
                return None;
            }
            Err(e @ PredictError::Inference(_)) => {
                tracing::warn!("Skipping prediction: {}", e);
                return None;
            }
            Err(e) => {
                tracing::debug!("Skipping prediction: {}", e);
                return None;
            }
        };

        match self.policy.decide(&prediction, self.state.last_emitted.as_deref()) {
            Decision::Accept => {
                tracing::info!("Recognized {} ({:.2})", prediction.label, prediction.confidence);
                self.state.last_emitted = Some(prediction.label.clone());
                Some(Emission {
                    label: prediction.label,
                    confidence: prediction.confidence,
                })
            }
            Decision::LowConfidence => {
                tracing::debug!(
                    "Rejected {} ({:.2} < {:.2})",
                    prediction.label,
                    prediction.confidence,
                    self.policy.min_confidence
                );
                None
            }
            Decision::Repeat => {
                tracing::debug!("Suppressed repeat of {}", prediction.label);
                None
            }
        }
    }

    /// ユーザー操作によるクリア。タイマーも取り消す
    pub fn reset(&mut self) {
        self.state = PipelineState::new(self.classifier.timesteps(), self.pause);
        tracing::info!("Recognition state reset");
    }

    /// ストリーム終了。以降 start まで何も処理しない
    pub fn stop(&mut self) {
        self.state = PipelineState::new(self.classifier.timesteps(), self.pause);
        self.running = false;
        tracing::info!("Recognition stopped");
    }

    pub fn start(&mut self) {
        self.running = true;
    }
}
