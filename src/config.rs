use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub pause: PauseConfig,
    #[serde(default)]
    pub emission: EmissionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// ONNX分類モデルのパス
    #[serde(default = "default_model_path")]
    pub path: String,
    /// ラベルファイル (JSON配列 or {"labels": [...]})。空文字なら class_<index>
    #[serde(default = "default_labels_path")]
    pub labels: Option<String>,
    /// モデル出力がロジットの場合 softmax で正規化する
    #[serde(default = "default_softmax")]
    pub softmax: bool,
    /// モデルが時間長を宣言しない場合のバッファ長
    #[serde(default = "default_timesteps")]
    pub default_timesteps: usize,
    /// 推論に必要な実フレーム数の下限
    #[serde(default = "default_min_frames")]
    pub min_frames: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureConfig {
    #[serde(default = "default_pose_landmarks")]
    pub pose_landmarks: usize,
    #[serde(default = "default_hand_landmarks")]
    pub hand_landmarks: usize,
    /// ポーズ点に visibility チャネルを含めるか（学習時の設定と一致させること）
    #[serde(default = "default_pose_visibility")]
    pub pose_visibility: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MotionConfig {
    /// フレーム間の平均絶対差がこれを超えたら「動いている」
    #[serde(default = "default_motion_threshold")]
    pub threshold: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PauseConfig {
    /// ジェスチャ完了とみなす連続静止時間（ミリ秒）
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmissionConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// 直前に確定したラベルと同じなら出力しない
    #[serde(default = "default_suppress_repeats")]
    pub suppress_repeats: bool,
}

fn default_model_path() -> String { "models/gesture.onnx".to_string() }
fn default_labels_path() -> Option<String> { Some("models/labels.json".to_string()) }
fn default_softmax() -> bool { true }
fn default_timesteps() -> usize { 20 }
fn default_min_frames() -> usize { 3 }
fn default_pose_landmarks() -> usize { 33 }
fn default_hand_landmarks() -> usize { 21 }
fn default_pose_visibility() -> bool { true }
fn default_motion_threshold() -> f32 { 0.02 }
fn default_pause_ms() -> u64 { 600 }
fn default_min_confidence() -> f32 { 0.6 }
fn default_suppress_repeats() -> bool { true }

impl ModelConfig {
    /// 空文字は「未指定」
    pub fn labels_path(&self) -> Option<&str> {
        self.labels.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            labels: default_labels_path(),
            softmax: default_softmax(),
            default_timesteps: default_timesteps(),
            min_frames: default_min_frames(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            pose_landmarks: default_pose_landmarks(),
            hand_landmarks: default_hand_landmarks(),
            pose_visibility: default_pose_visibility(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { threshold: default_motion_threshold() }
    }
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self { pause_ms: default_pause_ms() }
    }
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            suppress_repeats: default_suppress_repeats(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルが無ければデフォルト値。壊れたファイルはエラー
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("{} not found, using default config", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pause.pause_ms == 0 {
            bail!("pause.pause_ms must be positive");
        }
        if !(0.0..=1.0).contains(&self.emission.min_confidence) {
            bail!(
                "emission.min_confidence must be within [0, 1], got {}",
                self.emission.min_confidence
            );
        }
        if self.motion.threshold.is_nan() || self.motion.threshold < 0.0 {
            bail!("motion.threshold must be non-negative, got {}", self.motion.threshold);
        }
        if self.model.default_timesteps == 0 {
            bail!("model.default_timesteps must be at least 1");
        }
        Ok(())
    }
}
