use serde::{Deserialize, Serialize};

/// ポーズのランドマーク数 (MediaPipe Holistic)
pub const POSE_LANDMARK_COUNT: usize = 33;
/// 片手のランドマーク数
pub const HAND_LANDMARK_COUNT: usize = 21;

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 相対深度
    #[serde(default)]
    pub z: f32,
    /// 可視性スコア (ポーズのみ)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, visibility: None }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// 1フレーム分の検出結果。検出されなかったグループは None
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default, alias = "poseLandmarks")]
    pub pose: Option<Vec<Landmark>>,
    #[serde(default, alias = "leftHandLandmarks")]
    pub left_hand: Option<Vec<Landmark>>,
    #[serde(default, alias = "rightHandLandmarks")]
    pub right_hand: Option<Vec<Landmark>>,
}

impl Observation {
    /// どのグループも検出されていないか
    pub fn is_empty(&self) -> bool {
        self.pose.is_none() && self.left_hand.is_none() && self.right_hand.is_none()
    }
}
