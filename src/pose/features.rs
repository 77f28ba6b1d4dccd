use crate::config::FeatureConfig;

use super::landmark::{Landmark, Observation};

/// 1フレーム分の特徴ベクトル（長さは [`FeatureLayout::dim`] で固定）
pub type FeatureVector = Vec<f32>;

/// 特徴ベクトルのレイアウト
///
/// 連結順は pose → left hand → right hand。
/// ポーズは (x, y, z[, visibility])、手は (x, y, z)。
/// 分類モデルの学習時と同じ設定でなければならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub pose_landmarks: usize,
    pub hand_landmarks: usize,
    pub pose_visibility: bool,
}

impl FeatureLayout {
    pub fn new(pose_landmarks: usize, hand_landmarks: usize, pose_visibility: bool) -> Self {
        Self {
            pose_landmarks,
            hand_landmarks,
            pose_visibility,
        }
    }

    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(config.pose_landmarks, config.hand_landmarks, config.pose_visibility)
    }

    fn pose_channels(&self) -> usize {
        if self.pose_visibility { 4 } else { 3 }
    }

    /// 特徴次元 D
    pub fn dim(&self) -> usize {
        self.pose_landmarks * self.pose_channels() + 2 * self.hand_landmarks * 3
    }

    /// 観測を固定長ベクトルに変換する。欠損グループはゼロで埋める
    pub fn extract(&self, observation: &Observation) -> FeatureVector {
        let mut vec = Vec::with_capacity(self.dim());
        push_group(
            &mut vec,
            observation.pose.as_deref(),
            self.pose_landmarks,
            self.pose_visibility,
        );
        push_group(&mut vec, observation.left_hand.as_deref(), self.hand_landmarks, false);
        push_group(&mut vec, observation.right_hand.as_deref(), self.hand_landmarks, false);
        debug_assert_eq!(vec.len(), self.dim());
        vec
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::from_config(&FeatureConfig::default())
    }
}

/// 点数が多すぎれば切り捨て、足りなければゼロ埋め
fn push_group(vec: &mut Vec<f32>, landmarks: Option<&[Landmark]>, count: usize, visibility: bool) {
    let landmarks = landmarks.unwrap_or(&[]);
    for i in 0..count {
        match landmarks.get(i) {
            Some(lm) => {
                vec.extend_from_slice(&[lm.x, lm.y, lm.z]);
                if visibility {
                    vec.push(lm.visibility.unwrap_or(0.0));
                }
            }
            None => {
                let width = if visibility { 4 } else { 3 };
                vec.extend(std::iter::repeat(0.0).take(width));
            }
        }
    }
}
