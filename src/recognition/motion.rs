use crate::config::MotionConfig;

/// フレーム間の動き判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Moving,
    Still,
}

/// 2つの特徴ベクトルの平均絶対差（短い方の長さで比較）
pub fn delta(prev: &[f32], curr: &[f32]) -> f32 {
    let n = prev.len().min(curr.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f32 = prev
        .iter()
        .zip(curr.iter())
        .map(|(a, b)| (a - b).abs())
        .sum();
    sum / n as f32
}

/// 動き/静止の判定器
#[derive(Debug, Clone, Copy)]
pub struct MotionDetector {
    threshold: f32,
}

impl MotionDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// 前フレームとの差分を返す。初回 (prev なし) は 0 = 静止扱い
    pub fn measure(&self, prev: Option<&[f32]>, curr: &[f32]) -> f32 {
        prev.map_or(0.0, |p| delta(p, curr))
    }

    pub fn classify(&self, delta: f32) -> Motion {
        if delta > self.threshold {
            Motion::Moving
        } else {
            Motion::Still
        }
    }
}
