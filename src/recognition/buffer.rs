use std::collections::VecDeque;

use crate::pose::FeatureVector;

/// 分類に渡す時系列ウィンドウ
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// 古い順。実フレームが足りない分は先頭がゼロベクトル
    pub frames: Vec<FeatureVector>,
    /// パディングを除いた実フレーム数
    pub real_frames: usize,
}

impl Snapshot {
    pub fn latest(&self) -> Option<&FeatureVector> {
        if self.real_frames == 0 {
            None
        } else {
            self.frames.last()
        }
    }
}

/// 直近 T フレームを保持するスライディングウィンドウ (FIFO)
pub struct SequenceBuffer {
    frames: VecDeque<FeatureVector>,
    capacity: usize,
}

impl SequenceBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, vector: FeatureVector) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(vector);
    }

    /// 長さ T のコピーを返す。不足分は先頭をゼロベクトルで埋める
    pub fn snapshot(&self) -> Snapshot {
        let width = self.frames.back().map_or(0, |v| v.len());
        let padding = self.capacity - self.frames.len();
        let mut frames = Vec::with_capacity(self.capacity);
        frames.extend(std::iter::repeat_with(|| vec![0.0; width]).take(padding));
        frames.extend(self.frames.iter().cloned());
        Snapshot {
            frames,
            real_frames: self.frames.len(),
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
