use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<String>),
    Object { labels: Vec<String> },
}

/// クラスインデックス → ラベル名。モデル出力チャネル順と一致する
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: LabelFile = serde_json::from_str(json).context("Invalid label file")?;
        let labels = match file {
            LabelFile::List(labels) | LabelFile::Object { labels } => labels,
        };
        Ok(Self::new(labels))
    }

    /// ファイルが未指定・存在しない場合は空（class_<index> にフォールバック）
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let Some(path) = path else {
            tracing::warn!("No label file configured, using class_<index> names");
            return Ok(Self::default());
        };
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("{} not found, using class_<index> names", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels {}", path.display()))?;
        let set = Self::from_json(&content)
            .with_context(|| format!("Failed to parse labels {}", path.display()))?;
        tracing::info!("Loaded {} labels from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> String {
        match self.labels.get(index) {
            Some(label) => label.clone(),
            None => format!("class_{}", index),
        }
    }
}
