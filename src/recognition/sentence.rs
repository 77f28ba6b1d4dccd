use super::controller::Emission;

/// 確定したラベルを文として蓄積する
#[derive(Debug, Clone, Default)]
pub struct Sentence {
    words: Vec<String>,
    current: Option<Emission>,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, emission: &Emission) {
        self.words.push(emission.label.clone());
        self.current = Some(emission.clone());
    }

    /// 直近の単語をもう一度追加する（手動の "append" 操作）
    pub fn append_current(&mut self) -> Option<&Emission> {
        let current = self.current.as_ref()?;
        self.words.push(current.label.clone());
        Some(current)
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current.as_ref().map(|e| e.label.as_str())
    }

    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.current = None;
    }
}
