//! Line-delimited JSON protocol between the landmark detector process and the
//! recognizer.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, Lines};

use crate::pose::Observation;
use crate::recognition::{Emission, Sentence};

// --- Message types ---

/// Detector → recognizer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// One frame tick. `observation` is null when nothing was detected.
    Frame {
        #[serde(default)]
        t_ms: Option<u64>,
        #[serde(default)]
        observation: Option<Observation>,
    },
    /// User-initiated clear.
    Clear,
    /// Append the current word to the sentence again.
    Append,
    /// End of stream.
    Stop,
}

/// Recognizer → downstream (sentence / translation layer)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmissionMessage {
    pub label: String,
    pub confidence: f32,
    pub sentence: String,
}

impl EmissionMessage {
    /// `sentence` must already contain the emitted word.
    pub fn new(emission: &Emission, sentence: &Sentence) -> Self {
        Self {
            label: emission.label.clone(),
            confidence: emission.confidence,
            sentence: sentence.text(),
        }
    }
}

// --- Line codec helpers ---

/// Parse one line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<StreamMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Receive the next message. Malformed lines are logged and skipped;
/// `Ok(None)` means the input is closed.
pub async fn recv_message<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>,
) -> anyhow::Result<Option<StreamMessage>> {
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(msg)) => return Ok(Some(msg)),
            Ok(None) => continue,
            Err(e) => tracing::warn!("Skipping malformed line: {}", e),
        }
    }
    Ok(None)
}

/// Send a message as one JSON line.
pub async fn send_message<W: AsyncWrite + Unpin, T: Serialize>(
    out: &mut W,
    msg: &T,
) -> anyhow::Result<()> {
    let mut data = serde_json::to_vec(msg)?;
    data.push(b'\n');
    out.write_all(&data).await?;
    out.flush().await?;
    Ok(())
}
