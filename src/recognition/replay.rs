//! Drives the controller from recorded messages on the recording's own clock.

use std::time::{Duration, Instant};

use crate::classifier::GestureModel;
use crate::protocol::{EmissionMessage, StreamMessage};

use super::controller::RecognitionController;
use super::sentence::Sentence;

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    /// t_ms を持たないフレームの間隔
    pub frame_ms: u64,
    /// 入力終端で保留中のポーズを発火させる
    pub drain: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame_ms: 33,
            drain: false,
        }
    }
}

/// メッセージ列を処理して出力メッセージを返す。終了時は controller を stop する
///
/// 時刻は `base` からの経過で、t_ms が戻っても時計は進めたまま。
pub fn replay<M, I>(
    messages: I,
    controller: &mut RecognitionController<M>,
    sentence: &mut Sentence,
    base: Instant,
    options: ReplayOptions,
) -> Vec<EmissionMessage>
where
    M: GestureModel,
    I: IntoIterator<Item = StreamMessage>,
{
    let mut out = Vec::new();
    let mut clock_ms: u64 = 0;
    let mut frames = 0u64;
    let mut stopped = false;

    for msg in messages {
        match msg {
            StreamMessage::Frame { t_ms, observation } => {
                clock_ms = match t_ms {
                    Some(t) => t.max(clock_ms),
                    None if frames == 0 => 0,
                    None => clock_ms + options.frame_ms,
                };
                frames += 1;
                let now = base + Duration::from_millis(clock_ms);
                if let Some(e) = controller.process(observation.as_ref(), now) {
                    sentence.push(&e);
                    tracing::debug!("t={}ms {}", clock_ms, e.label);
                    out.push(EmissionMessage::new(&e, sentence));
                }
            }
            StreamMessage::Clear => {
                controller.reset();
                sentence.clear();
            }
            StreamMessage::Append => {
                if let Some(e) = sentence.append_current().cloned() {
                    out.push(EmissionMessage::new(&e, sentence));
                }
            }
            StreamMessage::Stop => {
                stopped = true;
                break;
            }
        }
    }

    if options.drain && !stopped {
        if let Some(deadline) = controller.deadline() {
            if let Some(e) = controller.tick(deadline) {
                sentence.push(&e);
                out.push(EmissionMessage::new(&e, sentence));
            }
        }
    }
    controller.stop();

    tracing::info!("{} frames replayed", frames);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::ScriptedModel;
    use crate::classifier::{ClassifierAdapter, LabelSet};
    use crate::config::Config;
    use crate::pose::{Landmark, Observation};

    fn controller(pause_ms: u64) -> RecognitionController<ScriptedModel> {
        let mut config = Config::default();
        config.features.pose_landmarks = 1;
        config.features.hand_landmarks = 0;
        config.features.pose_visibility = false;
        config.pause.pause_ms = pause_ms;
        config.emission.min_confidence = 0.5;
        config.model.min_frames = 1;
        config.model.softmax = false;
        let model = ScriptedModel::new(vec![1, 20, 3], vec![0.9, 0.1]);
        let labels = LabelSet::new(vec!["HELLO".into(), "THANKS".into()]);
        let adapter = ClassifierAdapter::new(model, labels, &config.model).unwrap();
        RecognitionController::new(&config, adapter)
    }

    fn frame(t_ms: Option<u64>, x: f32) -> StreamMessage {
        StreamMessage::Frame {
            t_ms,
            observation: Some(Observation {
                pose: Some(vec![Landmark::new(x, 0.0, 0.0)]),
                ..Default::default()
            }),
        }
    }

    fn run(messages: Vec<StreamMessage>, options: ReplayOptions) -> Vec<EmissionMessage> {
        let mut c = controller(600);
        let mut sentence = Sentence::new();
        replay(messages, &mut c, &mut sentence, Instant::now(), options)
    }

    fn held_frames() -> Vec<StreamMessage> {
        vec![
            frame(Some(0), 0.2),
            frame(Some(100), 0.2),
            frame(Some(200), 0.2),
        ]
    }

    #[test]
    fn test_drain_fires_trailing_pause() {
        let drain = ReplayOptions { drain: true, ..Default::default() };
        let out = run(held_frames(), drain);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "HELLO");
        assert_eq!(out[0].sentence, "HELLO");
    }

    #[test]
    fn test_end_of_input_without_drain_is_teardown() {
        let mut c = controller(600);
        let mut sentence = Sentence::new();
        let out = replay(held_frames(), &mut c, &mut sentence, Instant::now(), ReplayOptions::default());
        assert!(out.is_empty());
        assert!(!c.is_running());
        assert!(c.deadline().is_none());
        assert_eq!(c.classifier().model().calls(), 0);
    }

    #[test]
    fn test_stop_disables_drain() {
        let mut messages = held_frames();
        messages.push(StreamMessage::Stop);
        // frames after stop are never read
        messages.push(frame(Some(5000), 0.2));
        let drain = ReplayOptions { drain: true, ..Default::default() };
        assert!(run(messages, drain).is_empty());
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        // still at 0, moving at 300, then a stale t_ms=100 still frame arms at 300
        let base = vec![
            frame(Some(0), 0.2),
            frame(Some(300), 0.8),
            frame(Some(100), 0.8),
        ];

        let mut early = base.clone();
        early.push(frame(Some(800), 0.8));
        assert!(run(early, ReplayOptions::default()).is_empty());

        let mut on_time = base;
        on_time.push(frame(Some(900), 0.8));
        let out = run(on_time, ReplayOptions::default());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_frame_ms_fills_missing_timestamps() {
        let frames = |n: usize| (0..n).map(|_| frame(None, 0.2)).collect::<Vec<_>>();

        let slow = ReplayOptions { frame_ms: 200, drain: false };
        // 0, 200, 400, 600: the last frame reaches the deadline
        assert_eq!(run(frames(4), slow).len(), 1);

        let fast = ReplayOptions { frame_ms: 100, drain: false };
        assert!(run(frames(4), fast).is_empty());
    }

    #[test]
    fn test_append_and_clear() {
        let mut messages = held_frames();
        messages.push(frame(Some(600), 0.2));
        messages.push(StreamMessage::Append);
        messages.push(StreamMessage::Clear);
        messages.push(StreamMessage::Append);
        let out = run(messages, ReplayOptions::default());
        let sentences: Vec<&str> = out.iter().map(|m| m.sentence.as_str()).collect();
        assert_eq!(sentences, vec!["HELLO", "HELLO HELLO"]);
    }
}
