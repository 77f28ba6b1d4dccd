pub mod buffer;
pub mod controller;
pub mod motion;
pub mod pause;
pub mod replay;
pub mod sentence;

pub use buffer::{SequenceBuffer, Snapshot};
pub use controller::{Decision, Emission, EmissionPolicy, RecognitionController};
pub use motion::{delta, Motion, MotionDetector};
pub use pause::{PauseScheduler, PauseState};
pub use replay::{replay, ReplayOptions};
pub use sentence::Sentence;
