pub mod features;
pub mod landmark;

pub use features::{FeatureLayout, FeatureVector};
pub use landmark::{Landmark, Observation, HAND_LANDMARK_COUNT, POSE_LANDMARK_COUNT};
