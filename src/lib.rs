pub mod classifier;
pub mod config;
pub mod logging;
pub mod pose;
pub mod protocol;
pub mod recognition;
