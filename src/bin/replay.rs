//! Replays a recorded landmark stream (JSON lines) with its own timestamps.
//!
//! The pause timer runs on the recording's clock, so results do not depend on
//! how fast the file is read.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;

use sign_bridge::classifier;
use sign_bridge::config::Config;
use sign_bridge::protocol::{self, StreamMessage};
use sign_bridge::recognition::{replay, RecognitionController, ReplayOptions, Sentence};

const CONFIG_PATH: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "replay", version = env!("GIT_VERSION"))]
struct Args {
    /// Recording (one JSON message per line)
    input: PathBuf,

    /// Config file path
    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Override model.path
    #[arg(short, long)]
    model: Option<String>,

    /// Frame interval for frames without t_ms
    #[arg(long, default_value = "33")]
    frame_ms: u64,

    /// Let a pause still pending at end of input fire
    #[arg(long)]
    drain: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn read_messages(file: File) -> Result<Vec<StreamMessage>> {
    let mut messages = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        match protocol::parse_line(&line?) {
            Ok(Some(msg)) => messages.push(msg),
            Ok(None) => {}
            Err(e) => tracing::warn!("line {}: {}", lineno + 1, e),
        }
    }
    Ok(messages)
}

fn main() -> Result<()> {
    let args = Args::parse();
    sign_bridge::logging::init(args.verbose);

    let mut config = Config::load_or_default(&args.config)?;
    if let Some(model) = args.model {
        config.model.path = model;
    }

    let classifier = classifier::load(&config.model)?;
    let mut controller = RecognitionController::new(&config, classifier);
    let mut sentence = Sentence::new();

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let messages = read_messages(file)?;

    let options = ReplayOptions {
        frame_ms: args.frame_ms,
        drain: args.drain,
    };
    let emitted = replay(messages, &mut controller, &mut sentence, Instant::now(), options);
    for msg in &emitted {
        println!("{}", serde_json::to_string(msg)?);
    }

    tracing::info!("Sentence: {}", sentence.text());
    Ok(())
}
