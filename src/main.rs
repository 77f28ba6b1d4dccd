use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};

use sign_bridge::classifier;
use sign_bridge::config::Config;
use sign_bridge::protocol::{self, EmissionMessage, StreamMessage};
use sign_bridge::recognition::{Emission, RecognitionController, Sentence};

const CONFIG_PATH: &str = "config.toml";

/// Live gesture recognizer: landmark frames (JSON lines) on stdin,
/// recognized words (JSON lines) on stdout.
#[derive(Parser, Debug)]
#[command(name = "sign_bridge", version = env!("GIT_VERSION"))]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Override model.path
    #[arg(short, long)]
    model: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending().await,
    }
}

async fn emit(
    out: &mut tokio::io::Stdout,
    sentence: &mut Sentence,
    emission: Emission,
) -> Result<()> {
    sentence.push(&emission);
    protocol::send_message(out, &EmissionMessage::new(&emission, sentence)).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    sign_bridge::logging::init(args.verbose);

    let mut config = Config::load_or_default(&args.config)?;
    if let Some(model) = args.model {
        config.model.path = model;
    }

    tracing::info!("Sign Bridge {}", env!("GIT_VERSION"));
    tracing::info!("Model: {}", config.model.path);
    tracing::info!(
        "Motion threshold: {}, pause: {}ms, min confidence: {}",
        config.motion.threshold,
        config.pause.pause_ms,
        config.emission.min_confidence
    );

    let classifier = classifier::load(&config.model)?;
    let mut controller = RecognitionController::new(&config, classifier);
    let mut sentence = Sentence::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!("Waiting for frames on stdin");

    loop {
        let deadline = controller.deadline();
        tokio::select! {
            msg = protocol::recv_message(&mut lines) => {
                match msg? {
                    Some(StreamMessage::Frame { observation, .. }) => {
                        if let Some(e) = controller.process(observation.as_ref(), Instant::now()) {
                            emit(&mut stdout, &mut sentence, e).await?;
                        }
                    }
                    Some(StreamMessage::Clear) => {
                        controller.reset();
                        sentence.clear();
                    }
                    Some(StreamMessage::Append) => {
                        if let Some(e) = sentence.append_current().cloned() {
                            let msg = EmissionMessage::new(&e, &sentence);
                            protocol::send_message(&mut stdout, &msg).await?;
                        }
                    }
                    Some(StreamMessage::Stop) | None => break,
                }
            }
            _ = sleep_until(deadline) => {
                if let Some(e) = controller.tick(Instant::now()) {
                    emit(&mut stdout, &mut sentence, e).await?;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    controller.stop();
    if !sentence.is_empty() {
        tracing::info!("Sentence: {}", sentence.text());
    }
    Ok(())
}
