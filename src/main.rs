use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use turnscribe::pipeline::Pipeline;
use turnscribe::{create_router, AppState, Config, ModelManager};

#[derive(Parser)]
#[command(name = "turnscribe", version, about = "Speaker-diarized speech-to-text service")]
struct Cli {
    /// Path to the service config (without extension)
    #[arg(short, long, default_value = "config/turnscribe")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve,
    /// Transcribe a single audio file and print the transcript
    Transcribe {
        /// Path to the input audio file (e.g., MP3, WAV)
        audio_file: PathBuf,
        /// Keep only the N speakers with the most talk time
        #[arg(long)]
        num_speakers: Option<usize>,
        /// Output the raw JSON result instead of plain text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    let models = Arc::new(ModelManager::new(cfg.models.clone()));

    match cli.command {
        Command::Serve => serve(cfg, models).await,
        Command::Transcribe {
            audio_file,
            num_speakers,
            json,
        } => transcribe(models, audio_file, num_speakers, json).await,
    }
}

async fn serve(cfg: Config, models: Arc<ModelManager>) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    // Load models up front so the first request doesn't pay the cost.
    // Startup continues on failure to keep /debug/models reachable.
    let preload = {
        let models = Arc::clone(&models);
        tokio::task::spawn_blocking(move || models.preload()).await
    };
    match preload {
        Ok(Ok(())) => info!("All models loaded successfully"),
        Ok(Err(e)) => error!("Error loading models during startup: {:#}", e),
        Err(e) => error!("Model preload task failed: {}", e),
    }

    let state = AppState::new(models);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn transcribe(
    models: Arc<ModelManager>,
    audio_file: PathBuf,
    num_speakers: Option<usize>,
    json: bool,
) -> Result<()> {
    if !audio_file.exists() {
        anyhow::bail!("The file {} does not exist", audio_file.display());
    }

    info!("Processing audio file {}", audio_file.display());

    let result = tokio::task::spawn_blocking(move || {
        let diarizer = models.diarizer()?;
        let transcriber = models.transcriber()?;
        let pipeline = Pipeline::new(diarizer, transcriber);
        Ok::<_, anyhow::Error>(pipeline.process(&audio_file, num_speakers)?)
    })
    .await
    .context("Pipeline task failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result.to_plain_text());
    }

    Ok(())
}
