use std::path::{Path, PathBuf};

use biosync_core::{SyncConfig, SyncPipeline};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> biosync_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync { identifier, config } => run_sync(identifier.as_deref(), config.as_deref()),
        Commands::Rsvp { identifier, config } => run_rsvp(identifier.as_deref(), config.as_deref()),
        Commands::Config { output } => write_default_config(&output),
    };

    if let Err(err) = &result {
        tracing::error!("{err}");
    }
    result
}

fn load_pipeline(config: Option<&Path>) -> biosync_core::Result<SyncPipeline> {
    let config = match config {
        Some(path) => SyncConfig::from_json_file(path)?,
        None => SyncConfig::default(),
    };
    SyncPipeline::new(config)
}

fn run_sync(identifier: Option<&str>, config: Option<&Path>) -> biosync_core::Result<()> {
    tracing::info!(identifier, "running beginning-protocol synchronization");
    let output = load_pipeline(config)?.run_beginning_protocol(identifier)?;
    tracing::info!(
        directory = %output.directory.display(),
        rows = output.record.combined.len(),
        "synchronized data files were saved"
    );
    Ok(())
}

fn run_rsvp(identifier: Option<&str>, config: Option<&Path>) -> biosync_core::Result<()> {
    tracing::info!(identifier, "running RSVP synchronization");
    let output = load_pipeline(config)?.run_rsvp(identifier)?;
    tracing::info!(
        directory = %output.sync.directory.display(),
        images = output.render.saved.len(),
        "gazes were recorded on the stimulus images"
    );
    Ok(())
}

fn write_default_config(output: &Path) -> biosync_core::Result<()> {
    let json = SyncConfig::default().to_json()?;
    std::fs::write(output, json)?;
    tracing::info!(?output, "wrote default configuration");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Align EEG and eye-tracker recordings by their beginning protocol",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Electrode-press / closed-eyes protocol. Uses the newest recordings
    /// unless an identifier is given.
    Sync {
        /// Substring that the recording file names must contain.
        identifier: Option<String>,
        /// JSON configuration file; built-in defaults otherwise.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Rapid visual presentation session: wink protocol plus gaze marks on
    /// the stimulus images.
    Rsvp {
        /// Substring that the recording file names must contain.
        identifier: Option<String>,
        /// JSON configuration file; built-in defaults otherwise.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write the default configuration as JSON.
    Config {
        /// Destination of the configuration file.
        output: PathBuf,
    },
}
