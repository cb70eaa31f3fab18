/// Podplay - headless episode player
use clap::Parser;
use podplay_console::{ConsoleApp, ConsoleConfig};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "podplay")]
#[command(about = "Headless podcast episode player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start playback as soon as an episode is loaded
    #[arg(short, long)]
    autoplay: bool,

    /// Episode reference reported alongside the initial location
    #[arg(short, long, requires = "audio_location")]
    episode: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Audio location to load on startup
    audio_location: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries snapshots
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "podplay=info,podplay_console=info,podplay_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ConsoleConfig::load(cli.config.as_deref())?;
    config.validate()?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let app = ConsoleApp::start(&config, cli.autoplay)?;
    if let Some(location) = cli.audio_location {
        app.load(location, cli.episode)?;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    app.run(stdin, std::io::stdout()).await?;

    tracing::info!("console player stopped");
    Ok(())
}
