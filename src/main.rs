use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_sessions::{app, App, Config, StageRegistry};

#[derive(Parser, Debug)]
#[command(name = "voice-sessions", about = "Voice-call session service")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/voice-sessions")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let app = App::build(&cfg, StageRegistry::new(), None);
    app::serve(&cfg, app).await
}
