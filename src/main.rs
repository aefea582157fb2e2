use std::net::SocketAddr;
use std::path::PathBuf;

use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use anyhow::anyhow;

use gemini_voice_proxy::{
    ServerConfig, routes,
    smoke::{self, DEFAULT_SMOKE_OUTPUT, DEFAULT_SMOKE_PROMPT, DEFAULT_SMOKE_URL, SmokeOptions},
    state::AppState,
};

/// Gemini voice proxy - text prompt in, Gemini Live audio out
#[derive(Parser, Debug)]
#[command(name = "gemini-voice-proxy")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Send one prompt to a running proxy and save the audio
    Smoke {
        /// Base URL of the proxy
        #[arg(long, default_value = DEFAULT_SMOKE_URL)]
        url: String,

        /// Prompt text
        #[arg(long, default_value = DEFAULT_SMOKE_PROMPT)]
        prompt: String,

        /// Output file; a .wav extension writes a WAV container
        #[arg(short = 'o', long = "output", default_value = DEFAULT_SMOKE_OUTPUT)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Smoke {
            url,
            prompt,
            output,
        }) => {
            let options = SmokeOptions {
                url,
                prompt,
                output,
            };
            let written = smoke::run(&options).await?;
            println!(
                "Received {} bytes of audio, saved to {}",
                written,
                options.output.display()
            );
            Ok(())
        }
        Some(Commands::Serve) | None => serve(cli.config).await,
    }
}

async fn serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    // Load configuration from file or environment
    let config = if let Some(config_path) = config_path {
        info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let address = config.address();
    let tls_config = config.tls.clone();
    info!(
        service = %config.service_name,
        tls = config.is_tls_enabled(),
        "Starting server on {address}"
    );

    // Bridge construction failures are logged and reported per request
    let app_state = AppState::new(config);
    if !app_state.is_bridge_ready() {
        warn!("Serving without an upstream session bridge; /chat requests will fail");
    }
    let app = routes::create_app(app_state);

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    // Start server with or without TLS
    if let Some(tls) = tls_config {
        // Load TLS configuration from certificate and key files
        let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to load TLS certificates from {} and {}: {}",
                    tls.cert_path.display(),
                    tls.key_path.display(),
                    e
                )
            })?;

        info!("Server listening on https://{} (TLS enabled)", socket_addr);

        axum_server::bind_rustls(socket_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|e| anyhow!("TLS server error: {}", e))?;
    } else {
        info!("Server listening on http://{}", socket_addr);

        let listener = TcpListener::bind(&socket_addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}
