use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use contact_relay::api::{self, AppState};
use contact_relay::config::ServerConfig;
use contact_relay::mail::{Mailer, SmtpConfig, SmtpMailer, UnavailableMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(_) => info!("No .env file, using process environment"),
    }

    // Install rustls crypto provider before any TLS usage
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;

    let mailer = build_mailer();

    // Startup probe runs in the background so binding is not held up by the
    // SMTP handshake; its result may be logged after "Server running".
    // Failure only logs, every send re-verifies anyway.
    {
        let mailer = Arc::clone(&mailer);
        tokio::spawn(async move {
            match mailer.verify().await {
                Ok(()) => info!("SMTP server is ready to send messages"),
                Err(e) => warn!(error = %e, "SMTP server connection error"),
            }
        });
    }

    let app = api::router(AppState::new(mailer), &server_config);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        port = server_config.port,
        origins = %server_config.allowed_origins.join(", "),
        "Server running on http://localhost:{}",
        server_config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

/// Build the process-wide mailer. Configuration problems degrade to a
/// mailer that fails every send, so the chat endpoint stays available.
fn build_mailer() -> Arc<dyn Mailer> {
    let config = match SmtpConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Mail relay disabled");
            return Arc::new(UnavailableMailer::new(e.to_string()));
        }
    };

    match SmtpMailer::new(&config) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            error!(error = %e, "Mail relay disabled");
            Arc::new(UnavailableMailer::new(e.to_string()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
