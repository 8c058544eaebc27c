use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shared::config::{LiveConfig, load_config};

use zertifikat::AppState;
use zertifikat::backend::{HttpCertificateGenerator, SupabaseClient};
use zertifikat::handlers::http::routes::{Router, build_router};
use zertifikat::service::AppService;
use zertifikat::tower_middle::{AuthGateLayer, HyperToTowerAdapter, TimeoutLayer};

/// Shortest secret accepted for signing identity tokens.
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Parser)]
#[command(name = "zertifikat", version, about = "Tree certificate back office")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "ZERTIFIKAT_CONFIG", default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    let jwt_secret = config
        .auth
        .resolved_jwt_secret()
        .ok_or_else(|| anyhow!("No JWT secret: set JWT_SECRET or auth.jwt_secret"))?;
    if jwt_secret.len() < MIN_SECRET_LEN {
        return Err(anyhow!(
            "JWT secret must be at least {} characters",
            MIN_SECRET_LEN
        ));
    }

    let addr: SocketAddr = config
        .server
        .addr()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.addr()))?;

    let state = AppState {
        auth: Arc::new(SupabaseClient::new(&config.backend.url, &config.backend.anon_key)),
        generator: Arc::new(HttpCertificateGenerator::new(&config.certificate.generator_url)),
        jwt_secret: Arc::from(jwt_secret.as_str()),
        config: LiveConfig::new(config),
    };

    spawn_reload_task(cli.config.clone(), state.config.clone());

    let router = Arc::new(build_router(None));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };
                serve_connection(stream, peer, router.clone(), state.clone()).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Build the middleware stack for one connection and drive it on its own task.
///
/// The timeout is read per connection, so a reload applies to new clients.
async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    state: AppState,
) {
    let timeout = Duration::from_secs(state.config.read().await.server.request_timeout_secs);
    let gate = AuthGateLayer::new(state.jwt_secret.as_bytes());

    let stack = ServiceBuilder::new()
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(gate)
        .service(HyperToTowerAdapter::new(AppService::new(router, state)));

    let io = TokioIo::new(stream);
    tokio::task::spawn(async move {
        if let Err(err) = http1::Builder::new()
            .timer(TokioTimer::new())
            .serve_connection(io, TowerToHyperService::new(stack))
            .await
        {
            error!("Error serving connection from {}: {:?}", peer, err);
        }
    });
}

/// Re-read the config file on SIGHUP. A file that fails to load or
/// validate leaves the running config untouched.
#[cfg(unix)]
fn spawn_reload_task(path: String, live: LiveConfig) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                warn!("SIGHUP reload unavailable: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading {}", path);
            match load_config(&path) {
                Ok(config) => {
                    live.reload(config).await;
                    info!("Configuration reloaded");
                }
                Err(e) => error!("Reload failed, keeping current config: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_task(_path: String, _live: LiveConfig) {}
