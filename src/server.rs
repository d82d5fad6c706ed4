use std::{ net::SocketAddr, time::Duration };
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{ header, HeaderValue, Method },
    Router,
};
use clap::Parser;
use tower_http::{
    cors::{ AllowOrigin, CorsLayer },
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{ info, warn };
use tracing_subscriber::EnvFilter;
use qplay::{
    api::{ self, AppState },
    limits::{
        Limits,
        DEF_MAX_DIM,
        DEF_MAX_GRID_POINTS,
        DEF_MAX_SAMPLES,
        DEF_MAX_STEPS,
        DEF_MAX_SWEEP,
    },
};

/// Serve the qplay engine over HTTP.
#[derive(Parser, Debug)]
#[command(name = "qplay-server", version)]
#[command(about = "JSON API for the qplay quantum mechanics engine")]
struct Args {
    /// Address to bind
    #[arg(long, env = "QPLAY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, env = "QPLAY_PORT", default_value_t = 8000)]
    port: u16,

    /// Allowed CORS origin; `*` allows any
    #[arg(
        long = "cors-origin",
        env = "QPLAY_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = ["http://localhost:3000", "http://localhost:5173"],
    )]
    cors_origins: Vec<String>,

    /// Per-request time limit in seconds
    #[arg(long, env = "QPLAY_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Largest accepted request body in bytes
    #[arg(long, env = "QPLAY_MAX_BODY_BYTES", default_value_t = 4 * 1024 * 1024)]
    max_body_bytes: usize,

    /// Largest matrix dimension
    #[arg(long, env = "QPLAY_MAX_DIM", default_value_t = DEF_MAX_DIM)]
    max_dim: usize,

    /// Largest spatial grid
    #[arg(long, env = "QPLAY_MAX_GRID_POINTS", default_value_t = DEF_MAX_GRID_POINTS)]
    max_grid_points: usize,

    /// Largest number of time samples
    #[arg(long, env = "QPLAY_MAX_STEPS", default_value_t = DEF_MAX_STEPS)]
    max_steps: usize,

    /// Longest parameter sweep
    #[arg(long, env = "QPLAY_MAX_SWEEP", default_value_t = DEF_MAX_SWEEP)]
    max_sweep: usize,

    /// Largest number of elements in a returned 2D array
    #[arg(long, env = "QPLAY_MAX_SAMPLES", default_value_t = DEF_MAX_SAMPLES)]
    max_samples: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "QPLAY_LOG", default_value = "info")]
    log_level: String,
}

impl Args {
    fn limits(&self) -> Limits {
        Limits {
            max_dim: self.max_dim,
            max_grid_points: self.max_grid_points,
            max_steps: self.max_steps,
            max_sweep: self.max_sweep,
            max_samples: self.max_samples,
        }
    }

    fn cors(&self) -> anyhow::Result<CorsLayer> {
        let origin
            = if self.cors_origins.iter().any(|o| o == "*") {
                AllowOrigin::any()
            } else {
                let origins: Vec<HeaderValue>
                    = self.cors_origins.iter()
                    .map(|o| {
                        o.parse::<HeaderValue>()
                            .with_context(|| format!("invalid CORS origin {o:?}"))
                    })
                    .collect::<anyhow::Result<_>>()?;
                AllowOrigin::list(origins)
            };
        Ok(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        )
    }
}

fn app(args: &Args) -> anyhow::Result<Router> {
    let state = AppState { limits: args.limits() };
    let app
        = api::router(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(args.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(args.request_timeout_secs)))
        .layer(args.cors()?)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter
        = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = app(&args)?;
    let listener
        = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, limits = ?args.limits(), "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
