//! Service runtime demo binary.
//!
//! # Architecture Overview
//!
//! ```text
//!  config (TOML + env) ──▶ logging ──▶ Runtime::build_or_exit([http-server, …])
//!                                              │
//!                                              ▼
//!                                     Runtime::start (in order)
//!                                              │
//!         request ──▶ correlation id ──▶ wide event ──▶ handler ──▶ commit (one record)
//!                                              │
//!                               SIGINT / SIGTERM
//!                                              ▼
//!                                     Runtime::stop (reverse order)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::Path, routing::get, Router};
use clap::Parser;

use service_runtime::config::{load_config, load_from_env};
use service_runtime::http::http_component;
use service_runtime::lifecycle::{wait_for_signal, BoxError, Runtime, Setup, Starter};
use service_runtime::observability::{
    init_logging, metrics, Attr, EventContext, EventSink, JsonSink, TracingSink,
};

#[derive(Parser)]
#[command(name = "service-runtime")]
#[command(about = "Demo service for the lifecycle runtime and wide events", long_about = None)]
struct Args {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    let level = init_logging(&config.logging)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %level,
        address = %config.server.address,
        tls = config.server.tls.enabled,
        "service-runtime starting"
    );

    let sink: Arc<dyn EventSink> = if config.logging.json {
        Arc::new(JsonSink::stdout())
    } else {
        Arc::new(TracingSink)
    };
    let root = EventContext::new(sink).with_fields([Attr::new("service", env!("CARGO_PKG_NAME"))]);
    let metrics_config = config.metrics.clone();

    let metrics_setup = Setup::new("metrics", move || {
        if !metrics_config.enabled {
            return Ok(None);
        }
        let addr: SocketAddr = metrics_config.address.parse()?;
        Ok(Some(Starter::new(move || async move {
            metrics::init_metrics(addr)?;
            Ok::<_, BoxError>(None)
        })))
    });
    let (http_setup, _) = http_component(config.server, routes(), root);

    let mut runtime = Runtime::build_or_exit([metrics_setup, http_setup]);
    runtime.run_until(wait_for_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/hello/{name}", get(hello))
}

async fn hello(ctx: EventContext, Path(name): Path<String>) -> String {
    if let Some(event) = ctx.wide_event() {
        event.add([Attr::new("greeted", name.clone())]);
    }
    format!("hello, {name}")
}
