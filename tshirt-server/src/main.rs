//! # T-Shirt Studio Server
//!
//! Serves design export and submission, or flattens a scene file offline.
//! Binds to localhost by default.

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tshirt_core::Scene;
use tshirt_renderer::{ExportConfig, SceneExporter, SourceLoader};

use tshirt_server::config::{Cli, Command, LogFormat, RenderArgs, ServeArgs};
use tshirt_server::{
    metrics, router, web_exporter, AppState, DesignMailer, LogMailer, MailSettings, OutboxMailer,
};

/// Initialize structured tracing.
///
/// Set `RUST_LOG` to control log levels (default: info,tshirt_server=debug,tower_http=debug).
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tshirt_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().into_command() {
        Command::Serve(args) => serve(args).await,
        Command::Render(args) => render(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    init_tracing(args.log_format);

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {e}"))?;
    tracing::info!("Prometheus metrics initialized");

    let mailer: Arc<dyn DesignMailer> = match &args.outbox_dir {
        Some(dir) => {
            tracing::info!("Queueing submissions in outbox {}", dir.display());
            Arc::new(OutboxMailer::new(dir))
        }
        None => {
            tracing::warn!("No outbox configured; submissions will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = AppState::new(
        web_exporter(ExportConfig::with_size(args.export_size)),
        mailer,
        MailSettings {
            from: args.sender_email.clone(),
            to: args.seller_email.clone(),
        },
    );

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);
    let app = router(state, args.port).merge(metrics_router);

    let addr = args.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("T-Shirt Studio server starting on http://{addr}");
    tracing::info!("Submissions go to {}", args.seller_email);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn render(args: RenderArgs) -> anyhow::Result<()> {
    init_tracing(args.log_format);

    let json = tokio::fs::read_to_string(&args.scene)
        .await
        .with_context(|| format!("Failed to read scene {}", args.scene.display()))?;
    let scene = Scene::from_json(&json).context("Invalid scene file")?;

    // Operator input: file and URL sources allowed, relative to the scene file
    let base_dir = args
        .scene
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_default();
    let exporter = SceneExporter::with_loader(
        ExportConfig::with_size(args.export_size),
        Arc::new(SourceLoader::new().with_base_dir(base_dir)),
    );

    let prepared = exporter.prepare(&scene).await?;
    if prepared.skipped_images() > 0 {
        tracing::warn!("{} image(s) could not be loaded", prepared.skipped_images());
    }
    let artifact = tokio::task::spawn_blocking(move || prepared.rasterize()).await??;

    tokio::fs::create_dir_all(&args.out).await?;
    let path = artifact.save_download(&args.out)?;
    println!("{}", path.display());
    Ok(())
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
