//! Trellis server binary.
//!
//! Loads the app configuration, registers the built-in demo controllers,
//! builds the routing tree under the startup timeout, and serves it.

use std::path::PathBuf;

use axum::response::IntoResponse;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trellis::boot;
use trellis::config::{loader, AppConfig};
use trellis::routing::Controller;
use trellis::{ControllerRegistry, ScopeRegistry};

#[derive(Parser)]
#[command(name = "trellis", about = "Config-driven routing tree server")]
struct Args {
    /// Path to the app configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Built-in controllers the demo routing files can reference.
fn controllers() -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();

    registry.register(
        "pages",
        Controller::new().with_action("home", |ctx| async move {
            format!("trellis is serving route \"{}\"\n", ctx.route).into_response()
        }),
    );

    registry.register(
        "echo",
        Controller::new()
            .with_action("get", |ctx| async move {
                axum::Json(ctx.params).into_response()
            })
            .with_action("post", |ctx| async move {
                axum::Json(ctx.params).into_response()
            }),
    );

    registry
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => loader::load_app_config(path)?,
        None => AppConfig::default(),
    };

    tracing::info!(
        bind_address = %config.server.bind_address,
        routing_root = %config.routing.root_path.display(),
        entry = %config.routing.entry,
        "configuration loaded"
    );

    let controllers = controllers();
    let modules = ScopeRegistry::new();

    let (server, listener) = boot::bootstrap(&config, &controllers, modules).await?;
    server.run(listener).await?;

    Ok(())
}
