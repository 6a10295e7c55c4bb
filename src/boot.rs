//! Process bootstrap.
//!
//! # Responsibilities
//! - Build the route tree and bind the listener, under a startup timeout
//! - Provide the graceful-shutdown signal
//!
//! # Design Decisions
//! - The whole bootstrap runs inside one `tokio::time::timeout`; on expiry
//!   the partially constructed state is dropped and the process reports a
//!   boot failure instead of serving
//! - The route table is sealed into an `Arc` here; nothing mutates it
//!   afterwards

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::error::BuildError;
use crate::http::HttpServer;
use crate::middleware::ScopeRegistry;
use crate::routing::{ControllerRegistry, TreeBuilder};

/// Errors that abort the bootstrap.
#[derive(Debug, Error)]
pub enum BootError {
    /// Startup did not finish within the configured timeout.
    #[error("boot did not complete within {0} seconds")]
    Timeout(u64),

    /// The route tree could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The listener could not be bound.
    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the route tree, bind the listener, and assemble the server.
pub async fn bootstrap(
    config: &AppConfig,
    controllers: &ControllerRegistry,
    mut modules: ScopeRegistry,
) -> Result<(HttpServer, TcpListener), BootError> {
    let timeout = config.server.startup_timeout_secs;

    tokio::time::timeout(std::time::Duration::from_secs(timeout), async {
        let table = TreeBuilder::new(&config.routing, controllers)
            .with_modules(&mut modules)
            .build()?;

        let listener = TcpListener::bind(&config.server.bind_address)
            .await
            .map_err(|source| BootError::Bind {
                address: config.server.bind_address.clone(),
                source,
            })?;

        let server = HttpServer::new(config, Arc::new(table), Arc::new(modules));
        Ok((server, listener))
    })
    .await
    .map_err(|_| BootError::Timeout(timeout))?
}

/// Resolves when the process receives a termination signal.
pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install shutdown signal handler");
    }
}
