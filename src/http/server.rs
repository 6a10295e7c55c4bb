//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Mount the route table behind a catch-all axum route
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch matched requests: scope hooks, parameter binding, action
//! - Turn binder failures into error responses without touching other
//!   in-flight requests
//!
//! # Design Decisions
//! - One catch-all handler; the route table performs the hierarchical
//!   matching, so verb errors can distinguish 404 from 405
//! - Scope hooks and parameter validation run top-down along the matched
//!   chain, outermost ancestor first
//! - `AppState` carries only `Arc`s and small config; cloning is cheap

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{AppConfig, ServerConfig};
use crate::error::{GenerateError, RequestError};
use crate::http::request_id::RequestIdLayer;
use crate::http::url;
use crate::middleware::ScopeRegistry;
use crate::routing::binder;
use crate::routing::controller::ActionContext;
use crate::routing::RouteTable;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub modules: Arc<ScopeRegistry>,
    pub server: ServerConfig,
}

impl AppState {
    /// Reverse-generate a path for a named route.
    pub fn generate_path(
        &self,
        name: &str,
        params: &HashMap<String, String>,
        check_requirements: bool,
    ) -> Result<String, GenerateError> {
        self.table.generate_path(name, params, check_requirements)
    }

    /// Reverse-generate a protocol-relative URL for a named route.
    pub fn generate_url(
        &self,
        name: &str,
        params: &HashMap<String, String>,
        check_requirements: bool,
    ) -> Result<String, GenerateError> {
        let path = self.generate_path(name, params, check_requirements)?;
        Ok(url::absolute_url(&self.server, &path, None, None))
    }

    /// Reverse-generate an absolute URL, inferring scheme and port from the
    /// current request's headers.
    pub fn generate_url_for(
        &self,
        name: &str,
        params: &HashMap<String, String>,
        check_requirements: bool,
        headers: &HeaderMap,
    ) -> Result<String, GenerateError> {
        let path = self.generate_path(name, params, check_requirements)?;
        let secure = url::infer_secure(headers, self.server.trust_proxy);
        let forwarded = url::forwarded_port(headers, self.server.trust_proxy);
        Ok(url::absolute_url(
            &self.server,
            &path,
            Some(secure),
            forwarded,
        ))
    }
}

/// HTTP server for the routing tree.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a built route table.
    pub fn new(config: &AppConfig, table: Arc<RouteTable>, modules: Arc<ScopeRegistry>) -> Self {
        let state = AppState {
            table,
            modules,
            server: config.server.clone(),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The underlying axum router, for tests and embedding.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(crate::boot::shutdown_signal())
            .await
    }
}

/// The single entry point for every request: match, run scope hooks, bind
/// parameters, invoke the action.
async fn dispatch(State(state): State<AppState>, req: Request<Body>) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().as_str().to_lowercase();

    let matches = state.table.matches(&path);
    if matches.is_empty() {
        return RequestError::NoRoute { path }.into_response();
    }

    // Several terminal routes may share a path while serving different
    // verbs; take the first that serves this one.
    let Some((matched, action)) = matches.iter().find_map(|m| {
        let actions = state.table.node(m.id).actions()?;
        actions
            .get(&method)
            .or_else(|| actions.get("all"))
            .map(|action| (m, Arc::clone(action)))
    }) else {
        return RequestError::MethodNotAllowed { method, path }.into_response();
    };

    let route = state.table.node(matched.id).name.clone();
    let mut ctx = ActionContext {
        params: matched.params.clone(),
        route: route.clone(),
        request: req,
    };

    // Scoped middleware runs for every node along the chain, outermost
    // ancestor first, before any parameter is bound.
    for &id in &matched.chain {
        if let Err(error) = state.modules.run(&state.table.node(id).name, &mut ctx) {
            tracing::warn!(route = %route, %error, "request rejected by scoped middleware");
            return error.into_response();
        }
    }

    if let Err(error) = binder::bind_chain(&state.table, &matched.chain, &mut ctx.params) {
        tracing::warn!(route = %route, %error, "parameter binding failed");
        return error.into_response();
    }

    action(ctx).await
}
