//! Error taxonomy.
//!
//! # Responsibilities
//! - `BuildError`: anything that makes the route tree unbuildable; fatal
//!   at boot, never seen by a request
//! - `RequestError`: per-request failures that map onto HTTP status codes
//! - `GenerateError`: reverse-routing failures, reported synchronously to
//!   the caller asking for a path or URL
//!
//! # Design Decisions
//! - Build failures carry the route name (and file context where the
//!   loader has it) so a bad definition can be found without a debugger
//! - `RequestError` implements `IntoResponse`; the dispatch handler turns
//!   every rejection into a plain-text response with the right status

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while loading routing files and assembling the route tree.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A configuration or routing file could not be read.
    #[error("cannot read {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration or routing file is not valid TOML.
    #[error("cannot parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The same route name appears twice anywhere in the tree.
    #[error("route \"{name}\" is defined more than once; route names are global")]
    DuplicateRoute { name: String },

    /// A route definition has neither a pattern nor a resource.
    #[error("route \"{name}\" has no pattern")]
    MissingPattern { name: String },

    /// A terminal route definition names no controller.
    #[error("route \"{name}\" has no controller")]
    MissingController { name: String },

    /// A definition names both a resource and a controller.
    #[error("route \"{name}\" declares both a resource and a controller; pick one")]
    ConflictingDefinition { name: String },

    /// A controller reference names a module nobody registered.
    #[error("route \"{route}\" references unknown controller \"{module}\"")]
    UnknownController { module: String, route: String },

    /// A controller reference names an action the module does not have.
    #[error("route \"{route}\" references unknown action \"{module}:{action}\"")]
    UnknownAction {
        module: String,
        action: String,
        route: String,
    },

    /// A bare controller reference whose module exposes no verb-named actions.
    #[error("route \"{route}\" uses controller \"{module}\" verb-style, but it has no verb-named actions")]
    NoVerbActions { module: String, route: String },

    /// A methods list contains something that is not an HTTP method.
    #[error("route \"{route}\" lists invalid method \"{method}\"")]
    InvalidMethod { method: String, route: String },

    /// More than one optional parameter along a single root-to-leaf chain.
    #[error("more than one optional parameter on route chain: {chain}")]
    MultipleOptionalParams { chain: String },

    /// A requirement regex does not compile.
    #[error("route \"{route}\" has a bad requirement for param \"{param}\": {source}")]
    BadRequirement {
        route: String,
        param: String,
        #[source]
        source: regex::Error,
    },

    /// A raw pattern does not compile as a regex.
    #[error("route \"{route}\" has a bad raw pattern: {source}")]
    BadRawPattern {
        route: String,
        #[source]
        source: regex::Error,
    },

    /// A route names a scope no module manager knows about.
    #[error("route \"{route}\" references unknown scope \"{scope}\"")]
    UnknownScope { scope: String, route: String },
}

/// Per-request failures. Each maps onto an HTTP status code via
/// [`RequestError::status`].
#[derive(Debug, Error)]
pub enum RequestError {
    /// No route matches the request path.
    #[error("no route matches {path}")]
    NoRoute { path: String },

    /// A route matches the path but none serves the request method.
    #[error("method {method} is not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },

    /// A mandatory parameter is absent and has no default.
    #[error("missing mandatory parameter \"{param}\"")]
    MissingParam { param: String },

    /// A captured value fails its requirement regex.
    #[error("invalid value \"{value}\" for parameter \"{param}\"")]
    InvalidParam { param: String, value: String },

    /// A scoped middleware hook rejected the request.
    #[error("rejected by scope \"{scope}\": {reason}")]
    Rejected { scope: String, reason: String },
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::NoRoute { .. } => StatusCode::NOT_FOUND,
            RequestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::MissingParam { .. } | RequestError::InvalidParam { .. } => {
                StatusCode::BAD_REQUEST
            }
            RequestError::Rejected { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Reverse-routing failures.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// No route carries the requested name.
    #[error("cannot generate path for unknown route \"{name}\"")]
    RouteNotFound { name: String },

    /// The named route only groups children and serves nothing itself.
    #[error("route \"{name}\" is not an endpoint; paths are generated for terminal routes only")]
    NotAnEndpoint { name: String },

    /// A node along the chain uses a raw regex matcher, which cannot be
    /// turned back into a concrete path.
    #[error("route \"{name}\" cannot be generated: \"{via}\" uses a raw pattern")]
    RawPattern { name: String, via: String },

    /// A mandatory parameter was neither supplied nor defaulted.
    #[error("cannot generate path for route \"{name}\": parameter \"{param}\" is not set")]
    ParamNotSet { name: String, param: String },

    /// A resolved value does not satisfy its requirement regex.
    #[error(
        "cannot generate path for route \"{name}\": value \"{value}\" does not pass the \
         requirement for param \"{param}\" (chain: {chain})"
    )]
    RequirementFailed {
        name: String,
        param: String,
        value: String,
        /// True when the failing value came from the route's defaults
        /// rather than the caller.
        used_default: bool,
        chain: String,
    },
}
