//! Trellis: a config-driven routing tree for axum web processes.
//!
//! # Architecture Overview
//!
//! ```text
//!   routing files (TOML)          controllers (registered at boot)
//!          │                               │
//!          ▼                               ▼
//!   ┌────────────┐   resolve    ┌────────────────────┐
//!   │  builder   │─────────────▶│ ControllerRegistry │
//!   └─────┬──────┘              └────────────────────┘
//!         │ assemble
//!         ▼
//!   ┌────────────┐   Arc        ┌────────────────────┐
//!   │ RouteTable │─────────────▶│  HttpServer (axum) │──▶ requests
//!   └─────┬──────┘              └────────────────────┘
//!         │
//!         └──▶ generate_path / generate_url (reverse routing)
//! ```
//!
//! The table is built synchronously at boot and immutable afterwards;
//! request dispatch, parameter binding, and reverse generation only read it.

pub mod boot;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routing;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use middleware::{ModuleManager, ScopeRegistry};
pub use routing::{Controller, ControllerRegistry, RouteTable, TreeBuilder};
