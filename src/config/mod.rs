//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! app config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → AppConfig (immutable)
//!     → shared with the server and URL helpers
//!
//! routing files (TOML, one per resource)
//!     → loader.rs (parse & deserialize)
//!     → routing::builder (tree assembly)
//!     → RouteTable (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the route table never changes after boot
//! - All app-config fields have defaults to allow minimal configs
//! - Routing files are read only at boot, never at request time

pub mod loader;
pub mod schema;

pub use schema::AppConfig;
pub use schema::RouteDefinition;
pub use schema::RoutingConfig;
pub use schema::ServerConfig;
