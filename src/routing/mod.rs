//! The routing engine.
//!
//! # Data Flow
//! ```text
//! routing files ──▶ builder ──▶ RouteTable (immutable after boot)
//!                                  │
//!            request path ──▶ table.match_path ──▶ binder ──▶ action
//!                                  │
//!            route name + params ──▶ generate_path / generate_url
//! ```
//!
//! # Design Decisions
//! - The table is built synchronously at boot and shared via `Arc`;
//!   request handling only ever reads it
//! - Matching, binding, and generation are separate passes: matching
//!   captures raw values, binding validates them top-down along the chain,
//!   generation walks bottom-up

pub mod binder;
pub mod builder;
pub mod controller;
pub mod generate;
pub mod pattern;
pub mod route;
pub mod table;

pub use builder::TreeBuilder;
pub use controller::{Action, ActionContext, Controller, ControllerRegistry};
pub use route::{RouteId, RouteKind, RouteNode};
pub use table::{RouteMatch, RouteTable};
