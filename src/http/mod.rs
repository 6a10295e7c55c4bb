//! HTTP serving layer: axum mounting, dispatch, request IDs, URL helpers.

pub mod request_id;
pub mod server;
pub mod url;

pub use server::AppState;
pub use server::HttpServer;
