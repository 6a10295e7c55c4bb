//! Configuration schema definitions.
//!
//! This module defines the app-level configuration and the shape of the
//! routing definition files. All types derive Serde traits for
//! deserialization from TOML.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the web process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and external-URL settings.
    pub server: ServerConfig,

    /// Routing-tree settings.
    pub routing: RoutingConfig,
}

/// Listener and external-URL configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Externally visible hostname used when generating absolute URLs.
    pub host: String,

    /// Externally visible port, when it differs from the listener port
    /// (e.g., behind a proxy).
    pub external_port: Option<u16>,

    /// Trust `X-Forwarded-*` headers when inferring request security.
    pub trust_proxy: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum time the whole bootstrap may take before the process
    /// reports a boot failure.
    pub startup_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            host: "localhost".to_string(),
            external_port: None,
            trust_proxy: false,
            request_timeout_secs: 30,
            startup_timeout_secs: 30,
        }
    }
}

/// Routing-tree configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Directory holding the routing definition files.
    pub root_path: PathBuf,

    /// Entry file, resolved relative to `root_path`.
    pub entry: String,

    /// Verb bound when a route definition names an action but no methods.
    pub default_method: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("routing"),
            entry: "routing.toml".to_string(),
            default_method: "get".to_string(),
        }
    }
}

/// One named route definition as it appears in a routing file.
///
/// `resource` and `controller` are mutually exclusive: a route either groups
/// the definitions of another file under its pattern, or it is an endpoint
/// bound to controller actions.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RouteDefinition {
    /// Path pattern, e.g. `/users/:id`.
    pub pattern: Option<String>,

    /// Controller reference: `"module"` (verb-style) or `"module:action"`.
    pub controller: Option<String>,

    /// HTTP verbs to bind, a single string or a list. `"all"` collapses the
    /// list to a match-any binding.
    pub methods: Option<Methods>,

    /// Path to a child routing file, resolved relative to the routing root.
    pub resource: Option<String>,

    /// Default values per parameter. A parameter with a default is optional.
    pub defaults: HashMap<String, String>,

    /// Requirement regex per parameter, optionally wrapped in `/` delimiters.
    pub requirements: HashMap<String, String>,

    /// Middleware scope to register this route with.
    pub scope: Option<String>,

    /// Treat the pattern as a raw regex matcher. Raw routes extract no
    /// parameters and cannot be reverse-generated.
    pub raw: bool,
}

/// `methods` accepts either a single verb or a list of verbs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Methods {
    One(String),
    Many(Vec<String>),
}

impl Methods {
    /// Lower-cased verb list; an empty string or list yields an empty list.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Methods::One(m) if m.is_empty() => Vec::new(),
            Methods::One(m) => vec![m.to_lowercase()],
            Methods::Many(ms) => ms.iter().map(|m| m.to_lowercase()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_app_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.routing.entry, "routing.toml");
        assert_eq!(config.routing.default_method, "get");
        assert!(!config.server.trust_proxy);
    }

    #[test]
    fn test_route_definition_fields() {
        let def: RouteDefinition = toml::from_str(
            r#"
            pattern = "/users/:id"
            controller = "user:show"
            methods = ["GET", "post"]

            [requirements]
            id = "/^\\d+$/"
            "#,
        )
        .unwrap();

        assert_eq!(def.pattern.as_deref(), Some("/users/:id"));
        assert_eq!(
            def.methods.unwrap().to_vec(),
            vec!["get".to_string(), "post".to_string()]
        );
        assert_eq!(def.requirements["id"], "/^\\d+$/");
    }

    #[test]
    fn test_methods_single_string() {
        let def: RouteDefinition = toml::from_str(r#"methods = "ALL""#).unwrap();
        assert_eq!(def.methods.unwrap().to_vec(), vec!["all".to_string()]);
    }
}
