//! Configuration loading from disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::schema::{AppConfig, RouteDefinition};
use crate::error::BuildError;

/// Load the app configuration from a TOML file.
pub fn load_app_config(path: &Path) -> Result<AppConfig, BuildError> {
    let content = fs::read_to_string(path).map_err(|source| BuildError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| BuildError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one routing definition file.
///
/// Returns the definitions keyed by route name. A `BTreeMap` keeps sibling
/// build order deterministic (name order).
pub fn load_routing_file(path: &Path) -> Result<BTreeMap<String, RouteDefinition>, BuildError> {
    let content = fs::read_to_string(path).map_err(|source| BuildError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| BuildError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}
