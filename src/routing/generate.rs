//! Reverse path generation.
//!
//! # Responsibilities
//! - Reconstruct a canonical path from a route name and a parameter set
//! - Apply defaults, skip absent optionals, enforce requirement regexes
//!
//! # Design Decisions
//! - Only terminal routes are valid generation targets
//! - The walk is strictly bottom-up (node to root) over the immutable table,
//!   so generation is safe from any number of concurrent callers
//! - Requirement checking can be disabled per call, matching the forward
//!   binder's checks being the authoritative ones

use std::collections::HashMap;

use crate::error::GenerateError;
use crate::routing::pattern::{sanitize, strip_meta, Segment};
use crate::routing::route::RoutePattern;
use crate::routing::table::RouteTable;

impl RouteTable {
    /// Generate the canonical path for the named route.
    ///
    /// Absent parameters fall back to their defaults; absent optionals
    /// without a default are skipped; anything else absent is an error.
    pub fn generate_path(
        &self,
        name: &str,
        params: &HashMap<String, String>,
        check_requirements: bool,
    ) -> Result<String, GenerateError> {
        let id = self
            .id_of(name)
            .ok_or_else(|| GenerateError::RouteNotFound {
                name: name.to_string(),
            })?;

        if !self.node(id).is_terminal() {
            return Err(GenerateError::NotAnEndpoint {
                name: name.to_string(),
            });
        }

        let mut fragments = Vec::new();
        let mut current = Some(id);

        while let Some(node_id) = current {
            let node = self.node(node_id);

            let fragment = match &node.matcher {
                RoutePattern::Raw(_) => {
                    return Err(GenerateError::RawPattern {
                        name: name.to_string(),
                        via: node.name.clone(),
                    });
                }
                RoutePattern::Root => "/".to_string(),
                RoutePattern::Parsed(parsed) => {
                    let mut fragment = String::new();
                    for segment in &parsed.segments {
                        match segment {
                            Segment::Literal { value } => {
                                fragment.push('/');
                                fragment.push_str(&strip_meta(value));
                            }
                            Segment::Wildcard { cleaned } => {
                                fragment.push('/');
                                fragment.push_str(cleaned);
                            }
                            Segment::Param(param) => {
                                let supplied =
                                    params.get(&param.name).filter(|v| !v.is_empty()).cloned();
                                let used_default = supplied.is_none();

                                let value = match supplied.or_else(|| param.default.clone()) {
                                    Some(value) => value,
                                    None if param.optional => continue,
                                    None => {
                                        return Err(GenerateError::ParamNotSet {
                                            name: name.to_string(),
                                            param: param.name.clone(),
                                        });
                                    }
                                };

                                if check_requirements && !param.accepts(&value) {
                                    return Err(GenerateError::RequirementFailed {
                                        name: name.to_string(),
                                        param: param.name.clone(),
                                        value,
                                        used_default,
                                        chain: self.chain_display(id),
                                    });
                                }

                                fragment.push('/');
                                fragment.push_str(&value);
                            }
                        }
                    }
                    fragment
                }
            };

            fragments.push(fragment);
            current = node.parent;
        }

        // Outermost ancestor first, then collapse slashes.
        fragments.reverse();
        Ok(sanitize(&fragments.concat()))
    }
}
