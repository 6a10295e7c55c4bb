//! Parameter binding and validation.
//!
//! # Responsibilities
//! - Fill in defaults for absent optional parameters
//! - Reject requests missing a mandatory parameter
//! - Reject values failing their requirement regex
//!
//! # Design Decisions
//! - Validation runs top-down along the matched chain, outermost ancestor
//!   first, mirroring the order nested routers see the request
//! - Failures become request-scoped errors for the serving pipeline; they
//!   never abort the process
//! - An empty captured value counts as unset

use std::collections::HashMap;

use crate::error::RequestError;
use crate::routing::pattern::ParsedPattern;
use crate::routing::route::RouteId;
use crate::routing::table::RouteTable;

/// Validate and fill in the parameters of every node along `chain`
/// (outermost first), mutating `params` in place as defaults apply.
pub fn bind_chain(
    table: &RouteTable,
    chain: &[RouteId],
    params: &mut HashMap<String, String>,
) -> Result<(), RequestError> {
    for &id in chain {
        if let Some(parsed) = table.node(id).parsed() {
            bind_pattern(parsed, params)?;
        }
    }
    Ok(())
}

/// Validate and fill in the parameters of one parsed pattern.
pub fn bind_pattern(
    parsed: &ParsedPattern,
    params: &mut HashMap<String, String>,
) -> Result<(), RequestError> {
    for param in parsed.params() {
        let mut value = params.get(&param.name).filter(|v| !v.is_empty()).cloned();

        if value.is_none() {
            if let Some(default) = &param.default {
                params.insert(param.name.clone(), default.clone());
                value = Some(default.clone());
            }
        }

        let Some(value) = value else {
            if param.optional {
                continue;
            }
            return Err(RequestError::MissingParam {
                param: param.name.clone(),
            });
        };

        if !param.accepts(&value) {
            return Err(RequestError::InvalidParam {
                param: param.name.clone(),
                value,
            });
        }
    }
    Ok(())
}
