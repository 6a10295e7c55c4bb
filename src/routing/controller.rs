//! Controller registry and action resolution.
//!
//! # Responsibilities
//! - Hold the controller modules the application registers at boot
//! - Resolve a `"module:action"` or bare `"module"` reference into a fixed
//!   verb → action table for one terminal route
//! - Validate configured HTTP verbs
//!
//! # Design Decisions
//! - Controllers register with the registry at boot; there is no runtime
//!   module loading or reflection
//! - Verb-style resolution scans the module's own action names for
//!   recognized verbs, so a named-action module doubling as a verb map
//!   behaves the same as a dedicated one
//! - The resolved verb → action table is immutable after build

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::error::BuildError;

/// Recognized HTTP verbs, lower-cased.
pub const HTTP_METHODS: &[&str] = &[
    "get", "post", "put", "delete", "patch", "head", "options", "trace", "connect",
];

/// Whether `method` (already lower-cased) is a recognized HTTP verb.
pub fn is_http_method(method: &str) -> bool {
    HTTP_METHODS.contains(&method)
}

/// Per-request context handed to a controller action after the params of
/// the matched chain have been validated and filled in.
pub struct ActionContext {
    /// Path parameters, including substituted defaults.
    pub params: HashMap<String, String>,

    /// Name of the matched route.
    pub route: String,

    /// The original request.
    pub request: Request<Body>,
}

/// A controller action bound to one verb of one terminal route.
pub type Action = Arc<dyn Fn(ActionContext) -> BoxFuture<'static, Response> + Send + Sync>;

/// Build an [`Action`] from an async closure.
pub fn action<F, Fut>(f: F) -> Action
where
    F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// A registered controller module: a map from action name to action. For a
/// verb-style controller the action names are HTTP verbs.
#[derive(Default)]
pub struct Controller {
    actions: HashMap<String, Action>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one action under `name`.
    pub fn with_action<F, Fut>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Response> + Send + 'static,
    {
        self.actions.insert(name.to_string(), action(f));
        self
    }

    fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Action names that are recognized HTTP verbs (case-insensitive).
    fn verb_actions(&self) -> impl Iterator<Item = (String, &Action)> {
        self.actions.iter().filter_map(|(name, action)| {
            let verb = name.to_lowercase();
            is_http_method(&verb).then_some((verb, action))
        })
    }
}

/// Controller modules keyed by module path.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Controller>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller module under `path`.
    pub fn register(&mut self, path: &str, controller: Controller) {
        self.controllers.insert(path.to_string(), controller);
    }

    pub fn get(&self, path: &str) -> Option<&Controller> {
        self.controllers.get(path)
    }
}

/// A parsed controller reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerRef {
    pub module: String,
    pub action: Option<String>,
}

/// Split a `"module:action"` or bare `"module"` reference.
pub fn parse_controller_ref(reference: &str) -> ControllerRef {
    match reference.split_once(':') {
        Some((module, action)) => ControllerRef {
            module: module.to_string(),
            action: Some(action.to_string()),
        },
        None => ControllerRef {
            module: reference.to_string(),
            action: None,
        },
    }
}

/// Resolve a controller reference into the verb → action table for one
/// terminal route.
///
/// For the named-action form the verbs come from `methods` (falling back to
/// `default_method`); `"all"` anywhere in the list collapses it to a single
/// match-any binding. For the bare form every recognized verb among the
/// module's action names becomes a binding.
pub fn resolve(
    registry: &ControllerRegistry,
    route: &str,
    reference: &str,
    methods: Option<Vec<String>>,
    default_method: &str,
) -> Result<HashMap<String, Action>, BuildError> {
    let parsed = parse_controller_ref(reference);

    let controller =
        registry
            .get(&parsed.module)
            .ok_or_else(|| BuildError::UnknownController {
                module: parsed.module.clone(),
                route: route.to_string(),
            })?;

    let Some(action_name) = parsed.action else {
        // Verb-style controller.
        let actions: HashMap<String, Action> = controller
            .verb_actions()
            .map(|(verb, action)| (verb, Arc::clone(action)))
            .collect();

        if actions.is_empty() {
            return Err(BuildError::NoVerbActions {
                module: parsed.module,
                route: route.to_string(),
            });
        }

        return Ok(actions);
    };

    let action = controller
        .get(&action_name)
        .ok_or_else(|| BuildError::UnknownAction {
            module: parsed.module.clone(),
            action: action_name.clone(),
            route: route.to_string(),
        })?;

    let mut methods = match methods {
        Some(ms) if !ms.is_empty() => ms,
        _ => vec![default_method.to_lowercase()],
    };

    if methods.iter().any(|m| m == "all") {
        methods = vec!["all".to_string()];
    }

    let mut actions = HashMap::new();
    for method in methods {
        if method != "all" && !is_http_method(&method) {
            return Err(BuildError::InvalidMethod {
                method,
                route: route.to_string(),
            });
        }
        actions.insert(method, Arc::clone(action));
    }

    Ok(actions)
}
