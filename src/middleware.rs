//! Scoped middleware registry.
//!
//! # Responsibilities
//! - Hold request hooks grouped by scope name
//! - Record which routes were registered with which scope at build time
//! - Run a route's scope hooks before its parameters are bound
//!
//! # Design Decisions
//! - The registry is an explicit object passed into the tree builder, not a
//!   process-wide singleton, so tree construction stays deterministic and
//!   testable in isolation
//! - Hooks run in registration order within a scope
//! - The builder is the only writer; after boot the registry is read-only

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RequestError;
use crate::routing::controller::ActionContext;

/// A request hook attached to a scope. Returning an error rejects the
/// request before any parameter binding or controller action runs.
pub type RequestHook = Arc<dyn Fn(&mut ActionContext) -> Result<(), RequestError> + Send + Sync>;

/// Collaborator interface the tree builder talks to when it encounters a
/// scoped route.
pub trait ModuleManager {
    /// Whether `scope` is defined.
    fn has_scope(&self, scope: &str) -> bool;

    /// Attach the scope's middleware to the named route. Called once per
    /// scoped route at mount time.
    fn register_middleware(&mut self, scope: &str, route: &str);
}

/// In-memory scope registry.
#[derive(Default)]
pub struct ScopeRegistry {
    hooks: HashMap<String, Vec<RequestHook>>,
    attachments: HashMap<String, Vec<String>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `scope` without any hooks.
    pub fn define_scope(&mut self, scope: &str) {
        self.hooks.entry(scope.to_string()).or_default();
    }

    /// Add a hook to `scope`, defining the scope if needed.
    pub fn add_hook<F>(&mut self, scope: &str, hook: F)
    where
        F: Fn(&mut ActionContext) -> Result<(), RequestError> + Send + Sync + 'static,
    {
        self.hooks
            .entry(scope.to_string())
            .or_default()
            .push(Arc::new(hook));
    }

    /// Scopes attached to `route`, in registration order.
    pub fn scopes_for(&self, route: &str) -> &[String] {
        self.attachments
            .get(route)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    /// Run every hook attached to `route` against the request context.
    pub fn run(&self, route: &str, ctx: &mut ActionContext) -> Result<(), RequestError> {
        for scope in self.scopes_for(route) {
            if let Some(hooks) = self.hooks.get(scope) {
                for hook in hooks {
                    hook(ctx)?;
                }
            }
        }
        Ok(())
    }
}

impl ModuleManager for ScopeRegistry {
    fn has_scope(&self, scope: &str) -> bool {
        self.hooks.contains_key(scope)
    }

    fn register_middleware(&mut self, scope: &str, route: &str) {
        self.attachments
            .entry(route.to_string())
            .or_default()
            .push(scope.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    fn ctx() -> ActionContext {
        ActionContext {
            params: HashMap::new(),
            route: "user.show".to_string(),
            request: Request::builder().body(Body::empty()).unwrap(),
        }
    }

    #[test]
    fn test_has_scope() {
        let mut registry = ScopeRegistry::new();
        assert!(!registry.has_scope("admin"));
        registry.define_scope("admin");
        assert!(registry.has_scope("admin"));
    }

    #[test]
    fn test_hooks_run_for_attached_routes_only() {
        let mut registry = ScopeRegistry::new();
        registry.add_hook("admin", |ctx| {
            ctx.params.insert("seen".to_string(), "yes".to_string());
            Ok(())
        });
        registry.register_middleware("admin", "user.show");

        let mut context = ctx();
        registry.run("user.show", &mut context).unwrap();
        assert_eq!(context.params["seen"], "yes");

        let mut other = ctx();
        registry.run("other.route", &mut other).unwrap();
        assert!(other.params.is_empty());
    }

    #[test]
    fn test_rejecting_hook() {
        let mut registry = ScopeRegistry::new();
        registry.add_hook("admin", |_ctx| {
            Err(RequestError::Rejected {
                scope: "admin".to_string(),
                reason: "no credentials".to_string(),
            })
        });
        registry.register_middleware("admin", "user.show");

        let err = registry.run("user.show", &mut ctx()).unwrap_err();
        assert!(matches!(err, RequestError::Rejected { .. }));
    }
}
