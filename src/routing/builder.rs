//! Route tree construction.
//!
//! # Data Flow
//! ```text
//! entry routing file
//!     → load phase (recursive `resource` resolution, name uniqueness,
//!       empty-resource pruning)
//!     → raw route forest
//!     → assemble phase (pattern parsing, chain invariants, controller
//!       resolution, scope registration)
//!     → RouteTable (immutable)
//! ```
//!
//! # Design Decisions
//! - Route-name uniqueness is global across every loaded file, not just
//!   among siblings
//! - A `resource` route whose file yields no children is pruned silently;
//!   pruning is not an error
//! - All file I/O happens here, at boot; the resulting table never touches
//!   the filesystem again

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::loader::load_routing_file;
use crate::config::schema::{RouteDefinition, RoutingConfig};
use crate::error::BuildError;
use crate::middleware::ModuleManager;
use crate::routing::controller::{resolve, ControllerRegistry};
use crate::routing::pattern::{parse, sanitize, ParseOutcome};
use crate::routing::route::{RouteId, RouteKind, RouteNode, RoutePattern};
use crate::routing::table::RouteTable;

/// One named definition after the load phase, children already resolved.
struct RawRoute {
    name: String,
    def: RouteDefinition,
    file: PathBuf,
    children: Vec<RawRoute>,
}

/// Builds a [`RouteTable`] from the routing files under a root path.
pub struct TreeBuilder<'a> {
    routing: &'a RoutingConfig,
    controllers: &'a ControllerRegistry,
    modules: Option<&'a mut dyn ModuleManager>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(routing: &'a RoutingConfig, controllers: &'a ControllerRegistry) -> Self {
        Self {
            routing,
            controllers,
            modules: None,
        }
    }

    /// Attach the module manager scoped routes register with.
    pub fn with_modules(mut self, modules: &'a mut dyn ModuleManager) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Load the entry file and build the whole tree.
    pub fn build(mut self) -> Result<RouteTable, BuildError> {
        let mut seen = HashSet::new();
        let forest = load_forest(
            &self.routing.root_path,
            &self.routing.entry,
            &mut seen,
        )?;

        let mut nodes = Vec::new();
        let mut by_name = HashMap::new();
        let mut roots = Vec::new();

        for raw in forest {
            let id = self.mount(&mut nodes, &mut by_name, raw, None)?;
            roots.push(id);
        }

        tracing::info!(routes = nodes.len(), "successfully set up routing");
        Ok(RouteTable::new(nodes, by_name, roots))
    }

    fn mount(
        &mut self,
        nodes: &mut Vec<RouteNode>,
        by_name: &mut HashMap<String, RouteId>,
        raw: RawRoute,
        parent: Option<RouteId>,
    ) -> Result<RouteId, BuildError> {
        let RawRoute {
            name,
            def,
            file,
            children,
        } = raw;

        let is_terminal = def.resource.is_none();

        let (pattern, matcher) = if def.raw {
            // Raw patterns skip sanitizing (it would mangle the regex
            // source) and are anchored over the whole remaining path, so a
            // raw route cannot match inside an unrelated path.
            let source = def.pattern.unwrap_or_default();
            let re = Regex::new(&format!("^(?:{source})$")).map_err(|source| {
                BuildError::BadRawPattern {
                    route: name.clone(),
                    source,
                }
            })?;
            (source, RoutePattern::Raw(re))
        } else {
            let sanitized = sanitize(def.pattern.as_deref().unwrap_or_default());
            match parse(&name, &sanitized, &def.defaults, &def.requirements)? {
                ParseOutcome::Root => ("/".to_string(), RoutePattern::Root),
                ParseOutcome::Pattern { pattern, parsed } => {
                    (pattern, RoutePattern::Parsed(parsed))
                }
            }
        };

        // At most one optional parameter across the whole chain.
        if let RoutePattern::Parsed(parsed) = &matcher {
            let mut optionals = parsed.optional_params.len();
            let mut ancestor = parent;
            while let Some(id) = ancestor {
                let node = &nodes[id];
                if let Some(p) = node.parsed() {
                    optionals += p.optional_params.len();
                }
                ancestor = node.parent;
            }
            if optionals > 1 {
                return Err(BuildError::MultipleOptionalParams {
                    chain: chain_of(nodes, parent, &name),
                });
            }
        }

        let kind = if is_terminal {
            let controller = def
                .controller
                .as_deref()
                .ok_or_else(|| BuildError::MissingController { name: name.clone() })?;
            let actions = resolve(
                self.controllers,
                &name,
                controller,
                def.methods.as_ref().map(|m| m.to_vec()),
                &self.routing.default_method.to_lowercase(),
            )?;
            RouteKind::Terminal { actions }
        } else {
            RouteKind::Segment {
                children: Vec::new(),
            }
        };

        // Scoped routes register with the module manager before mounting.
        if let Some(scope) = &def.scope {
            if let Some(modules) = self.modules.as_deref_mut() {
                if !modules.has_scope(scope) {
                    return Err(BuildError::UnknownScope {
                        scope: scope.clone(),
                        route: name.clone(),
                    });
                }
                modules.register_middleware(scope, &name);
            }
        }

        let id = nodes.len();
        nodes.push(RouteNode {
            name: name.clone(),
            pattern,
            matcher,
            parent,
            config_file: file,
            scope: def.scope,
            kind,
        });
        by_name.insert(name, id);

        let mut child_ids = Vec::new();
        for child in children {
            child_ids.push(self.mount(nodes, by_name, child, Some(id))?);
        }
        if let RouteKind::Segment { children } = &mut nodes[id].kind {
            *children = child_ids;
        }

        Ok(id)
    }
}

/// Load `file` and, recursively, every file it references through
/// `resource`, enforcing global name uniqueness and pruning resource routes
/// with no children.
fn load_forest(
    root: &Path,
    file: &str,
    seen: &mut HashSet<String>,
) -> Result<Vec<RawRoute>, BuildError> {
    let path = root.join(file);
    let defs = load_routing_file(&path)?;

    let mut forest = Vec::new();
    for (name, def) in defs {
        if !seen.insert(name.clone()) {
            return Err(BuildError::DuplicateRoute { name });
        }

        if def.pattern.is_none() {
            return Err(BuildError::MissingPattern { name });
        }

        if def.resource.is_some() && def.controller.is_some() {
            return Err(BuildError::ConflictingDefinition { name });
        }

        let children = match &def.resource {
            Some(resource) => {
                let children = load_forest(root, resource, seen)?;
                if children.is_empty() {
                    // No need to create the segment route at all. Its name
                    // stays available for a later definition.
                    tracing::debug!(route = %name, resource = %resource, "skipping empty resource route");
                    seen.remove(&name);
                    continue;
                }
                children
            }
            None => Vec::new(),
        };
        forest.push(RawRoute {
            name,
            def,
            file: path.clone(),
            children,
        });
    }

    Ok(forest)
}

fn chain_of(nodes: &[RouteNode], parent: Option<RouteId>, name: &str) -> String {
    let mut names = vec![name.to_string()];
    let mut ancestor = parent;
    while let Some(id) = ancestor {
        names.push(nodes[id].name.clone());
        ancestor = nodes[id].parent;
    }
    names.reverse();
    names.join(" → ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::ScopeRegistry;
    use crate::routing::controller::Controller;
    use axum::response::IntoResponse;
    use std::fs;

    fn registry() -> ControllerRegistry {
        let mut registry = ControllerRegistry::new();
        registry.register(
            "user",
            Controller::new()
                .with_action("show", |_ctx| async { "show".into_response() })
                .with_action("list", |_ctx| async { "list".into_response() }),
        );
        registry.register(
            "pages",
            Controller::new().with_action("home", |_ctx| async { "home".into_response() }),
        );
        registry.register(
            "api",
            Controller::new()
                .with_action("get", |_ctx| async { "get".into_response() })
                .with_action("post", |_ctx| async { "post".into_response() }),
        );
        registry
    }

    fn fixture(test: &str, files: &[(&str, &str)]) -> RoutingConfig {
        let dir = std::env::temp_dir().join(format!(
            "trellis-builder-{}-{}",
            std::process::id(),
            test
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
        RoutingConfig {
            root_path: dir,
            entry: "routing.toml".to_string(),
            default_method: "get".to_string(),
        }
    }

    #[test]
    fn test_build_nested_tree() {
        let routing = fixture(
            "nested",
            &[
                (
                    "routing.toml",
                    r#"
                    [home]
                    pattern = "/"
                    controller = "pages:home"

                    [users]
                    pattern = "/users"
                    resource = "users.toml"
                    "#,
                ),
                (
                    "users.toml",
                    r#"
                    [ "user.show" ]
                    pattern = "/:id"
                    controller = "user:show"
                    "#,
                ),
            ],
        );

        let controllers = registry();
        let table = TreeBuilder::new(&routing, &controllers).build().unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.has_route("users"));
        assert!(table.has_route("user.show"));
        assert!(table.route("users").unwrap().children().len() == 1);

        let m = table.match_path("/users/42").unwrap();
        assert_eq!(table.node(m.id).name, "user.show");
    }

    #[test]
    fn test_duplicate_name_across_files_fails() {
        let routing = fixture(
            "dup",
            &[
                (
                    "routing.toml",
                    r#"
                    [home]
                    pattern = "/"
                    controller = "pages:home"

                    [section]
                    pattern = "/section"
                    resource = "child.toml"
                    "#,
                ),
                (
                    "child.toml",
                    r#"
                    [home]
                    pattern = "/again"
                    controller = "pages:home"
                    "#,
                ),
            ],
        );

        let controllers = registry();
        let err = TreeBuilder::new(&routing, &controllers).build().err().unwrap();
        assert!(matches!(err, BuildError::DuplicateRoute { name } if name == "home"));
    }

    #[test]
    fn test_terminal_without_controller_fails() {
        let routing = fixture(
            "no-controller",
            &[(
                "routing.toml",
                r#"
                [broken]
                pattern = "/broken"
                "#,
            )],
        );

        let controllers = registry();
        let err = TreeBuilder::new(&routing, &controllers).build().err().unwrap();
        assert!(matches!(err, BuildError::MissingController { .. }));
    }

    #[test]
    fn test_empty_resource_pruned_silently() {
        let routing = fixture(
            "empty-resource",
            &[
                (
                    "routing.toml",
                    r#"
                    [home]
                    pattern = "/"
                    controller = "pages:home"

                    [ghost]
                    pattern = "/ghost"
                    resource = "empty.toml"
                    "#,
                ),
                ("empty.toml", ""),
            ],
        );

        let controllers = registry();
        let table = TreeBuilder::new(&routing, &controllers).build().unwrap();
        assert_eq!(table.len(), 1);
        assert!(!table.has_route("ghost"));
    }

    #[test]
    fn test_two_optionals_across_chain_fails() {
        let routing = fixture(
            "chain-optionals",
            &[
                (
                    "routing.toml",
                    r#"
                    [section]
                    pattern = "/:lang?"
                    resource = "child.toml"
                    "#,
                ),
                (
                    "child.toml",
                    r#"
                    [leaf]
                    pattern = "/users/:page?"
                    controller = "user:list"
                    "#,
                ),
            ],
        );

        let controllers = registry();
        let err = TreeBuilder::new(&routing, &controllers).build().err().unwrap();
        assert!(
            matches!(err, BuildError::MultipleOptionalParams { chain } if chain == "section → leaf")
        );
    }

    #[test]
    fn test_two_optionals_in_one_pattern_fails() {
        let routing = fixture(
            "pattern-optionals",
            &[(
                "routing.toml",
                r#"
                [leaf]
                pattern = "/:a?/:b?"
                controller = "user:list"
                "#,
            )],
        );

        let controllers = registry();
        let err = TreeBuilder::new(&routing, &controllers).build().err().unwrap();
        assert!(matches!(err, BuildError::MultipleOptionalParams { .. }));
    }

    #[test]
    fn test_default_counts_as_optional_in_chain_check() {
        let routing = fixture(
            "default-optional",
            &[(
                "routing.toml",
                r#"
                [leaf]
                pattern = "/:a/:b?"
                controller = "user:list"

                [leaf.defaults]
                a = "x"
                "#,
            )],
        );

        let controllers = registry();
        let err = TreeBuilder::new(&routing, &controllers).build().err().unwrap();
        assert!(matches!(err, BuildError::MultipleOptionalParams { .. }));
    }

    #[test]
    fn test_scope_registration() {
        let routing = fixture(
            "scopes",
            &[(
                "routing.toml",
                r#"
                [admin]
                pattern = "/admin"
                controller = "user:list"
                scope = "auth"
                "#,
            )],
        );

        let controllers = registry();
        let mut modules = ScopeRegistry::new();
        modules.define_scope("auth");

        TreeBuilder::new(&routing, &controllers)
            .with_modules(&mut modules)
            .build()
            .unwrap();
        assert_eq!(modules.scopes_for("admin"), ["auth".to_string()]);
    }

    #[test]
    fn test_unknown_scope_fails() {
        let routing = fixture(
            "unknown-scope",
            &[(
                "routing.toml",
                r#"
                [admin]
                pattern = "/admin"
                controller = "user:list"
                scope = "ghost"
                "#,
            )],
        );

        let controllers = registry();
        let mut modules = ScopeRegistry::new();
        let err = TreeBuilder::new(&routing, &controllers)
            .with_modules(&mut modules)
            .build()
            .err().unwrap();
        assert!(matches!(err, BuildError::UnknownScope { scope, .. } if scope == "ghost"));
    }

    #[test]
    fn test_verb_style_controller_binds_each_verb() {
        let routing = fixture(
            "verb-style",
            &[(
                "routing.toml",
                r#"
                [api]
                pattern = "/api/items"
                controller = "api"
                "#,
            )],
        );

        let controllers = registry();
        let table = TreeBuilder::new(&routing, &controllers).build().unwrap();
        let actions = table.route("api").unwrap().actions().unwrap();
        assert_eq!(actions.len(), 2);
        assert!(actions.contains_key("get"));
        assert!(actions.contains_key("post"));
    }

    #[test]
    fn test_methods_all_collapses() {
        let routing = fixture(
            "methods-all",
            &[(
                "routing.toml",
                r#"
                [everything]
                pattern = "/everything"
                controller = "user:list"
                methods = ["get", "all"]
                "#,
            )],
        );

        let controllers = registry();
        let table = TreeBuilder::new(&routing, &controllers).build().unwrap();
        let actions = table.route("everything").unwrap().actions().unwrap();
        assert_eq!(actions.len(), 1);
        assert!(actions.contains_key("all"));
    }

    #[test]
    fn test_default_implied_optional_rewrites_stored_pattern() {
        let routing = fixture(
            "rewrite",
            &[(
                "routing.toml",
                r#"
                [paged]
                pattern = "/users/:page"
                controller = "user:list"

                [paged.defaults]
                page = "1"
                "#,
            )],
        );

        let controllers = registry();
        let table = TreeBuilder::new(&routing, &controllers).build().unwrap();
        assert_eq!(table.route("paged").unwrap().pattern, "/users/:page?");
    }

    #[test]
    fn test_raw_pattern_compiled_anchored() {
        let routing = fixture(
            "raw-anchored",
            &[(
                "routing.toml",
                r#"
                [files]
                pattern = "/files/.+"
                controller = "user:list"
                raw = true
                "#,
            )],
        );

        let controllers = registry();
        let table = TreeBuilder::new(&routing, &controllers).build().unwrap();
        assert_eq!(table.route("files").unwrap().pattern, "/files/.+");

        assert!(table.match_path("/files/a.txt").is_some());
        assert!(table.match_path("/files").is_none());
        // The matcher covers the whole remaining path, never a substring
        // of an unrelated one.
        assert!(table.match_path("/secret/files/a.txt").is_none());
    }

    #[test]
    fn test_bad_raw_pattern_fails() {
        let routing = fixture(
            "raw-bad",
            &[(
                "routing.toml",
                r#"
                [files]
                pattern = "/files/[unclosed"
                controller = "user:list"
                raw = true
                "#,
            )],
        );

        let controllers = registry();
        let err = TreeBuilder::new(&routing, &controllers).build().err().unwrap();
        assert!(matches!(err, BuildError::BadRawPattern { route, .. } if route == "files"));
    }
}
