//! Route tree nodes.
//!
//! # Design Decisions
//! - Parent links are plain `RouteId` indices into the owning table, never
//!   owning pointers; the table is the sole owner of node lifetime
//! - Terminal nodes carry a fixed verb → action table resolved at build
//!   time; segment nodes only group children
//! - Nodes are created during the boot-time build and never mutated after
//!   the table is sealed

use std::collections::HashMap;
use std::path::PathBuf;

use regex::Regex;

use crate::routing::controller::Action;
use crate::routing::pattern::ParsedPattern;

/// Index of a node inside its [`RouteTable`](crate::routing::RouteTable).
pub type RouteId = usize;

/// How a node matches its part of the request path.
#[derive(Debug, Clone)]
pub enum RoutePattern {
    /// The degenerate `/` pattern; consumes no path segments.
    Root,

    /// A decomposable segment list.
    Parsed(ParsedPattern),

    /// A raw regex over the remaining path. Extracts no parameters and is
    /// never a valid reverse-generation target.
    Raw(Regex),
}

/// What a node does once matched.
pub enum RouteKind {
    /// Groups child routes under this node's pattern.
    Segment { children: Vec<RouteId> },

    /// An endpoint bound to controller actions, keyed by lower-cased verb
    /// or `"all"`.
    Terminal { actions: HashMap<String, Action> },
}

/// One node of the route tree.
pub struct RouteNode {
    /// Globally unique route name.
    pub name: String,

    /// Canonical pattern string (`/` for root patterns). Carries explicit
    /// `?` markers for default-implied optional parameters.
    pub pattern: String,

    /// The pattern's matcher.
    pub matcher: RoutePattern,

    /// Back-reference to the parent node, set once during the build.
    pub parent: Option<RouteId>,

    /// Routing file this node was defined in, for error messages.
    pub config_file: PathBuf,

    /// Middleware scope the node was registered with, if any.
    pub scope: Option<String>,

    /// Terminal or segment behavior.
    pub kind: RouteKind,
}

impl RouteNode {
    /// Whether this node is an endpoint.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, RouteKind::Terminal { .. })
    }

    /// The node's parsed pattern, when it has one.
    pub fn parsed(&self) -> Option<&ParsedPattern> {
        match &self.matcher {
            RoutePattern::Parsed(parsed) => Some(parsed),
            _ => None,
        }
    }

    /// The verb → action table of a terminal node.
    pub fn actions(&self) -> Option<&HashMap<String, Action>> {
        match &self.kind {
            RouteKind::Terminal { actions } => Some(actions),
            RouteKind::Segment { .. } => None,
        }
    }

    /// Child ids of a segment node.
    pub fn children(&self) -> &[RouteId] {
        match &self.kind {
            RouteKind::Segment { children } => children,
            RouteKind::Terminal { .. } => &[],
        }
    }
}

impl std::fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteNode")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("parent", &self.parent)
            .field("terminal", &self.is_terminal())
            .finish()
    }
}
