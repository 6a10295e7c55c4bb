//! Route table: lookup and request matching.
//!
//! # Responsibilities
//! - Own every route node built at boot
//! - Look up routes by name
//! - Match a request path down the tree, capturing parameters
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Matching captures raw values only; validation and defaults are the
//!   binder's job, applied after the match like the nested-router model
//! - Explicit no-match rather than silent default

use std::collections::HashMap;

use crate::routing::pattern::Segment;
use crate::routing::route::{RouteId, RouteNode, RoutePattern};

/// The immutable route tree, built once at boot.
pub struct RouteTable {
    nodes: Vec<RouteNode>,
    by_name: HashMap<String, RouteId>,
    roots: Vec<RouteId>,
}

/// A successful path match.
#[derive(Debug)]
pub struct RouteMatch {
    /// The matched terminal node.
    pub id: RouteId,

    /// Matched chain, outermost ancestor first.
    pub chain: Vec<RouteId>,

    /// Raw captured parameters, before defaults and validation.
    pub params: HashMap<String, String>,
}

impl RouteTable {
    pub(crate) fn new(
        nodes: Vec<RouteNode>,
        by_name: HashMap<String, RouteId>,
        roots: Vec<RouteId>,
    ) -> Self {
        Self {
            nodes,
            by_name,
            roots,
        }
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Route id for `name`.
    pub fn id_of(&self, name: &str) -> Option<RouteId> {
        self.by_name.get(name).copied()
    }

    /// Route node for `name`.
    pub fn route(&self, name: &str) -> Option<&RouteNode> {
        self.id_of(name).map(|id| self.node(id))
    }

    /// Whether a route with `name` exists.
    pub fn has_route(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Node for a known id.
    pub fn node(&self, id: RouteId) -> &RouteNode {
        &self.nodes[id]
    }

    /// Top-level route ids in build order.
    pub fn roots(&self) -> &[RouteId] {
        &self.roots
    }

    /// Chain of ids from the outermost ancestor down to `id` inclusive.
    pub fn chain_ids(&self, id: RouteId) -> Vec<RouteId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Human-readable route chain for diagnostics, outermost first.
    pub fn chain_display(&self, id: RouteId) -> String {
        self.chain_ids(id)
            .iter()
            .map(|&i| self.node(i).name.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// First terminal route matching `path`, in tree order.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.matches(path).into_iter().next()
    }

    /// Every terminal route matching `path`, in tree order. Multiple
    /// terminals can share a path while serving different verbs.
    pub fn matches(&self, path: &str) -> Vec<RouteMatch> {
        let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut out = Vec::new();
        for &root in &self.roots {
            self.match_node(root, &segs, &HashMap::new(), &[], &mut out);
        }
        out
    }

    fn match_node(
        &self,
        id: RouteId,
        segs: &[&str],
        captured: &HashMap<String, String>,
        chain: &[RouteId],
        out: &mut Vec<RouteMatch>,
    ) {
        let node = self.node(id);
        let mut chain = chain.to_vec();
        chain.push(id);

        for (consumed, captures) in consume(&node.matcher, segs) {
            let mut params = captured.clone();
            params.extend(captures);

            if node.is_terminal() {
                if consumed == segs.len() {
                    out.push(RouteMatch {
                        id,
                        chain: chain.clone(),
                        params,
                    });
                }
                continue;
            }

            for &child in node.children() {
                self.match_node(child, &segs[consumed..], &params, &chain, out);
            }
        }
    }
}

/// Ways a node's pattern can consume a prefix of the remaining path
/// segments, as (consumed count, captures) pairs in preference order.
fn consume(matcher: &RoutePattern, segs: &[&str]) -> Vec<(usize, Vec<(String, String)>)> {
    match matcher {
        RoutePattern::Root => vec![(0, Vec::new())],
        RoutePattern::Parsed(parsed) => consume_segments(&parsed.segments, segs),
        RoutePattern::Raw(re) => {
            // A raw matcher may consume any prefix of the remaining path.
            let mut options = Vec::new();
            for k in 0..=segs.len() {
                let mut candidate = String::new();
                if k == 0 {
                    candidate.push('/');
                }
                for seg in &segs[..k] {
                    candidate.push('/');
                    candidate.push_str(seg);
                }
                if re.is_match(&candidate) {
                    options.push((k, Vec::new()));
                }
            }
            // Prefer the longest consumed prefix.
            options.reverse();
            options
        }
    }
}

fn consume_segments(
    pattern: &[Segment],
    segs: &[&str],
) -> Vec<(usize, Vec<(String, String)>)> {
    let Some((head, rest)) = pattern.split_first() else {
        return vec![(0, Vec::new())];
    };

    let mut options = Vec::new();

    let mut take_one = |capture: Option<(String, String)>| {
        if let Some(&seg) = segs.first() {
            let matches = match head {
                Segment::Literal { value } => value == seg,
                Segment::Wildcard { .. } | Segment::Param(_) => true,
            };
            if matches {
                for (consumed, mut captures) in consume_segments(rest, &segs[1..]) {
                    if let Some(pair) = capture.clone() {
                        captures.insert(0, pair);
                    }
                    options.push((consumed + 1, captures));
                }
            }
        }
    };

    match head {
        Segment::Literal { .. } | Segment::Wildcard { .. } => take_one(None),
        Segment::Param(p) => {
            if let Some(&seg) = segs.first() {
                take_one(Some((p.name.clone(), seg.to_string())));
            }
            if p.optional {
                // The optional segment may be absent entirely.
                options.extend(consume_segments(rest, segs));
            }
        }
    }

    options
}
