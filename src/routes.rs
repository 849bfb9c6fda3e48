//! Route table: building routes from the tree and dispatching URLs.
//!
//! Routes are derived from slugs: a node's route is its parent's route plus
//! `/` plus its own slug. The root folder has no route of its own, so its
//! children sit at `/<slug>`. Folders that are not routable still get a route
//! so their descendants can be reached through it.
//!
//! ## Dispatch precedence
//!
//! 1. Direct route hit (unroutable nodes only when `all` is set).
//! 2. Exact redirect → [`Dispatch::Redirect`].
//! 3. Exact alias → dispatch of the alias target.
//! 4. Wildcard aliases (`/prefix*`) in configured order; the first prefix
//!    match substitutes the rest of the URL into the target's `*` and looks
//!    the result up directly.
//! 5. [`Dispatch::NotFound`].

use crate::config::{IndexConfig, RoutingConfig};
use crate::tree::Tree;
use crate::types::Node;

/// Aliases pointing at aliases are followed at most this deep.
const MAX_ALIAS_DEPTH: usize = 16;

/// Outcome of resolving a URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<'t> {
    Page(&'t Node),
    /// The caller should redirect the client here.
    Redirect(String),
    NotFound,
}

impl<'t> Dispatch<'t> {
    pub fn page(&self) -> Option<&'t Node> {
        match self {
            Dispatch::Page(node) => Some(node),
            _ => None,
        }
    }
}

/// Assign routes, register them in the route table, apply the home alias
/// and fill the taxonomy index.
///
/// Node order in the tree is pre-order (every parent precedes its children),
/// so a parent's route is always known when its children are visited.
pub fn build_routes(tree: &mut Tree, config: &IndexConfig) {
    tree.routes.clear();
    tree.taxonomy = Default::default();

    let paths: Vec<String> = tree.nodes.keys().cloned().collect();
    for path in paths {
        let Some(node) = tree.nodes.get(&path) else {
            continue;
        };
        let route = match node.parent.as_deref() {
            Some(parent) => {
                let base = tree
                    .nodes
                    .get(parent)
                    .and_then(|p| p.route.as_deref())
                    .unwrap_or("");
                Some(format!("{}/{}", base.trim_end_matches('/'), node.slug))
            }
            None => None,
        };

        let Some(node) = tree.nodes.get_mut(&path) else {
            continue;
        };
        match route {
            Some(route) => {
                node.route = Some(route.clone());
                if let Some(previous) = tree.routes.insert(route.clone(), path.clone()) {
                    tracing::warn!(route = %route, previous = %previous, page = %path, "route collision, last page wins");
                }
            }
            None => {
                node.route = None;
                node.routable = false;
            }
        }
    }

    apply_home_alias(tree, &config.home.alias);

    for node in tree.nodes.values() {
        if node.routable && node.route.is_some() {
            tree.taxonomy.add(node, &config.taxonomies);
        }
    }

    tracing::debug!(routes = tree.routes.len(), "built route table");
}

fn apply_home_alias(tree: &mut Tree, alias: &str) {
    let home = alias.trim_matches('/');
    if home.is_empty() {
        return;
    }
    let Some(path) = tree.routes.get(&format!("/{home}")).cloned() else {
        return;
    };
    tree.routes.insert("/".to_string(), path.clone());
    if let Some(node) = tree.nodes.get_mut(&path) {
        node.route = Some("/".to_string());
    }
}

impl Tree {
    /// Resolve `url` to a page, a redirect, or nothing.
    pub fn dispatch(&self, url: &str, all: bool, routing: &RoutingConfig) -> Dispatch<'_> {
        self.dispatch_at(url, all, routing, 0)
    }

    fn dispatch_at(
        &self,
        url: &str,
        all: bool,
        routing: &RoutingConfig,
        depth: usize,
    ) -> Dispatch<'_> {
        if let Some(node) = self.lookup(url)
            && (all || node.routable)
        {
            return Dispatch::Page(node);
        }

        if let Some(target) = routing.redirects.get(url) {
            return Dispatch::Redirect(target.clone());
        }

        if let Some(target) = routing.routes.get(url) {
            if depth >= MAX_ALIAS_DEPTH {
                tracing::warn!(url, "alias chain too deep, giving up");
                return Dispatch::NotFound;
            }
            return self.dispatch_at(target, all, routing, depth + 1);
        }

        for (alias, target) in &routing.routes {
            if !alias.contains('*') {
                continue;
            }
            let prefix = alias.trim_end_matches('*');
            if let Some(rest) = url.strip_prefix(prefix) {
                let rewritten = target.replace('*', rest);
                if let Some(node) = self.lookup(&rewritten) {
                    return Dispatch::Page(node);
                }
            }
        }

        Dispatch::NotFound
    }
}
