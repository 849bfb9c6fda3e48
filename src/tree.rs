//! The page tree: node arena plus path-keyed indices.
//!
//! A [`Tree`] owns every [`Node`] of one generation. All relationships are
//! lookups by path: a node's `parent` is a key into `nodes`, a folder's
//! children are an ordered map in `children`, and `routes` maps public URLs
//! to node paths. Nothing holds a reference to anything else, so the tree can
//! be serialized into the cache bundle and hydrated back verbatim.
//!
//! A tree is either built by [`scan::build`](crate::scan::build) or hydrated
//! by the cache gate, and is discarded wholesale when its fingerprint goes
//! stale.

use crate::collection::Collection;
use crate::sort::{OrderDir, SortError, SortMemo, Sorter};
use crate::taxonomy::Taxonomy;
use crate::types::{ChildInfo, Node};
use indexmap::IndexMap;

/// Ordered child map of one folder: child path → summary.
pub type Children = IndexMap<String, ChildInfo>;

#[derive(Debug, Default)]
pub struct Tree {
    pub(crate) root: Option<String>,
    pub(crate) nodes: IndexMap<String, Node>,
    pub(crate) children: IndexMap<String, Children>,
    pub(crate) routes: IndexMap<String, String>,
    pub(crate) taxonomy: Taxonomy,
    pub(crate) sorter: Sorter,
}

impl Tree {
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.nodes.get(path)
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref().and_then(|p| self.nodes.get(p))
    }

    /// All nodes in build order (parents before their children).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Route → node path.
    pub fn routes(&self) -> &IndexMap<String, String> {
        &self.routes
    }

    /// Node registered for a route, regardless of routability.
    pub fn lookup(&self, route: &str) -> Option<&Node> {
        self.routes.get(route).and_then(|p| self.nodes.get(p))
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Snapshot of every memoized ordering.
    pub fn sort_memo(&self) -> SortMemo {
        self.sorter.memo()
    }

    /// Child paths of a folder in their stored order.
    pub fn child_keys(&self, path: &str) -> Vec<String> {
        self.children
            .get(path)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Children of a folder as a collection.
    pub fn children(&self, path: &str) -> Collection<'_> {
        Collection::new(self.child_keys(path), Default::default(), self)
    }

    /// Pages filed under one taxonomy term, in index order.
    pub fn find_taxonomy(&self, taxonomy: &str, term: &str) -> Collection<'_> {
        Collection::new(
            self.taxonomy.pages(taxonomy, term).to_vec(),
            Default::default(),
            self,
        )
    }

    /// Newest modification time in the tree.
    pub fn last_modified(&self) -> i64 {
        self.nodes.values().map(|n| n.modified_at).max().unwrap_or(0)
    }

    /// Order a folder's children. Omitted arguments fall back to the
    /// folder's own ordering directives.
    pub fn sort(
        &self,
        path: &str,
        order_by: Option<&str>,
        order_dir: Option<&str>,
    ) -> Result<Vec<String>, SortError> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| SortError::MissingPage(path.to_string()))?;
        let by = order_by.unwrap_or(&node.order_by);
        let dir = OrderDir::parse(order_dir.unwrap_or(&node.order_dir));
        let keys = self.child_keys(path);
        self.sorter
            .sort(&self.nodes, path, &keys, by, dir, &node.order_manual)
    }

    /// Order an arbitrary key set; the scope is the caller's memo key.
    pub fn sort_keys(
        &self,
        scope: &str,
        keys: &[String],
        order_by: &str,
        dir: OrderDir,
        manual: &[String],
    ) -> Result<Vec<String>, SortError> {
        self.sorter
            .sort(&self.nodes, scope, keys, order_by, dir, manual)
    }

    /// Add a page after the build (virtual pages, generated listings).
    ///
    /// The node is kept if its path is new. Its route is `route` when given,
    /// otherwise derived from the parent's route and the node's slug. The
    /// node is appended to its parent's children; memoized orders of that
    /// parent are not recomputed.
    pub fn add_page(&mut self, node: Node, route: Option<&str>) {
        let path = node.path.clone();
        self.nodes.entry(path.clone()).or_insert(node);

        let (parent, slug) = match self.nodes.get(&path) {
            Some(n) => (n.parent.clone(), n.slug.clone()),
            None => return,
        };
        let route = match route {
            Some(r) => r.to_string(),
            None => {
                let base = parent
                    .as_deref()
                    .and_then(|p| self.nodes.get(p))
                    .and_then(|p| p.route.as_deref())
                    .unwrap_or("");
                format!("{}/{}", base.trim_end_matches('/'), slug)
            }
        };

        if let Some(parent) = parent {
            self.children
                .entry(parent)
                .or_default()
                .insert(path.clone(), ChildInfo { slug });
        }
        if let Some(n) = self.nodes.get_mut(&path) {
            n.route = Some(route.clone());
        }
        self.routes.insert(route, path);
    }

    /// Route → indented title for every routable page, depth first.
    ///
    /// Used to offer a parent picker; indentation is two spaces per level
    /// below the top.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_deref() {
            self.list_from(root, 0, &mut out);
        }
        out
    }

    fn list_from(&self, path: &str, level: usize, out: &mut Vec<(String, String)>) {
        let Some(node) = self.nodes.get(path) else {
            return;
        };
        if node.routable
            && let Some(route) = &node.route
        {
            let indent = "  ".repeat(level.saturating_sub(1));
            out.push((route.clone(), format!("{indent}{}", node.title)));
        }
        for child in self.child_keys(path) {
            self.list_from(&child, level + 1, out);
        }
    }
}
