//! Ordered page collections.
//!
//! A [`Collection`] is an ordered list of node paths plus free-form params,
//! borrowed against one [`Tree`]. Filters return new collections and keep
//! the current order; [`Collection::order`] re-sorts in place through the
//! tree's sort engine, memoized under a fingerprint of the key set.

use crate::dates::{self, DateError};
use crate::sort::{OrderDir, SortError, scope_fingerprint};
use crate::tree::Tree;
use crate::types::Node;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Collection<'t> {
    keys: Vec<String>,
    params: Map<String, Value>,
    tree: &'t Tree,
}

/// Result of a sibling lookup.
///
/// When there is no neighbor in the requested direction, or the path is not
/// a member, the lookup answers with the collection itself.
#[derive(Debug, Clone, Copy)]
pub enum Adjacent<'c, 't> {
    Sibling(&'t Node),
    Collection(&'c Collection<'t>),
}

impl<'t> Adjacent<'_, 't> {
    pub fn sibling(&self) -> Option<&'t Node> {
        match self {
            Adjacent::Sibling(node) => Some(node),
            Adjacent::Collection(_) => None,
        }
    }
}

impl<'t> Collection<'t> {
    pub fn new(keys: Vec<String>, params: Map<String, Value>, tree: &'t Tree) -> Self {
        Self { keys, params, tree }
    }

    /// Member paths in order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Merge `params` over the current ones.
    pub fn set_params(&mut self, params: Map<String, Value>) -> &mut Self {
        self.params.extend(params);
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.keys.iter().any(|k| k == path)
    }

    /// Member nodes in order. Keys unknown to the tree are skipped.
    pub fn iter(&self) -> impl Iterator<Item = &'t Node> + '_ {
        let tree = self.tree;
        self.keys.iter().filter_map(move |k| tree.get(k))
    }

    /// Member node by path.
    pub fn get(&self, path: &str) -> Option<&'t Node> {
        if self.contains(path) {
            self.tree.get(path)
        } else {
            None
        }
    }

    /// Drop a member. Returns whether it was present.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != path);
        self.keys.len() != before
    }

    /// Re-sort the members. `manual` moves the listed slugs to the front.
    pub fn order(
        &mut self,
        by: &str,
        dir: &str,
        manual: Option<&[String]>,
    ) -> Result<&mut Self, SortError> {
        let scope = scope_fingerprint(&self.keys);
        self.keys = self.tree.sort_keys(
            &scope,
            &self.keys,
            by,
            OrderDir::parse(dir),
            manual.unwrap_or(&[]),
        )?;
        Ok(self)
    }

    pub fn is_first(&self, path: &str) -> bool {
        self.keys.first().is_some_and(|k| k == path)
    }

    pub fn is_last(&self, path: &str) -> bool {
        self.keys.last().is_some_and(|k| k == path)
    }

    /// Zero-based index of `path`.
    pub fn current_position(&self, path: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == path)
    }

    /// Neighbor of `path`: `direction` 1 is the following member, -1 the
    /// preceding one.
    pub fn adjacent_sibling(&self, path: &str, direction: isize) -> Adjacent<'_, 't> {
        let sibling = self
            .current_position(path)
            .and_then(|pos| pos.checked_add_signed(direction))
            .and_then(|idx| self.keys.get(idx))
            .and_then(|key| self.tree.get(key));
        match sibling {
            Some(node) => Adjacent::Sibling(node),
            None => Adjacent::Collection(self),
        }
    }

    pub fn prev_sibling(&self, path: &str) -> Adjacent<'_, 't> {
        self.adjacent_sibling(path, -1)
    }

    pub fn next_sibling(&self, path: &str) -> Adjacent<'_, 't> {
        self.adjacent_sibling(path, 1)
    }

    /// Members dated strictly after `start` and strictly before `end`.
    /// Without `end` the range is open.
    pub fn date_range(&self, start: &str, end: Option<&str>) -> Result<Self, DateError> {
        let start = dates::parse_timestamp(start)?;
        let end = match end {
            Some(end) => dates::parse_timestamp(end)?,
            None => i64::MAX,
        };
        Ok(self.filter(|n| n.date > start && n.date < end))
    }

    pub fn visible(&self) -> Self {
        self.filter(Node::visible)
    }

    pub fn non_visible(&self) -> Self {
        self.filter(|n| !n.visible())
    }

    pub fn modular(&self) -> Self {
        self.filter(|n| n.modular)
    }

    pub fn non_modular(&self) -> Self {
        self.filter(|n| !n.modular)
    }

    pub fn published(&self) -> Self {
        let now = dates::now();
        self.filter(|n| n.published_at(now))
    }

    pub fn non_published(&self) -> Self {
        let now = dates::now();
        self.filter(|n| !n.published_at(now))
    }

    pub fn routable(&self) -> Self {
        self.filter(|n| n.routable)
    }

    pub fn non_routable(&self) -> Self {
        self.filter(|n| !n.routable)
    }

    fn filter(&self, keep: impl Fn(&Node) -> bool) -> Self {
        let keys = self
            .keys
            .iter()
            .filter(|k| self.tree.get(k).is_some_and(&keep))
            .cloned()
            .collect();
        Self::new(keys, self.params.clone(), self.tree)
    }
}
