//! Reverse index from taxonomy terms to pages.
//!
//! Filled during route building from each routed page's `[taxonomy]`
//! header table, restricted to the taxonomy names listed in the config.
//! Persisted in the cache bundle alongside the tree.

use crate::types::Node;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// taxonomy name → term → page paths (in route-building order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    map: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl Taxonomy {
    /// File a page under every term it declares for the given taxonomies.
    pub fn add(&mut self, node: &Node, taxonomies: &[String]) {
        for name in taxonomies {
            for term in node.header.taxonomy_terms(name) {
                let pages = self
                    .map
                    .entry(name.clone())
                    .or_default()
                    .entry(term)
                    .or_default();
                if !pages.contains(&node.path) {
                    pages.push(node.path.clone());
                }
            }
        }
    }

    /// Terms known for one taxonomy.
    pub fn terms(&self, taxonomy: &str) -> Vec<&str> {
        self.map
            .get(taxonomy)
            .map(|terms| terms.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Pages filed under one term.
    pub fn pages(&self, taxonomy: &str, term: &str) -> &[String] {
        self.map
            .get(taxonomy)
            .and_then(|terms| terms.get(term))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::node;
    use serde_json::json;

    fn tagged(path: &str, tags: serde_json::Value) -> Node {
        let mut n = node(path, path);
        n.header.set("taxonomy", json!({ "tag": tags, "author": "ada" }));
        n
    }

    #[test]
    fn indexes_configured_taxonomies_only() {
        let mut tax = Taxonomy::default();
        let names = vec!["tag".to_string()];
        tax.add(&tagged("/a", json!(["rust", "cms"])), &names);
        tax.add(&tagged("/b", json!("rust")), &names);

        assert_eq!(tax.terms("tag"), vec!["rust", "cms"]);
        assert_eq!(tax.pages("tag", "rust"), ["/a", "/b"]);
        assert_eq!(tax.pages("tag", "cms"), ["/a"]);
        assert!(tax.terms("author").is_empty());
    }

    #[test]
    fn same_page_is_filed_once() {
        let mut tax = Taxonomy::default();
        let names = vec!["tag".to_string()];
        let page = tagged("/a", json!(["rust"]));
        tax.add(&page, &names);
        tax.add(&page, &names);
        assert_eq!(tax.pages("tag", "rust").len(), 1);
    }

    #[test]
    fn unknown_term_is_empty() {
        assert!(Taxonomy::default().pages("tag", "x").is_empty());
    }
}
