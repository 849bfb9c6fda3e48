//! Child ordering.
//!
//! Orders a set of node paths by one of a fixed set of strategies, then
//! applies an optional manual override, and memoizes the ascending result per
//! `(scope, strategy)` for the lifetime of the tree. Descending order is the
//! memoized list read backwards; it is never stored.
//!
//! ## Strategies
//!
//! | Name | Key |
//! |------|-----|
//! | `title`, `date`, `modified`, `slug` | the node attribute |
//! | `basename` | last path segment |
//! | `header.<field>` or `header.<field>\|<fallback>` | header value, else fallback, else path; numeric values compare as numbers |
//! | `random` | none: a fresh shuffle on every call, never memoized |
//! | `manual`, `default`, anything else | the node path |
//!
//! Key ordering uses a stable sort, so equal keys keep their input order.
//!
//! ## Manual override
//!
//! A manual list of slugs moves listed children to the front in list order;
//! unlisted children follow in their key order.

use crate::types::Node;
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SortError {
    #[error("Page does not exist: {0}")]
    MissingPage(String),
}

/// Ordering strategy, parsed from its case-sensitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Title,
    Date,
    Modified,
    Slug,
    Basename,
    Header {
        field: String,
        fallback: Option<String>,
    },
    Random,
    /// `manual`, `default`, and unrecognized names: natural path order.
    Default,
}

impl OrderBy {
    pub fn parse(name: &str) -> Self {
        match name {
            "title" => Self::Title,
            "date" => Self::Date,
            "modified" => Self::Modified,
            "slug" => Self::Slug,
            "basename" => Self::Basename,
            "random" => Self::Random,
            _ => match name.strip_prefix("header.") {
                Some(query) => {
                    let (field, fallback) = match query.split_once('|') {
                        Some((field, fallback)) => (field, Some(fallback.to_string())),
                        None => (query, None),
                    };
                    Self::Header {
                        field: field.to_string(),
                        fallback,
                    }
                }
                None => Self::Default,
            },
        }
    }
}

/// Read direction. Only `asc` keeps the computed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    pub fn parse(name: &str) -> Self {
        if name == "asc" { Self::Asc } else { Self::Desc }
    }
}

/// Comparable sort key. Numbers sort before text.
#[derive(Debug, Clone)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Header values and fallbacks that read as numbers compare numerically.
fn value_key(text: &str) -> SortKey {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => SortKey::Number(n),
        _ => SortKey::Text(text.to_string()),
    }
}

fn sort_key(node: &Node, order_by: &OrderBy) -> SortKey {
    match order_by {
        OrderBy::Title => SortKey::Text(node.title.clone()),
        OrderBy::Date => SortKey::Number(node.date as f64),
        OrderBy::Modified => SortKey::Number(node.modified_at as f64),
        OrderBy::Slug => SortKey::Text(node.slug.clone()),
        OrderBy::Basename => SortKey::Text(node.basename().to_string()),
        OrderBy::Header { field, fallback } => match node.header.get(field) {
            Some(Value::Number(n)) => n
                .as_f64()
                .map_or_else(|| SortKey::Text(n.to_string()), SortKey::Number),
            Some(Value::String(s)) if !s.is_empty() => value_key(s),
            Some(Value::Bool(true)) => SortKey::Text("true".to_string()),
            _ => match fallback.as_deref().filter(|f| !f.is_empty()) {
                Some(fallback) => value_key(fallback),
                None => SortKey::Text(node.path.clone()),
            },
        },
        OrderBy::Random | OrderBy::Default => SortKey::Text(node.path.clone()),
    }
}

/// Order `keys` ascending by `order_by`, then apply `manual`.
///
/// Every key must exist in `nodes`; a missing one means the adjacency data
/// and the node table disagree, which is reported, never skipped.
pub fn build_sort(
    nodes: &IndexMap<String, Node>,
    keys: &[String],
    order_by: &OrderBy,
    manual: &[String],
) -> Result<Vec<String>, SortError> {
    let mut list = keys
        .iter()
        .map(|key| {
            let node = nodes
                .get(key)
                .ok_or_else(|| SortError::MissingPage(key.clone()))?;
            Ok((key.as_str(), node))
        })
        .collect::<Result<Vec<_>, SortError>>()?;

    if *order_by == OrderBy::Random {
        list.shuffle(&mut rand::rng());
    } else {
        let mut keyed: Vec<(SortKey, (&str, &Node))> = list
            .into_iter()
            .map(|entry| (sort_key(entry.1, order_by), entry))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        list = keyed.into_iter().map(|(_, entry)| entry).collect();
    }

    if !manual.is_empty() {
        let mut next = manual.len();
        let mut numbered: Vec<(usize, (&str, &Node))> = list
            .into_iter()
            .map(|entry| {
                let order = manual
                    .iter()
                    .position(|slug| *slug == entry.1.slug)
                    .unwrap_or_else(|| {
                        next += 1;
                        next - 1
                    });
                (order, entry)
            })
            .collect();
        numbered.sort_by_key(|(order, _)| *order);
        list = numbered.into_iter().map(|(_, entry)| entry).collect();
    }

    Ok(list.into_iter().map(|(key, _)| key.to_string()).collect())
}

/// Scope key for an ad hoc key set: SHA-256 of its JSON encoding.
pub fn scope_fingerprint(keys: &[String]) -> String {
    let json = serde_json::to_string(keys).unwrap_or_default();
    format!("{:x}", Sha256::digest(json.as_bytes()))
}

/// Memo key for a strategy. A manual list changes the result, so it is part
/// of the key.
fn strategy_key(order_by: &str, manual: &[String]) -> String {
    if manual.is_empty() {
        order_by.to_string()
    } else {
        format!("{order_by}#{}", manual.join("/"))
    }
}

/// Ascending orders memoized per scope, then per strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortMemo {
    entries: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl SortMemo {
    pub fn get(&self, scope: &str, strategy: &str) -> Option<&Vec<String>> {
        self.entries.get(scope)?.get(strategy)
    }

    pub fn insert(&mut self, scope: &str, strategy: String, order: Vec<String>) {
        self.entries
            .entry(scope.to_string())
            .or_default()
            .insert(strategy, order);
    }

    /// Number of memoized orders across all scopes.
    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The sort engine: strategy dispatch plus a generation-scoped memo.
///
/// The memo sits behind a `RefCell` so sorting works through a shared tree
/// reference (collections only hold `&Tree`). One generation is only ever
/// touched by one call path at a time.
#[derive(Debug, Default)]
pub struct Sorter {
    memo: RefCell<SortMemo>,
}

impl Sorter {
    pub fn with_memo(memo: SortMemo) -> Self {
        Self {
            memo: RefCell::new(memo),
        }
    }

    /// Snapshot of the memo, for persisting.
    pub fn memo(&self) -> SortMemo {
        self.memo.borrow().clone()
    }

    /// Ordered keys for `scope`, computing and memoizing on first use.
    pub fn sort(
        &self,
        nodes: &IndexMap<String, Node>,
        scope: &str,
        keys: &[String],
        order_by: &str,
        dir: OrderDir,
        manual: &[String],
    ) -> Result<Vec<String>, SortError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let strategy = OrderBy::parse(order_by);
        let mut order = if strategy == OrderBy::Random {
            build_sort(nodes, keys, &strategy, manual)?
        } else {
            let memo_key = strategy_key(order_by, manual);
            let cached = self.memo.borrow().get(scope, &memo_key).cloned();
            match cached {
                Some(order) => order,
                None => {
                    let order = build_sort(nodes, keys, &strategy, manual)?;
                    tracing::trace!(scope, strategy = %memo_key, "memoized sort");
                    self.memo
                        .borrow_mut()
                        .insert(scope, memo_key, order.clone());
                    order
                }
            }
        };

        if dir == OrderDir::Desc {
            order.reverse();
        }
        Ok(order)
    }
}
