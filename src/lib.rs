//! # pagetree
//!
//! Indexes a directory of content folders into an ordered, addressable page
//! tree. Your filesystem is the data source: every folder is a page, a page
//! file inside it supplies the header, numeric prefixes order siblings, and
//! URLs are derived from folder slugs.
//!
//! # Architecture: Build Once, Query Many
//!
//! ```text
//! 1. Fingerprint  pages/ + config  →  cache key      (mtime scan + checksum)
//! 2. Build        pages/           →  Tree           (skipped on a cache hit)
//! 3. Routes       Tree             →  route table    (slugs + home alias + taxonomy)
//! 4. Query        Tree             →  Dispatch / Collection
//! ```
//!
//! Steps 1–3 run once per generation. A [`tree::Tree`] is immutable after
//! that except for its sort memo, which fills lazily as collections are
//! ordered and is persisted with the tree on the next cache write.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the content root depth first and builds the node table |
//! | [`routes`] | Assigns routes, applies the home alias, dispatches URLs |
//! | [`sort`] | Ordering strategies, manual override, per-generation memo |
//! | [`collection`] | Ordered page lists: filters, re-ordering, sibling queries |
//! | [`tree`] | The page tree: node arena plus path-keyed indices |
//! | [`cache`] | Fingerprinting and whole-tree cache stores |
//! | [`taxonomy`] | Term → pages reverse index |
//! | [`page_types`] | Template-derived page-type registry |
//! | [`content`] | Page file parsing (`+++` TOML front matter) |
//! | [`config`] | `pagetree.toml` loading, merging and validation |
//! | [`types`] | The `Node` record shared by every stage |
//! | [`naming`] | `NN.slug` / `_hidden` folder name parser |
//! | [`dates`] | Date parsing to unix seconds |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Paths as Keys
//!
//! Nodes never point at each other. Parents, children and routes are all
//! lookups by folder path into maps owned by the tree, which is what lets a
//! whole tree be written to JSON and read back without fix-ups.
//!
//! ## All-or-Nothing Cache
//!
//! The cache never patches a tree. If anything under the content root or in
//! the config changed, the fingerprint changes and the tree is rebuilt from
//! scratch. See [`cache`] for what goes into the fingerprint.
//!
//! ## Folder Names Carry Structure
//!
//! `02.blog` sorts before `03.about` and is visible in navigation; `_hero`
//! is a modular fragment that is indexed but never routed. The parsing
//! lives in [`naming::parse_folder_name`].

pub mod cache;
pub mod collection;
pub mod config;
pub mod content;
pub mod dates;
pub mod naming;
pub mod output;
pub mod page_types;
pub mod routes;
pub mod scan;
pub mod sort;
pub mod taxonomy;
pub mod tree;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
