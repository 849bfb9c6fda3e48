//! Tree cache for repeated indexing.
//!
//! Walking and parsing every content folder is the expensive part of
//! indexing. This module lets a run skip it entirely when nothing under the
//! content root and nothing in the config has changed since the tree was
//! last stored.
//!
//! # Design
//!
//! The cache is all-or-nothing: one bundle holds the whole tree (nodes,
//! child order, routes, taxonomy, memoized sorts) and is stored under a
//! fingerprint. A hit hydrates the bundle as is; a miss rebuilds from disk
//! and stores a new bundle. Nothing is patched incrementally.
//!
//! ## Fingerprint
//!
//! SHA-256 over three inputs:
//!
//! - the content root path,
//! - the newest modification time under it, per [`CheckMethod`]:
//!   `file` looks at files and folders, `folder` only at folders, `none`
//!   ignores the disk (the cache only turns over on config changes),
//! - the config checksum.
//!
//! Entries starting with `.` are ignored when looking for changes.
//!
//! ## Storage
//!
//! [`FileCacheStore`] writes one JSON file per fingerprint to the cache
//! directory (`.pagetree-cache/` next to the content root by default).
//! Bundles carry a format version; a version mismatch or an unreadable
//! file is treated as a miss. Concurrent writers race, last one wins.
//!
//! ## Bypassing the cache
//!
//! Set `cache.enabled = false`, or pass `--no-cache` on the command line, to
//! rebuild on every run. Nothing is read from or written to the store.

use crate::config::{CheckMethod, IndexConfig};
use crate::content::ContentParser;
use crate::dates::unix_seconds;
use crate::routes::build_routes;
use crate::scan::{self, ScanError};
use crate::sort::{SortMemo, Sorter};
use crate::taxonomy::Taxonomy;
use crate::tree::{Children, Tree};
use crate::types::Node;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Version of the bundle format. Bump this to invalidate all existing
/// caches when the format changes.
const BUNDLE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything needed to restore a tree without touching the content root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheBundle {
    pub version: u32,
    pub root: Option<String>,
    pub nodes: IndexMap<String, Node>,
    pub children: IndexMap<String, Children>,
    pub routes: IndexMap<String, String>,
    pub taxonomy: Taxonomy,
    pub sort: SortMemo,
}

impl CacheBundle {
    pub fn from_tree(tree: &Tree) -> Self {
        Self {
            version: BUNDLE_VERSION,
            root: tree.root.clone(),
            nodes: tree.nodes.clone(),
            children: tree.children.clone(),
            routes: tree.routes.clone(),
            taxonomy: tree.taxonomy.clone(),
            sort: tree.sort_memo(),
        }
    }

    pub fn into_tree(self) -> Tree {
        Tree {
            root: self.root,
            nodes: self.nodes,
            children: self.children,
            routes: self.routes,
            taxonomy: self.taxonomy,
            sorter: Sorter::with_memo(self.sort),
        }
    }
}

/// Opaque key → bundle storage.
pub trait CacheStore {
    /// Stored bundle for `key`, if there is a usable one.
    fn fetch(&self, key: &str) -> Option<CacheBundle>;
    fn save(&mut self, key: &str, bundle: &CacheBundle) -> Result<(), CacheError>;
}

/// One `<key>.json` file per bundle in a directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn fetch(&self, key: &str) -> Option<CacheBundle> {
        let content = std::fs::read_to_string(self.path_for(key)).ok()?;
        let bundle: CacheBundle = match serde_json::from_str(&content) {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(key, "unreadable cache bundle: {e}");
                return None;
            }
        };
        if bundle.version != BUNDLE_VERSION {
            tracing::debug!(key, version = bundle.version, "stale cache bundle version");
            return None;
        }
        Some(bundle)
    }

    fn save(&mut self, key: &str, bundle: &CacheBundle) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(bundle)?;
        std::fs::write(self.path_for(key), json)?;
        Ok(())
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryCacheStore {
    entries: HashMap<String, CacheBundle>,
}

impl MemoryCacheStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn fetch(&self, key: &str) -> Option<CacheBundle> {
        self.entries
            .get(key)
            .filter(|b| b.version == BUNDLE_VERSION)
            .cloned()
    }

    fn save(&mut self, key: &str, bundle: &CacheBundle) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), bundle.clone());
        Ok(())
    }
}

/// How a tree was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Disabled,
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheOutcome::Hit => write!(f, "cache hit"),
            CacheOutcome::Miss => write!(f, "cache miss, rebuilt"),
            CacheOutcome::Disabled => write!(f, "cache disabled, rebuilt"),
        }
    }
}

/// Newest modification time under `root` (unix seconds).
pub fn last_modified(root: &Path, check: CheckMethod) -> io::Result<i64> {
    if check == CheckMethod::None {
        return Ok(0);
    }
    let mut latest = 0;
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry?;
        let is_dir = entry.file_type().is_dir();
        if check == CheckMethod::Folder && !is_dir {
            continue;
        }
        let mtime = unix_seconds(entry.metadata()?.modified()?);
        latest = latest.max(mtime);
    }
    Ok(latest)
}

/// Cache key for the tree under `root` with `config`.
pub fn fingerprint(root: &Path, config: &IndexConfig) -> io::Result<String> {
    let modified = last_modified(root, config.cache.check)?;
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(modified.to_le_bytes());
    hasher.update(b"\0");
    hasher.update(config.checksum().as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Build the tree and its routes from disk, ignoring any cache.
pub fn rebuild(
    root: &Path,
    config: &IndexConfig,
    parser: &dyn ContentParser,
) -> Result<Tree, ScanError> {
    let mut tree = scan::build(root, config, parser)?;
    build_routes(&mut tree, config);
    Ok(tree)
}

/// Cached tree for `root` if the fingerprint matches, else a fresh build
/// that is then stored. A failed store write is logged, not returned.
pub fn load_tree(
    root: &Path,
    config: &IndexConfig,
    parser: &dyn ContentParser,
    store: &mut dyn CacheStore,
) -> Result<(Tree, CacheOutcome), ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !config.cache.enabled {
        return Ok((rebuild(root, config, parser)?, CacheOutcome::Disabled));
    }

    let key = fingerprint(root, config)?;
    if let Some(bundle) = store.fetch(&key) {
        tracing::info!(key = %&key[..12], pages = bundle.nodes.len(), "page tree cache hit");
        return Ok((bundle.into_tree(), CacheOutcome::Hit));
    }

    tracing::info!(key = %&key[..12], "page tree cache miss, rebuilding");
    let tree = rebuild(root, config, parser)?;
    if let Err(e) = store.save(&key, &CacheBundle::from_tree(&tree)) {
        tracing::warn!("could not store page tree cache: {e}");
    }
    Ok((tree, CacheOutcome::Miss))
}
