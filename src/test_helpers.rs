//! Shared test utilities for the pagetree test suite.
//!
//! Builds content trees programmatically in a temp directory (with explicit
//! modification times where ordering depends on them) and provides lookup
//! helpers that panic with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = blog_fixture();
//! let tree = index_fixture(&site);
//!
//! let blog = find_node(&tree, "blog");
//! assert_eq!(child_slugs(&tree, &blog.path), vec!["second-post", "first-post", "sidebar"]);
//! ```

use std::fs::{self, File};
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

use crate::cache;
use crate::config::IndexConfig;
use crate::content::FrontMatterParser;
use crate::scan;
use crate::tree::Tree;
use crate::types::Node;

// =========================================================================
// Fixture setup
// =========================================================================

/// A site directory in a temp dir, with an empty `pages/` content root.
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("pages")).unwrap();
        Self { tmp }
    }

    /// The content root.
    pub fn pages(&self) -> PathBuf {
        self.tmp.path().join("pages")
    }

    /// Write a page file into a folder under the content root.
    pub fn page(&self, folder: &str, file: &str, content: &str) {
        let dir = self.pages().join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    /// Write any file under the content root, creating parent folders.
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.pages().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Set the mtime of a file or folder under the content root (`""` is
    /// the root itself).
    pub fn set_mtime(&self, rel: &str, secs: u64) {
        let path = self.pages().join(rel);
        File::open(&path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap_or_else(|e| panic!("set mtime of {}: {e}", path.display()));
    }

    /// Folders under the content root, the root included, skipping
    /// dot-folders.
    pub fn folder_count(&self) -> usize {
        walkdir::WalkDir::new(self.pages())
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_dir())
            .count()
    }
}

/// A small site exercising ordering, hidden folders and content-less
/// folders:
///
/// ```text
/// pages/
/// ├── 01.home/default.md
/// ├── 02.blog/blog.md              (order: date desc)
/// │   ├── 01.first-post/item.md    (2020-02-01)
/// │   ├── 02.second-post/item.md   (2020-03-01)
/// │   └── _sidebar/sidebar.md      (no date, old mtime)
/// └── archive/                     (no page file)
///     └── 2020/item.md
/// ```
pub fn blog_fixture() -> SiteFixture {
    let site = SiteFixture::new();
    site.page("01.home", "default.md", "+++\ntitle = \"Home\"\n+++\nWelcome.\n");
    site.page(
        "02.blog",
        "blog.md",
        "+++\ntitle = \"Blog\"\n\n[order]\nby = \"date\"\ndir = \"desc\"\n+++\n",
    );
    site.page(
        "02.blog/01.first-post",
        "item.md",
        "+++\ntitle = \"First Post\"\ndate = \"2020-02-01\"\n+++\nHello.\n",
    );
    site.page(
        "02.blog/02.second-post",
        "item.md",
        "+++\ntitle = \"Second Post\"\ndate = \"2020-03-01\"\n+++\nAgain.\n",
    );
    site.page("02.blog/_sidebar", "sidebar.md", "# Sidebar\n");
    site.set_mtime("02.blog/_sidebar/sidebar.md", 1_000);
    site.page("archive/2020", "item.md", "# 2020\n");
    site
}

/// Tree for the fixture with stock config, routes not yet built.
pub fn build_fixture(site: &SiteFixture) -> Tree {
    scan::build(&site.pages(), &IndexConfig::default(), &FrontMatterParser).unwrap()
}

/// Tree for the fixture with stock config, routes built.
pub fn index_fixture(site: &SiteFixture) -> Tree {
    cache::rebuild(&site.pages(), &IndexConfig::default(), &FrontMatterParser).unwrap()
}

// =========================================================================
// Tree lookups (panic with a clear message on a miss)
// =========================================================================

/// Find a node by slug. Panics if not found.
pub fn find_node<'a>(tree: &'a Tree, slug: &str) -> &'a Node {
    tree.nodes().find(|n| n.slug == slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = tree.nodes().map(|n| n.slug.as_str()).collect();
        panic!("node '{slug}' not found. Available: {slugs:?}")
    })
}

/// Child slugs of a folder in stored order.
pub fn child_slugs(tree: &Tree, path: &str) -> Vec<String> {
    tree.child_keys(path)
        .iter()
        .map(|k| tree.get(k).unwrap().slug.clone())
        .collect()
}
