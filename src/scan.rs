//! Tree building: content folders → page tree.
//!
//! Walks the content root depth first. Every folder becomes one [`Node`];
//! a page file (`*.md` by default) directly inside the folder supplies the
//! node's header.
//!
//! ## Directory Structure
//!
//! ```text
//! pages/                        # Content root (root node, never routed)
//! ├── 01.home/
//! │   └── default.md            # Page file → routable, route /home
//! ├── 02.blog/
//! │   ├── blog.md               # Listing page, orders its children
//! │   ├── 01.first-post/
//! │   │   └── item.md
//! │   └── _sidebar/             # Hidden prefix → modular, never routable
//! │       └── sidebar.md
//! └── archive/                  # No page file → not routable...
//!     └── 2020/
//!         └── item.md           # ...but its children still are
//! ```
//!
//! ## Rules
//!
//! - Names starting with `.` and the configured OS artifacts are skipped.
//! - A folder without a page file is not routable.
//! - A folder with the hidden prefix is never routable.
//! - `modified_at` is the newest mtime of the folder's files and of every
//!   descendant folder.
//! - Each folder's children are ordered before the folder returns, so
//!   ordering is established bottom up.

use crate::config::IndexConfig;
use crate::content::{ContentParser, PageHeader, ParseError};
use crate::dates::{parse_timestamp, unix_seconds};
use crate::naming::parse_folder_name;
use crate::sort::{OrderDir, SortError};
use crate::tree::{Children, Tree};
use crate::types::{ChildInfo, Node};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Content root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Fatal error when creating page instances: {0} indexed twice")]
    DuplicatePath(String),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Sort error: {0}")]
    Sort(#[from] SortError),
}

/// Build the page tree under `root`.
///
/// Routes are not assigned here; see [`routes::build_routes`](crate::routes::build_routes).
pub fn build(
    root: &Path,
    config: &IndexConfig,
    parser: &dyn ContentParser,
) -> Result<Tree, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }

    let mut builder = Builder {
        config,
        parser,
        tree: Tree::default(),
    };
    let root_path = builder.recurse(root, None)?;
    builder.tree.root = Some(root_path);

    tracing::debug!(pages = builder.tree.len(), "built page tree");
    Ok(builder.tree)
}

struct Builder<'a> {
    config: &'a IndexConfig,
    parser: &'a dyn ContentParser,
    tree: Tree,
}

impl Builder<'_> {
    fn recurse(&mut self, dir: &Path, parent: Option<&str>) -> Result<String, ScanError> {
        let path = path_key(dir);
        let folder = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let parsed = parse_folder_name(&folder, &self.config.pages.hidden_prefix);

        let node = Node {
            path: path.clone(),
            parent: parent.map(str::to_string),
            folder,
            slug: parsed.slug.clone(),
            number: parsed.number,
            modular: parent.is_some() && parsed.hidden,
            route: None,
            has_content: false,
            routable: true,
            file_path: None,
            template: None,
            title: parsed.display_title,
            date: 0,
            modified_at: 0,
            id: String::new(),
            order_by: self.config.pages.order.by.clone(),
            order_dir: self.config.pages.order.dir.clone(),
            order_manual: Vec::new(),
            header: Default::default(),
        };

        if self.tree.nodes.contains_key(&path) {
            return Err(ScanError::DuplicatePath(path));
        }
        self.tree.nodes.insert(path.clone(), node);
        if let Some(parent) = parent {
            self.link(parent, &path);
        }

        let mut latest = 0i64;
        let mut content: Option<(PathBuf, i64)> = None;
        let mut child_modified = Vec::new();

        for entry in collect_entries(dir, self.config)? {
            let meta = match fs::symlink_metadata(&entry)? {
                link if link.file_type().is_symlink() => match fs::metadata(&entry) {
                    Ok(target) if target.is_file() => target,
                    _ => {
                        tracing::debug!(path = %entry.display(), "skipping symlinked folder");
                        continue;
                    }
                },
                meta => meta,
            };
            if meta.is_file() {
                let mtime = unix_seconds(meta.modified()?);
                latest = latest.max(mtime);
                if content.is_none() && self.is_content_file(&entry) {
                    content = Some((entry, mtime));
                }
            } else if meta.is_dir() {
                let child = self.recurse(&entry, Some(path.as_str()))?;
                if let Some(child_node) = self.tree.nodes.get_mut(&child) {
                    if child_node.modular {
                        child_node.routable = false;
                    }
                    child_modified.push(child_node.modified_at);
                }
                // relink: the header may have changed the slug
                self.link(&path, &child);
            }
        }

        if let Some((file, mtime)) = &content {
            let header = self.parser.parse(file)?;
            self.apply_header(&path, file, *mtime, header);
        }

        let modified_at = child_modified.into_iter().fold(latest, i64::max);
        if let Some(node) = self.tree.nodes.get_mut(&path) {
            if content.is_none() {
                node.routable = false;
                node.date = modified_at;
            }
            node.modified_at = modified_at;
            node.id = page_id(modified_at, node.file_path.as_deref());
        }

        self.order_children(&path)?;
        tracing::debug!(path = %path, "indexed folder");
        Ok(path)
    }

    /// Record `child` in `parent`'s child map with the child's current slug.
    fn link(&mut self, parent: &str, child: &str) {
        let slug = self
            .tree
            .nodes
            .get(child)
            .map(|n| n.slug.clone())
            .unwrap_or_default();
        self.tree
            .children
            .entry(parent.to_string())
            .or_default()
            .insert(child.to_string(), ChildInfo { slug });
    }

    fn is_content_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy().ends_with(&self.config.pages.content_ext))
            .unwrap_or(false)
    }

    fn apply_header(
        &mut self,
        path: &str,
        file: &Path,
        mtime: i64,
        header: PageHeader,
    ) {
        let config = self.config;
        let ext = config.pages.content_ext.as_str();
        let Some(node) = self.tree.nodes.get_mut(path) else {
            return;
        };
        node.has_content = true;
        node.file_path = Some(file.to_string_lossy().to_string());

        if let Some(slug) = header.slug() {
            node.slug = slug.to_string();
        }
        if let Some(title) = header.title() {
            node.title = title.to_string();
        }
        node.date = match header.date().map(parse_timestamp) {
            Some(Ok(ts)) => ts,
            Some(Err(e)) => {
                tracing::warn!(file = %file.display(), "{e}, using file time");
                mtime
            }
            None => mtime,
        };
        node.template = header.template().map(str::to_string).or_else(|| {
            let name = file.file_name()?.to_string_lossy().to_string();
            Some(name.strip_suffix(ext).unwrap_or(&name).to_string())
        });
        if let Some(by) = header.order_by() {
            node.order_by = by.to_string();
        }
        if let Some(dir) = header.order_dir() {
            node.order_dir = dir.to_string();
        }
        if let Some(manual) = header.order_manual() {
            node.order_manual = manual;
        }
        node.header = header;
    }

    /// Replace the folder's child map with its sorted order.
    fn order_children(&mut self, path: &str) -> Result<(), ScanError> {
        let Some(node) = self.tree.nodes.get(path) else {
            return Ok(());
        };
        let keys = self.tree.child_keys(path);
        if keys.is_empty() {
            return Ok(());
        }
        let order = self.tree.sorter.sort(
            &self.tree.nodes,
            path,
            &keys,
            &node.order_by,
            OrderDir::parse(&node.order_dir),
            &node.order_manual,
        )?;

        let Some(mut old) = self.tree.children.shift_remove(path) else {
            return Ok(());
        };
        let sorted: Children = order
            .into_iter()
            .filter_map(|key| old.shift_remove(&key).map(|info| (key, info)))
            .collect();
        self.tree.children.insert(path.to_string(), sorted);
        Ok(())
    }
}

/// Stable cache-busting token: the modification time followed by a hash of
/// the page file path (empty for folders without one).
fn page_id(modified_at: i64, file_path: Option<&str>) -> String {
    let digest = Sha256::digest(file_path.unwrap_or_default().as_bytes());
    format!("{modified_at}{:x}", digest)
}

/// Node key for a directory: its path text without a trailing separator.
fn path_key(dir: &Path) -> String {
    let text = dir.to_string_lossy();
    let trimmed = text.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        text.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sorted directory entries, minus dot files and configured OS artifacts.
fn collect_entries(dir: &Path, config: &IndexConfig) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || config.pages.ignore_files.contains(&name) {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatterParser;
    use crate::test_helpers::*;

    #[test]
    fn one_node_per_folder_and_parents_exist() {
        let site = blog_fixture();
        let tree = build_fixture(&site);

        assert_eq!(tree.len(), site.folder_count());
        for node in tree.nodes() {
            if let Some(parent) = &node.parent {
                assert!(tree.get(parent).is_some(), "missing parent of {}", node.path);
            }
        }
        assert!(tree.root().unwrap().is_root());
    }

    #[test]
    fn slugs_strip_prefixes() {
        let site = blog_fixture();
        let tree = build_fixture(&site);
        assert_eq!(find_node(&tree, "blog").folder, "02.blog");
        assert_eq!(find_node(&tree, "sidebar").folder, "_sidebar");
    }

    #[test]
    fn folder_without_page_is_not_routable_but_children_are_indexed() {
        let site = blog_fixture();
        let tree = build_fixture(&site);

        let archive = find_node(&tree, "archive");
        assert!(!archive.has_content);
        assert!(!archive.routable);

        let year = find_node(&tree, "2020");
        assert!(year.has_content);
        assert!(year.routable);
        assert_eq!(year.parent.as_deref(), Some(archive.path.as_str()));
    }

    #[test]
    fn hidden_prefix_forces_unroutable() {
        let site = blog_fixture();
        let tree = build_fixture(&site);
        let sidebar = find_node(&tree, "sidebar");
        assert!(sidebar.has_content);
        assert!(sidebar.modular);
        assert!(!sidebar.routable);
    }

    #[test]
    fn header_fields_applied() {
        let site = blog_fixture();
        let tree = build_fixture(&site);
        let first = find_node(&tree, "first-post");
        assert_eq!(first.title, "First Post");
        assert_eq!(first.template.as_deref(), Some("item"));
        assert_eq!(first.date, parse_timestamp("2020-02-01").unwrap());

        let blog = find_node(&tree, "blog");
        assert_eq!(blog.order_by, "date");
        assert_eq!(blog.order_dir, "desc");
    }

    #[test]
    fn slug_header_overrides_folder() {
        let site = SiteFixture::new();
        site.page("01.about", "default.md", "+++\nslug = \"who-we-are\"\n+++\n");
        let tree = build_fixture(&site);
        let about = find_node(&tree, "who-we-are");
        assert_eq!(about.folder, "01.about");
        let root = tree.root().unwrap();
        assert_eq!(tree.children[&root.path][&about.path].slug, "who-we-are");
    }

    #[test]
    fn children_ordered_by_folder_directives() {
        let site = blog_fixture();
        let tree = build_fixture(&site);
        let blog = find_node(&tree, "blog");
        // date desc: newest first, modular sidebar has the file time (oldest)
        assert_eq!(
            child_slugs(&tree, &blog.path),
            vec!["second-post", "first-post", "sidebar"]
        );
    }

    #[test]
    fn modified_at_covers_descendants() {
        let site = blog_fixture();
        site.set_mtime("02.blog/01.first-post/item.md", 5_000_000);
        site.set_mtime("02.blog/blog.md", 1_000);
        let tree = build_fixture(&site);

        for node in tree.nodes() {
            for child in tree.child_keys(&node.path) {
                assert!(node.modified_at >= tree.get(&child).unwrap().modified_at);
            }
        }
        let blog = find_node(&tree, "blog");
        assert!(blog.modified_at >= 5_000_000);
        assert!(blog.id.starts_with(&blog.modified_at.to_string()));
    }

    #[test]
    fn modified_at_at_least_page_file_mtime() {
        let site = SiteFixture::new();
        site.page("01.a", "default.md", "# A");
        site.set_mtime("01.a/default.md", 1_234_567);
        let tree = build_fixture(&site);
        assert_eq!(find_node(&tree, "a").modified_at, 1_234_567);
    }

    #[test]
    fn ignored_files_do_not_count() {
        let site = SiteFixture::new();
        site.page("01.a", "default.md", "# A");
        site.set_mtime("01.a/default.md", 100);
        site.file("01.a/.DS_Store", "junk");
        site.file("01.a/Thumbs.db", "junk");
        site.set_mtime("01.a/Thumbs.db", 9_999_999);
        let tree = build_fixture(&site);
        assert_eq!(find_node(&tree, "a").modified_at, 100);
    }

    #[test]
    fn non_page_files_count_for_mtime() {
        let site = SiteFixture::new();
        site.page("01.a", "default.md", "# A");
        site.set_mtime("01.a/default.md", 100);
        site.file("01.a/photo.jpg", "img");
        site.set_mtime("01.a/photo.jpg", 200);
        let tree = build_fixture(&site);
        let a = find_node(&tree, "a");
        assert_eq!(a.modified_at, 200);
        assert_eq!(a.date, 100);
    }

    #[test]
    fn dot_folders_are_skipped() {
        let site = SiteFixture::new();
        site.page("01.a", "default.md", "# A");
        site.page(".git", "notes.md", "# hidden");
        let tree = build_fixture(&site);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn missing_root_is_error() {
        let site = SiteFixture::new();
        let result = build(
            &site.pages().join("nope"),
            &IndexConfig::default(),
            &FrontMatterParser,
        );
        assert!(matches!(result, Err(ScanError::RootNotFound(_))));
    }

    #[test]
    fn invalid_front_matter_aborts_build() {
        let site = SiteFixture::new();
        site.page("01.a", "default.md", "+++\ntitle = \n+++\n");
        let result = build(&site.pages(), &IndexConfig::default(), &FrontMatterParser);
        assert!(matches!(result, Err(ScanError::Parse(_))));
    }

    #[test]
    fn custom_content_extension() {
        let site = SiteFixture::new();
        site.page("01.a", "default.txt", "# A");
        site.page("02.b", "default.md", "# B");
        let mut config = IndexConfig::default();
        config.pages.content_ext = ".txt".into();
        let tree = build(&site.pages(), &config, &FrontMatterParser).unwrap();
        assert!(find_node(&tree, "a").has_content);
        assert!(!find_node(&tree, "b").has_content);
    }

    #[test]
    fn path_key_trims_separator() {
        assert_eq!(path_key(Path::new("/site/pages/")), "/site/pages");
        assert_eq!(path_key(Path::new("/")), "/");
    }

    #[test]
    fn page_id_depends_on_file_path() {
        assert_ne!(page_id(1, Some("/a.md")), page_id(1, Some("/b.md")));
        assert!(page_id(42, None).starts_with("42"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_folders_are_skipped() {
        let site = SiteFixture::new();
        site.page("01.a", "default.md", "# A");
        site.file("shared.md", "# Shared");
        std::os::unix::fs::symlink(site.pages().join("01.a"), site.pages().join("01.a/loop"))
            .unwrap();
        std::os::unix::fs::symlink(site.pages().join("missing"), site.pages().join("01.a/dangling"))
            .unwrap();
        std::os::unix::fs::symlink(site.pages().join("shared.md"), site.pages().join("01.a/extra.md"))
            .unwrap();

        let tree = build(&site.pages(), &IndexConfig::default(), &FrontMatterParser).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.len(), site.folder_count());
        assert!(tree.nodes().all(|n| n.slug != "loop"));
        assert_eq!(find_node(&tree, "a").title, "A");
    }
}
