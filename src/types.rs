//! Shared types: the content node and the child summary stored in adjacency maps.
//!
//! Both are serialized into the cache bundle and must round-trip unchanged.

use crate::content::PageHeader;
use crate::dates;
use serde::{Deserialize, Serialize};

/// Summary kept in a parent's ordered child map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildInfo {
    pub slug: String,
}

/// One indexed directory mapped to one logical page.
///
/// Nodes never own each other: `parent` is a lookup key into the tree's node
/// table, and children live in the tree's adjacency map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Filesystem path of the folder. Primary key.
    pub path: String,
    /// Path of the parent folder; `None` for the root.
    pub parent: Option<String>,
    /// Raw folder name, prefixes included.
    pub folder: String,
    /// URL segment.
    pub slug: String,
    /// Ordering prefix of the folder name (`02.blog` → 2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Folder carries the hidden prefix.
    pub modular: bool,
    /// Absolute route, set by route building.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// A page file was found directly inside the folder.
    pub has_content: bool,
    pub routable: bool,
    /// Path of the page file, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Page type: header `template`, else the page file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub title: String,
    /// Header date, else page file mtime, else `modified_at` (unix seconds).
    pub date: i64,
    /// Newest mtime of the folder's files and all descendants (unix seconds).
    pub modified_at: i64,
    /// `modified_at` followed by a hash of the page file path.
    pub id: String,
    pub order_by: String,
    pub order_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_manual: Vec<String>,
    #[serde(default, skip_serializing_if = "PageHeader::is_empty")]
    pub header: PageHeader,
}

impl Node {
    /// Shown in navigation: header `visible` if set, else numbered folders.
    pub fn visible(&self) -> bool {
        self.header
            .get_bool("visible")
            .unwrap_or(self.number.is_some())
    }

    /// Header `published` (default true) within the optional publish window.
    pub fn published(&self) -> bool {
        self.published_at(dates::now())
    }

    pub fn published_at(&self, now: i64) -> bool {
        if self.header.get_bool("published") == Some(false) {
            return false;
        }
        let bound = |key: &str| {
            self.header
                .get_str(key)
                .and_then(|s| dates::parse_timestamp(s).ok())
        };
        if let Some(start) = bound("publish_date")
            && start > now
        {
            return false;
        }
        if let Some(end) = bound("unpublish_date")
            && end <= now
        {
            return false;
        }
        true
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Last path segment of the folder.
    pub fn basename(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty())
            .unwrap_or(&self.path)
    }
}

#[cfg(test)]
pub(crate) fn node(path: &str, slug: &str) -> Node {
    Node {
        path: path.to_string(),
        parent: None,
        folder: slug.to_string(),
        slug: slug.to_string(),
        number: None,
        modular: false,
        route: None,
        has_content: true,
        routable: true,
        file_path: None,
        template: None,
        title: slug.to_string(),
        date: 0,
        modified_at: 0,
        id: String::new(),
        order_by: "default".to_string(),
        order_dir: "asc".to_string(),
        order_manual: Vec::new(),
        header: PageHeader::default(),
    }
}
