//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Pages are shown by their semantic identity (positional index and title)
//! with routes and source files as indented context lines, so the output
//! reads as a content inventory that can still be traced back to disk.
//!
//! # Output Format
//!
//! ## Index
//!
//! ```text
//! Pages (cache miss, rebuilt)
//! 001 Home
//!     Route: /
//!     Source: 01.home/default.md
//! 002 Blog (2 pages)
//!     Route: /blog
//!     Source: 02.blog/blog.md
//!     Order: date desc
//!     001 Second Post
//!         Route: /blog/second-post
//!         Source: 02.blog/02.second-post/item.md
//! 003 Archive (1 page)
//!     Route: /archive (not routable)
//!
//! 7 pages, 6 routes
//! ```
//!
//! ## Routes
//!
//! ```text
//! /              → 01.home
//! /blog          → 02.blog
//! /archive       → archive (not routable)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheOutcome;
use crate::collection::Collection;
use crate::page_types::PageTypes;
use crate::routes::Dispatch;
use crate::tree::Tree;
use crate::types::Node;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Positional index + title, with the child count for folders.
///
/// ```text
/// 002 Blog (2 pages)
/// 001 First Post
/// ```
fn entity_header(index: usize, title: &str, children: usize) -> String {
    match children {
        0 => format!("{} {}", format_index(index), title),
        1 => format!("{} {} (1 page)", format_index(index), title),
        n => format!("{} {} ({} pages)", format_index(index), title, n),
    }
}

/// Route line with the routing flags that matter to a reader.
fn route_line(node: &Node) -> Option<String> {
    let route = node.route.as_deref()?;
    let mut line = format!("Route: {route}");
    if node.modular {
        line.push_str(" (modular)");
    } else if !node.routable {
        line.push_str(" (not routable)");
    }
    Some(line)
}

/// Path relative to the content root, falling back to the full path.
fn relative(path: &str, root: &Path) -> String {
    Path::new(path)
        .strip_prefix(root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.to_string())
}

// ============================================================================
// index
// ============================================================================

/// Format the indexed tree, depth first in child order.
pub fn format_index_output(tree: &Tree, content_root: &Path, outcome: CacheOutcome) -> Vec<String> {
    let mut lines = vec![format!("Pages ({outcome})")];
    if let Some(root) = tree.root() {
        format_subtree(tree, &root.path, 0, content_root, &mut lines);
    }
    lines.push(String::new());
    lines.push(format!(
        "{} pages, {} routes",
        tree.len(),
        tree.routes().len()
    ));
    lines
}

fn format_subtree(tree: &Tree, path: &str, depth: usize, root: &Path, lines: &mut Vec<String>) {
    for (i, child) in tree.children(path).iter().enumerate() {
        let base = indent(depth);
        let count = tree.child_keys(&child.path).len();
        lines.push(format!("{base}{}", entity_header(i + 1, &child.title, count)));
        if let Some(route) = route_line(child) {
            lines.push(format!("{base}    {route}"));
        }
        if let Some(file) = &child.file_path {
            lines.push(format!("{base}    Source: {}", relative(file, root)));
        }
        if count > 1 && (child.order_by != "default" || !child.order_manual.is_empty()) {
            lines.push(format!(
                "{base}    Order: {} {}",
                child.order_by, child.order_dir
            ));
        }
        format_subtree(tree, &child.path, depth + 1, root, lines);
    }
}

pub fn print_index_output(tree: &Tree, content_root: &Path, outcome: CacheOutcome) {
    for line in format_index_output(tree, content_root, outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// routes
// ============================================================================

/// Format the route table in registration order, routes padded to align.
pub fn format_routes(tree: &Tree, content_root: &Path) -> Vec<String> {
    let width = tree.routes().keys().map(|r| r.len()).max().unwrap_or(0);
    tree.routes()
        .iter()
        .filter_map(|(route, path)| {
            let node = tree.get(path)?;
            let mut line = format!("{route:<width$} → {}", relative(path, content_root));
            if !node.routable {
                line.push_str(" (not routable)");
            }
            Some(line)
        })
        .collect()
}

pub fn print_routes(tree: &Tree, content_root: &Path) {
    for line in format_routes(tree, content_root) {
        println!("{}", line);
    }
}

// ============================================================================
// resolve
// ============================================================================

/// Format the outcome of dispatching `url`.
pub fn format_dispatch(url: &str, result: &Dispatch<'_>, content_root: &Path) -> Vec<String> {
    match result {
        Dispatch::Page(node) => {
            let mut lines = vec![format!("{url} → {}", node.title)];
            if let Some(route) = route_line(node) {
                lines.push(format!("    {route}"));
            }
            match &node.file_path {
                Some(file) => lines.push(format!("    Source: {}", relative(file, content_root))),
                None => lines.push(format!("    Folder: {}", relative(&node.path, content_root))),
            }
            if let Some(template) = &node.template {
                lines.push(format!("    Template: {template}"));
            }
            lines
        }
        Dispatch::Redirect(target) => vec![format!("{url} → redirect {target}")],
        Dispatch::NotFound => vec![format!("{url} → not found")],
    }
}

pub fn print_dispatch(url: &str, result: &Dispatch<'_>, content_root: &Path) {
    for line in format_dispatch(url, result, content_root) {
        println!("{}", line);
    }
}

// ============================================================================
// children
// ============================================================================

/// Format an ordered collection, one positional line per page.
pub fn format_collection(collection: &Collection<'_>) -> Vec<String> {
    collection
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let route = node.route.as_deref().unwrap_or("-");
            format!("{} {} ({route})", format_index(i + 1), node.title)
        })
        .collect()
}

pub fn print_collection(collection: &Collection<'_>) {
    for line in format_collection(collection) {
        println!("{}", line);
    }
}

// ============================================================================
// types
// ============================================================================

/// Format the page and modular types with their labels.
pub fn format_types(types: &PageTypes) -> Vec<String> {
    let mut lines = vec!["Page types".to_string()];
    for (name, label) in types.page_select() {
        lines.push(format!("    {name} ({label})"));
    }
    let modular = types.modular_select();
    if !modular.is_empty() {
        lines.push("Modular types".to_string());
        for (name, label) in modular {
            lines.push(format!("    {name} ({label})"));
        }
    }
    lines
}

pub fn print_types(types: &PageTypes) {
    for line in format_types(types) {
        println!("{}", line);
    }
}
