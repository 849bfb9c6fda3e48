//! Page-type registry.
//!
//! A page type is the name of a template a page can render with. Types are
//! discovered once from a templates directory: every file ending with the
//! template extension is a page type, and files in its `modular/`
//! subdirectory are modular types (registered as `modular/<name>`).
//!
//! ```text
//! templates/
//! ├── default.html      → "default"
//! ├── blog.html         → "blog"
//! ├── item.html         → "item"
//! └── modular/
//!     └── hero.html     → "modular/hero"
//! ```
//!
//! `default` is always registered, so resolution never comes up empty.

use crate::naming::display_title;
use crate::types::Node;
use indexmap::{IndexMap, IndexSet};
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_TYPE: &str = "default";
const MODULAR_DIR: &str = "modular";

#[derive(Debug, Clone, PartialEq)]
pub struct PageTypes {
    types: IndexSet<String>,
}

impl Default for PageTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTypes {
    /// Registry with only `default`.
    pub fn new() -> Self {
        let mut types = IndexSet::new();
        types.insert(DEFAULT_TYPE.to_string());
        Self { types }
    }

    /// Registry from the templates found in `dir`. A missing directory
    /// yields only `default`.
    pub fn scan(dir: &Path, ext: &str) -> io::Result<Self> {
        let mut registry = Self::new();
        for name in template_names(dir, ext)? {
            registry.register(&name);
        }
        for name in template_names(&dir.join(MODULAR_DIR), ext)? {
            registry.register(&format!("{MODULAR_DIR}/{name}"));
        }
        tracing::debug!(types = registry.types.len(), dir = %dir.display(), "scanned page types");
        Ok(registry)
    }

    pub fn register(&mut self, name: &str) {
        self.types.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    /// Non-modular types as name → label, for a type picker.
    pub fn page_select(&self) -> IndexMap<String, String> {
        self.types
            .iter()
            .filter(|t| !is_modular(t))
            .map(|t| (t.clone(), display_title(t)))
            .collect()
    }

    /// Modular types as `modular/<name>` → label.
    pub fn modular_select(&self) -> IndexMap<String, String> {
        self.types
            .iter()
            .filter_map(|t| {
                let short = t.strip_prefix(MODULAR_DIR)?.strip_prefix('/')?;
                Some((t.clone(), display_title(short)))
            })
            .collect()
    }

    /// The registered type named `name`, else `default`.
    pub fn resolve<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        match name {
            Some(name) if self.contains(name) => name,
            _ => DEFAULT_TYPE,
        }
    }

    /// Type a node renders with. Modular nodes look their template up among
    /// the modular types.
    pub fn resolve_node<'a>(&'a self, node: &'a Node) -> &'a str {
        let Some(template) = node.template.as_deref() else {
            return DEFAULT_TYPE;
        };
        if node.modular && !is_modular(template) {
            let prefixed = format!("{MODULAR_DIR}/{template}");
            if let Some(found) = self.types.get(&prefixed) {
                return found;
            }
        }
        self.resolve(Some(template))
    }
}

fn is_modular(name: &str) -> bool {
    name.starts_with("modular/")
}

/// Sorted template stems in `dir`; empty when the directory is missing.
fn template_names(dir: &Path, ext: &str) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        if let Some(stem) = file_name.strip_suffix(ext)
            && !stem.is_empty()
            && !stem.starts_with('.')
        {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}
