//! Folder name parsing for the `NN.slug` convention.
//!
//! Every page folder follows the same pattern: an optional numeric ordering
//! prefix (`NN.`), an optional hidden prefix (`_`), and the slug itself.
//!
//! ```text
//! 01.home        → number=Some(1),  hidden=false, slug="home"
//! 02.blog        → number=Some(2),  hidden=false, slug="blog"
//! _sidebar       → number=None,     hidden=true,  slug="sidebar"
//! 03._features   → number=Some(3),  hidden=true,  slug="features"
//! drafts         → number=None,     hidden=false, slug="drafts"
//! ```
//!
//! The numeric prefix marks a page as visible in navigation. The hidden
//! prefix marks it modular: it is indexed and can be rendered as part of its
//! parent, but is never the target of request dispatch.

/// Result of parsing a folder name like `02.my-blog`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Ordering prefix if present (e.g. `2` from `02.my-blog`).
    pub number: Option<u32>,
    /// Whether the folder carries the hidden prefix.
    pub hidden: bool,
    /// URL segment: prefixes stripped, lowercased.
    pub slug: String,
    /// Human title: slug with dashes and underscores as spaces, first letter upper.
    pub display_title: String,
}

/// Parse a folder name following the `NN.slug` convention.
///
/// `hidden_prefix` is the marker for modular folders (usually `_`). It is
/// recognised both before and after the ordering prefix.
pub fn parse_folder_name(name: &str, hidden_prefix: &str) -> ParsedName {
    let (number, rest) = match name.find('.') {
        Some(dot) if dot > 0 => match name[..dot].parse::<u32>() {
            Ok(num) => (Some(num), &name[dot + 1..]),
            Err(_) => (None, name),
        },
        _ => (None, name),
    };

    let (hidden, rest) = match rest.strip_prefix(hidden_prefix) {
        Some(stripped) if !hidden_prefix.is_empty() => (true, stripped),
        _ => (false, rest),
    };

    let slug = rest.to_lowercase();
    ParsedName {
        number,
        hidden,
        display_title: display_title(&slug),
        slug,
    }
}

/// Turn a slug into a readable title: `my-first_post` → `My first post`.
pub fn display_title(slug: &str) -> String {
    let spaced = slug.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
