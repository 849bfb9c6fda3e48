//! Page files and their headers.
//!
//! Parsing a page file is a collaborator of the tree builder, reached through
//! the [`ContentParser`] trait. The builder only needs the header: title,
//! date, slug override, visibility flags, ordering directives, taxonomy
//! terms, and whatever else the author put there (sortable via
//! `header.<field>`).
//!
//! [`FrontMatterParser`] is the stock implementation. It reads TOML front
//! matter fenced by `+++` lines:
//!
//! ```text
//! +++
//! title = "Hello"
//! date = 2020-02-01
//!
//! [order]
//! by = "date"
//! manual = ["intro", "setup"]
//!
//! [taxonomy]
//! tag = ["rust", "cms"]
//! +++
//!
//! # Hello
//! ```
//!
//! When the header has no `title`, the text of the first level-one heading
//! of the Markdown body is used (ATX `# Title` or setext `Title\n===`).

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Invalid front matter in {0}: {1}")]
    FrontMatter(PathBuf, toml::de::Error),
    #[error("Unterminated front matter in {0}")]
    Unterminated(PathBuf),
}

/// Turns a page file into its header.
pub trait ContentParser {
    fn parse(&self, path: &Path) -> Result<PageHeader, ParseError>;
}

/// Header fields of one page file, kept as a JSON object so arbitrary
/// author fields survive the cache round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageHeader {
    fields: Map<String, Value>,
}

impl PageHeader {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Set a top-level field, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Look up a dotted path such as `author.name`.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let mut parts = dotted.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        self.get(dotted).and_then(Value::as_str)
    }

    pub fn get_bool(&self, dotted: &str) -> Option<bool> {
        self.get(dotted).and_then(Value::as_bool)
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title").filter(|s| !s.trim().is_empty())
    }

    pub fn slug(&self) -> Option<&str> {
        self.get_str("slug").filter(|s| !s.trim().is_empty())
    }

    pub fn date(&self) -> Option<&str> {
        self.get_str("date")
    }

    pub fn template(&self) -> Option<&str> {
        self.get_str("template")
    }

    pub fn order_by(&self) -> Option<&str> {
        self.get_str("order.by")
    }

    pub fn order_dir(&self) -> Option<&str> {
        self.get_str("order.dir")
    }

    /// Manual ordering list (slugs). Absent or malformed entries yield `None`.
    pub fn order_manual(&self) -> Option<Vec<String>> {
        let list = self.get("order.manual")?.as_array()?;
        Some(
            list.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// Terms listed for one taxonomy; accepts a single string or a list.
    pub fn taxonomy_terms(&self, taxonomy: &str) -> Vec<String> {
        match self.fields.get("taxonomy").and_then(|t| t.get(taxonomy)) {
            Some(Value::String(term)) => vec![term.clone()],
            Some(Value::Array(terms)) => terms
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Reads `+++`-fenced TOML front matter from page files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrontMatterParser;

const FENCE: &str = "+++";

impl ContentParser for FrontMatterParser {
    fn parse(&self, path: &Path) -> Result<PageHeader, ParseError> {
        let content =
            fs::read_to_string(path).map_err(|e| ParseError::Io(path.to_path_buf(), e))?;
        parse_page(&content, path)
    }
}

/// Split front matter from body and build the header.
pub fn parse_page(content: &str, path: &Path) -> Result<PageHeader, ParseError> {
    let (front, body) = split_front_matter(content)
        .ok_or_else(|| ParseError::Unterminated(path.to_path_buf()))?;

    let mut header = match front {
        Some(toml_src) => {
            let table: toml::Table = toml::from_str(toml_src)
                .map_err(|e| ParseError::FrontMatter(path.to_path_buf(), e))?;
            match toml_to_json(toml::Value::Table(table)) {
                Value::Object(fields) => PageHeader::new(fields),
                _ => PageHeader::default(),
            }
        }
        None => PageHeader::default(),
    };

    if header.title().is_none()
        && let Some(heading) = first_heading(body)
    {
        header.set("title", heading);
    }

    Ok(header)
}

/// Plain text of the first non-empty level-one heading.
fn first_heading(body: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();
    for event in Parser::new(body) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_heading = false;
                text.clear();
            }
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            _ => {}
        }
    }
    None
}

/// Returns `(front_matter, body)`, or `None` if a fence is opened but never closed.
fn split_front_matter(content: &str) -> Option<(Option<&str>, &str)> {
    let trimmed = content.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return Some((None, trimmed));
    };
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let body = &rest[offset + line.len()..];
            return Some((Some(&rest[..offset]), body));
        }
        offset += line.len();
    }
    None
}

/// Convert TOML into JSON. TOML datetimes become their RFC 3339 text.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse_str(content: &str) -> PageHeader {
        parse_page(content, Path::new("page.md")).unwrap()
    }

    #[test]
    fn front_matter_fields() {
        let header = parse_str(
            "+++\ntitle = \"Hello\"\nslug = \"hi\"\npublished = false\n+++\nbody\n",
        );
        assert_eq!(header.title(), Some("Hello"));
        assert_eq!(header.slug(), Some("hi"));
        assert_eq!(header.get_bool("published"), Some(false));
    }

    #[test]
    fn toml_datetime_becomes_text() {
        let header = parse_str("+++\ndate = 2020-02-01\n+++\n");
        assert_eq!(header.date(), Some("2020-02-01"));
    }

    #[test]
    fn order_table() {
        let header = parse_str(
            "+++\n[order]\nby = \"date\"\ndir = \"desc\"\nmanual = [\"b\", \"a\"]\n+++\n",
        );
        assert_eq!(header.order_by(), Some("date"));
        assert_eq!(header.order_dir(), Some("desc"));
        assert_eq!(
            header.order_manual(),
            Some(vec!["b".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn taxonomy_accepts_string_or_list() {
        let header = parse_str(
            "+++\n[taxonomy]\ncategory = \"blog\"\ntag = [\"rust\", \"cms\"]\n+++\n",
        );
        assert_eq!(header.taxonomy_terms("category"), vec!["blog"]);
        assert_eq!(header.taxonomy_terms("tag"), vec!["rust", "cms"]);
        assert!(header.taxonomy_terms("author").is_empty());
    }

    #[test]
    fn dotted_lookup_into_nested_tables() {
        let header = parse_str("+++\n[author]\nname = \"Ada\"\n+++\n");
        assert_eq!(header.get_str("author.name"), Some("Ada"));
        assert_eq!(header.get_str("author.email"), None);
    }

    #[test]
    fn title_falls_back_to_heading() {
        let header = parse_str("Intro line\n\n# The Heading\n\nText");
        assert_eq!(header.title(), Some("The Heading"));
    }

    #[test]
    fn heading_markup_is_stripped() {
        let header = parse_str("## Not this\n\nThe *Real* `Title`\n===\n");
        assert_eq!(header.title(), Some("The Real Title"));
    }

    #[test]
    fn header_title_wins_over_heading() {
        let header = parse_str("+++\ntitle = \"Front\"\n+++\n# Body\n");
        assert_eq!(header.title(), Some("Front"));
    }

    #[test]
    fn no_front_matter_no_heading_is_empty() {
        assert!(parse_str("just text").is_empty());
    }

    #[test]
    fn unterminated_front_matter_is_error() {
        let result = parse_page("+++\ntitle = \"x\"\n", Path::new("p.md"));
        assert!(matches!(result, Err(ParseError::Unterminated(_))));
    }

    #[test]
    fn invalid_toml_is_error() {
        let result = parse_page("+++\ntitle = \n+++\n", Path::new("p.md"));
        assert!(matches!(result, Err(ParseError::FrontMatter(_, _))));
    }

    #[test]
    fn parser_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("default.md");
        fs::write(&path, "+++\ntitle = \"On disk\"\n+++\n").unwrap();
        let header = FrontMatterParser.parse(&path).unwrap();
        assert_eq!(header.title(), Some("On disk"));
    }

    #[test]
    fn header_survives_json_round_trip() {
        let header = parse_str("+++\ntitle = \"T\"\n[extra]\nrank = 3\n+++\n");
        let json = serde_json::to_string(&header).unwrap();
        let back: PageHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
    }
}
