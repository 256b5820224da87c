//! Frontmatter codec
//!
//! A document is an optional YAML block fenced by `---` markers followed by a
//! Markdown body. Parsing is tolerant: anything that does not look like a
//! well-formed block degrades to "no metadata" instead of failing, so one bad
//! post never stops a run.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Marker that opens and closes a frontmatter block
pub const MARKER: &str = "---";

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("Invalid frontmatter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Frontmatter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// Ordered key/value metadata from a frontmatter block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Mapping);

impl Metadata {
    /// Creates empty metadata
    pub fn new() -> Self {
        Self(Mapping::new())
    }

    /// Gets a raw value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Gets a scalar value rendered as a string
    ///
    /// Strings are returned as-is, numbers and booleans are formatted.
    /// Nulls, sequences and nested mappings yield `None`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Sets a value. An existing key keeps its position, a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(Value::String(key.into()), value.into());
    }

    /// Returns true if the given key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.0.iter()
    }

    /// The non-empty `title` entry, if any
    pub fn title(&self) -> Option<String> {
        self.get_str("title").filter(|t| !t.trim().is_empty())
    }
}

impl From<Mapping> for Metadata {
    fn from(mapping: Mapping) -> Self {
        Self(mapping)
    }
}

/// A parsed document: metadata plus Markdown body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub metadata: Metadata,
    pub body: String,
}

impl Document {
    /// Creates a document from its parts
    pub fn new(metadata: Metadata, body: impl Into<String>) -> Self {
        Self {
            metadata,
            body: body.into(),
        }
    }

    /// A document without metadata whose body is the raw text
    fn plain(raw: &str) -> Self {
        Self::new(Metadata::new(), raw)
    }

    /// Parses a document, logging and discarding a malformed block
    pub fn parse(raw: &str) -> Self {
        let (document, error) = parse_lenient(raw);
        if let Some(e) = error {
            log::error!("Error parsing frontmatter: {}", e);
        }
        document
    }

    /// Renders the document back to text
    pub fn render(&self) -> Result<String, FrontmatterError> {
        serialize(&self.metadata, &self.body)
    }
}

/// Splits a document into metadata and body.
///
/// The block is fenced by lines that hold only the marker, so `---` inside a
/// value or the body never ends it. Returns the degraded document together
/// with the reason when the block could not be read. Text that does not open
/// with a marker line, or that lacks a closing one, is returned as a body
/// with empty metadata and no error.
pub fn parse_lenient(raw: &str) -> (Document, Option<FrontmatterError>) {
    let Some((block, rest)) = split_block(raw) else {
        return (Document::plain(raw), None);
    };

    match parse_block(block.trim()) {
        Ok(metadata) => (Document::new(metadata, rest.trim()), None),
        Err(e) => (Document::plain(raw), Some(e)),
    }
}

/// Finds the block between the opening marker line and the next marker line.
///
/// Trailing whitespace (including `\r`) is allowed on marker lines.
fn split_block(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');

    let opening = lines.next()?;
    if !is_marker_line(opening) {
        return None;
    }

    let start = opening.len();
    let mut offset = start;
    for line in lines {
        if is_marker_line(line) {
            return Some((&raw[start..offset], &raw[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

fn is_marker_line(line: &str) -> bool {
    line.trim_end() == MARKER
}

fn parse_block(block: &str) -> Result<Metadata, FrontmatterError> {
    if block.is_empty() {
        return Ok(Metadata::new());
    }

    match serde_yaml::from_str::<Value>(block)? {
        Value::Mapping(mapping) => Ok(Metadata(mapping)),
        Value::Null => Ok(Metadata::new()),
        Value::Bool(_) => Err(FrontmatterError::NotAMapping("a boolean")),
        Value::Number(_) => Err(FrontmatterError::NotAMapping("a number")),
        Value::String(_) => Err(FrontmatterError::NotAMapping("a string")),
        Value::Sequence(_) => Err(FrontmatterError::NotAMapping("a sequence")),
        Value::Tagged(_) => Err(FrontmatterError::NotAMapping("a tagged value")),
    }
}

/// Renders metadata and body as a document.
///
/// The block is emitted in block style with keys in insertion order, then a
/// closing marker, a blank line and the body.
pub fn serialize(metadata: &Metadata, body: &str) -> Result<String, FrontmatterError> {
    let yaml = if metadata.is_empty() {
        String::new()
    } else {
        serde_yaml::to_string(&metadata.0)?
    };

    let mut content = String::with_capacity(yaml.len() + body.len() + 16);
    content.push_str(MARKER);
    content.push('\n');
    content.push_str(&yaml);
    content.push_str(MARKER);
    content.push_str("\n\n");
    content.push_str(body);

    if !content.ends_with('\n') {
        content.push('\n');
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_without_marker_returns_raw_body() {
        let raw = "# Just markdown\n\nNo metadata here.";
        let (doc, error) = parse_lenient(raw);

        assert!(error.is_none());
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn parse_missing_closing_marker_degrades_silently() {
        let raw = "---\ntitle: Broken\n\nBody without a closing marker";
        let (doc, error) = parse_lenient(raw);

        assert!(error.is_none());
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn parse_reads_block_and_trims_body() {
        let raw = "---\ntitle: Hello World\nlayout: post\n---\n\n  Body text.\n\n";
        let doc = Document::parse(raw);

        assert_eq!(doc.metadata.title().as_deref(), Some("Hello World"));
        assert_eq!(doc.metadata.get_str("layout").as_deref(), Some("post"));
        assert_eq!(doc.body, "Body text.");
    }

    #[test]
    fn parse_invalid_yaml_reports_error_and_keeps_raw() {
        let raw = "---\ntitle: [unclosed\n---\nBody";
        let (doc, error) = parse_lenient(raw);

        assert!(matches!(error, Some(FrontmatterError::Yaml(_))));
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn parse_scalar_block_is_not_a_mapping() {
        let (doc, error) = parse_lenient("---\njust words\n---\nBody");

        assert!(matches!(error, Some(FrontmatterError::NotAMapping("a string"))));
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn parse_ignores_marker_inside_values_and_body() {
        let raw = "---\ntitle: Part 1 --- Part 2\n---\n\nBody with ---inline--- dashes\n";
        let (doc, error) = parse_lenient(raw);

        assert!(error.is_none());
        assert_eq!(doc.metadata.title().as_deref(), Some("Part 1 --- Part 2"));
        assert_eq!(doc.body, "Body with ---inline--- dashes");
    }

    #[test]
    fn parse_quoted_value_with_marker() {
        let doc = Document::parse("---\ntitle: \"A --- B\"\nlayout: post\n---\nBody");

        assert_eq!(doc.metadata.title().as_deref(), Some("A --- B"));
        assert_eq!(doc.metadata.get_str("layout").as_deref(), Some("post"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn parse_accepts_crlf_markers() {
        let doc = Document::parse("---\r\ntitle: Windows\r\n---\r\n\r\nBody\r\n");

        assert_eq!(doc.metadata.title().as_deref(), Some("Windows"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn parse_requires_marker_on_its_own_line() {
        let raw = "---title: inline\n---\nBody";
        let (doc, error) = parse_lenient(raw);

        assert!(error.is_none());
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn roundtrip_title_with_marker() {
        let mut meta = Metadata::new();
        meta.insert("title", "Part 1 --- Part 2");
        let doc = Document::new(meta, "Body");

        let text = doc.render().unwrap();
        assert_eq!(text, "---\ntitle: Part 1 --- Part 2\n---\n\nBody\n");
        assert_eq!(Document::parse(&text), doc);
    }

    #[test]
    fn parse_empty_block() {
        let doc = Document::parse("---\n---\n\nBody");
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn serialize_uses_block_style_in_insertion_order() {
        let mut meta = Metadata::new();
        meta.insert("title", "Zebra");
        meta.insert("author", "Ann");

        let text = serialize(&meta, "Body").unwrap();
        assert_eq!(text, "---\ntitle: Zebra\nauthor: Ann\n---\n\nBody\n");
    }

    #[test]
    fn serialize_keeps_unicode_readable() {
        let mut meta = Metadata::new();
        meta.insert("title", "Café Über");

        let text = serialize(&meta, "").unwrap();
        assert!(text.contains("title: Café Über"));
    }

    #[test]
    fn insert_existing_key_keeps_position() {
        let mut meta = Metadata::new();
        meta.insert("title", "Old");
        meta.insert("date", "2024-01-01");
        meta.insert("title", "New");

        let keys: Vec<_> = meta.iter().filter_map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["title", "date"]);
        assert_eq!(meta.title().as_deref(), Some("New"));
    }

    #[test]
    fn blank_title_is_treated_as_missing() {
        let doc = Document::parse("---\ntitle: \"  \"\n---\nBody");
        assert!(doc.metadata.contains_key("title"));
        assert_eq!(doc.metadata.title(), None);
    }

    #[test]
    fn numeric_values_render_as_strings() {
        let doc = Document::parse("---\ntitle: 1984\n---\nBody");
        assert_eq!(doc.metadata.title().as_deref(), Some("1984"));
    }

    #[test]
    fn document_render_roundtrip() {
        let mut meta = Metadata::new();
        meta.insert("title", "Multi: line? yes");
        let doc = Document::new(meta, "# Heading\n\nText with --- inside.");

        let parsed = Document::parse(&doc.render().unwrap());
        assert_eq!(parsed, doc);
    }

    proptest! {
        #[test]
        fn serialize_then_parse_roundtrips(
            entries in prop::collection::vec(
                ("[a-z][a-z_]{0,8}", "[A-Za-z0-9 ,.!?:#'\"*&@%|>\\[\\]{}-]{0,24}"),
                0..6,
            ),
            body in "[A-Za-z0-9#*.,!?: \n-]{0,120}",
        ) {
            let mut meta = Metadata::new();
            for (k, v) in &entries {
                meta.insert(k.clone(), v.clone());
            }
            let body = body.trim().to_string();
            // A body line that is only the marker would close the block early
            prop_assume!(!body.lines().any(|l| l.trim_end() == MARKER));

            let text = serialize(&meta, &body).unwrap();
            let (doc, error) = parse_lenient(&text);

            prop_assert!(error.is_none());
            prop_assert_eq!(doc.metadata, meta);
            prop_assert_eq!(doc.body, body);
        }
    }
}
