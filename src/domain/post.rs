//! Source posts and metadata extraction
//!
//! Posts are named `YYYY-MM-DD-slug.md`. The slug becomes the repository
//! identifier, and doubles as a fallback title when the frontmatter has none.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde_yaml::Value;

use super::frontmatter::{parse_lenient, Document, Metadata};

/// `YYYY-M-D-slug.md`, with one- or two-digit month and day
static DATED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})-(.+)\.md$").expect("valid filename pattern")
});

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid date pattern"));

/// A post read from the source tree
#[derive(Debug, Clone)]
pub struct SourcePost {
    /// File name, e.g. `2024-01-31-my-post.md`
    pub filename: String,

    /// Parsed content
    pub document: Document,

    /// Why the frontmatter was discarded, if it was
    pub frontmatter_error: Option<String>,
}

impl SourcePost {
    /// Parses a post from its file name and raw content
    pub fn from_raw(filename: impl Into<String>, raw: &str) -> Self {
        let (document, error) = parse_lenient(raw);
        Self {
            filename: filename.into(),
            document,
            frontmatter_error: error.map(|e| e.to_string()),
        }
    }

    /// Repository identifier derived from the file name
    pub fn identifier(&self) -> String {
        slug_from_filename(&self.filename)
    }

    /// Explicit title, or one derived from the identifier
    pub fn title(&self) -> String {
        title_for(&self.document.metadata, &self.identifier())
    }

    /// Publication date as `YYYY-MM-DD`
    pub fn date(&self) -> String {
        date_from(&self.filename, &self.document.metadata)
    }
}

/// Extracts the repository identifier from a post file name
pub fn slug_from_filename(name: &str) -> String {
    match DATED_FILENAME.captures(name) {
        Some(caps) => sanitize_identifier(&caps[4]),
        None => sanitize_identifier(name.strip_suffix(".md").unwrap_or(name)),
    }
}

/// Makes a string safe to use as a repository name.
///
/// Every character outside `[A-Za-z0-9-_.]` (colons included) becomes `-`,
/// runs of `-` collapse to one, and leading or trailing `-` are dropped.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
            c
        } else {
            '-'
        };

        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    out.trim_matches('-').to_string()
}

/// Turns `my-great-post` into `My Great Post`.
///
/// Every alphabetic run is capitalized and lowercased after its first letter,
/// so `ArgoCD` becomes `Argocd`.
pub fn title_from_slug(slug: &str) -> String {
    let mut title = String::with_capacity(slug.len());
    let mut word_start = true;

    for c in slug.chars() {
        let c = if c == '-' { ' ' } else { c };

        if c.is_alphabetic() {
            if word_start {
                title.extend(c.to_uppercase());
            } else {
                title.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            title.push(c);
            word_start = true;
        }
    }

    title
}

/// Explicit frontmatter title, else a title derived from the identifier
pub fn title_for(metadata: &Metadata, identifier: &str) -> String {
    metadata
        .title()
        .unwrap_or_else(|| title_from_slug(identifier))
}

/// Publication date as `YYYY-MM-DD`.
///
/// Prefers the frontmatter `date` (date portion only), then the file name
/// prefix, then today.
pub fn date_from(filename: &str, metadata: &Metadata) -> String {
    metadata
        .get("date")
        .and_then(date_portion)
        .or_else(|| filename_date(filename))
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string())
}

fn date_portion(value: &Value) -> Option<String> {
    let Value::String(s) = value else {
        return None;
    };

    let token = s.split_whitespace().next()?;
    let token = token.split('T').next().unwrap_or(token);

    match NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
        Err(_) => Some(token.to_string()),
    }
}

fn filename_date(filename: &str) -> Option<String> {
    let caps = LEADING_DATE.captures(filename)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_raw_keeps_marker_inside_title() {
        let post = SourcePost::from_raw(
            "2024-05-01-parts.md",
            "---\ntitle: Part 1 --- Part 2\n---\n\nBody.\n",
        );

        assert!(post.frontmatter_error.is_none());
        assert_eq!(post.title(), "Part 1 --- Part 2");
        assert_eq!(post.document.body, "Body.");
    }

    #[test]
    fn from_raw_keeps_marker_inside_quoted_title() {
        let post = SourcePost::from_raw(
            "2024-05-01-parts.md",
            "---\ntitle: \"A --- B\"\ndate: 2024-05-02\n---\nBody.\n",
        );

        assert!(post.frontmatter_error.is_none());
        assert_eq!(post.title(), "A --- B");
        assert_eq!(post.date(), "2024-05-02");
        assert_eq!(post.document.body, "Body.");
    }

    #[test]
    fn sanitize_replaces_and_collapses() {
        assert_eq!(sanitize_identifier("My Post: A Title!"), "My-Post-A-Title");
        assert_eq!(sanitize_identifier("--already--fine--"), "already-fine");
        assert_eq!(sanitize_identifier("keep_under.score"), "keep_under.score");
        assert_eq!(sanitize_identifier("naïve café"), "na-ve-caf");
    }

    #[test]
    fn slug_from_dated_filename() {
        assert_eq!(
            slug_from_filename("2024-12-1-ArgoCD-Multi-Source-Deployments.md"),
            "ArgoCD-Multi-Source-Deployments"
        );
        assert_eq!(
            slug_from_filename("2023-05-17-kubernetes: the hard way.md"),
            "kubernetes-the-hard-way"
        );
    }

    #[test]
    fn slug_from_undated_filename() {
        assert_eq!(slug_from_filename("about me.md"), "about-me");
        assert_eq!(slug_from_filename("notes"), "notes");
    }

    #[test]
    fn title_from_slug_title_cases_words() {
        assert_eq!(
            title_from_slug("ArgoCD-Multi-Source-Deployments"),
            "Argocd Multi Source Deployments"
        );
        assert_eq!(title_from_slug("hello-world"), "Hello World");
    }

    #[test]
    fn derived_title_for_post_without_frontmatter() {
        let post = SourcePost::from_raw(
            "2024-12-1-ArgoCD-Multi-Source-Deployments.md",
            "Just a body.",
        );

        assert_eq!(post.identifier(), "ArgoCD-Multi-Source-Deployments");
        assert_eq!(post.title(), "Argocd Multi Source Deployments");
        assert_eq!(post.date(), "2024-12-01");
    }

    #[test]
    fn explicit_title_wins() {
        let post = SourcePost::from_raw(
            "2024-01-02-some-slug.md",
            "---\ntitle: The Real Title\n---\nBody",
        );
        assert_eq!(post.title(), "The Real Title");
    }

    #[test]
    fn date_prefers_frontmatter() {
        let post = SourcePost::from_raw(
            "2024-01-02-post.md",
            "---\ndate: 2023-06-15 10:30:00 +0000\n---\nBody",
        );
        assert_eq!(post.date(), "2023-06-15");

        let post = SourcePost::from_raw(
            "2024-01-02-post.md",
            "---\ndate: 2023-06-15T10:30:00Z\n---\nBody",
        );
        assert_eq!(post.date(), "2023-06-15");
    }

    #[test]
    fn date_falls_back_to_today() {
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(date_from("undated.md", &Metadata::new()), today);
    }

    #[test]
    fn malformed_frontmatter_is_recorded() {
        let post = SourcePost::from_raw("2024-01-02-post.md", "---\ntitle: [oops\n---\nBody");
        assert!(post.frontmatter_error.is_some());
        assert_eq!(post.title(), "Post");
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(name in "\\PC{0,40}") {
            let once = sanitize_identifier(&name);
            prop_assert_eq!(sanitize_identifier(&once), once);
        }

        #[test]
        fn sanitize_output_is_repository_safe(name in "\\PC{0,40}") {
            let id = sanitize_identifier(&name);
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
            prop_assert!(!id.starts_with('-') && !id.ends_with('-'));
            prop_assert!(!id.contains("--"));
        }
    }
}
