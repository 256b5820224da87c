//! Body cleanup, image relocation and description generation

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Directory (relative to the published document) that receives images
pub const IMAGE_DIR: &str = "images";

static TEMPLATE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%.*?%\}").expect("valid template tag pattern"));

static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line pattern"));

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid image pattern"));

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link pattern"));

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#+\s+").expect("valid header pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence pattern"));

/// Removes `{% ... %}` tags (includes and multi-line tags too), collapses
/// runs of blank lines and trims the result.
pub fn strip_templating(body: &str) -> String {
    let stripped = TEMPLATE_TAG.replace_all(body, "");
    let collapsed = EXTRA_BLANK_LINES.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}

/// A Markdown image reference `![alt](path)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub alt: String,
    pub path: String,
}

/// Finds image references in order of appearance, duplicates included
pub fn find_image_references(body: &str) -> Vec<ImageReference> {
    IMAGE
        .captures_iter(body)
        .map(|caps| ImageReference {
            alt: caps[1].to_string(),
            path: caps[2].to_string(),
        })
        .collect()
}

/// Looks up referenced images in the source tree
#[derive(Debug, Clone)]
pub struct ImageResolver {
    source_root: PathBuf,
    images_dir: PathBuf,
}

impl ImageResolver {
    pub fn new(source_root: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            images_dir: images_dir.into(),
        }
    }

    /// Candidate locations for a reference, in lookup order
    pub fn candidates(&self, path: &str) -> Vec<PathBuf> {
        let relative = path.trim_start_matches('/');
        let mut candidates = Vec::with_capacity(3);

        if let Some(name) = Path::new(path).file_name() {
            candidates.push(self.images_dir.join(name));
        }
        candidates.push(self.source_root.join(relative));
        candidates.push(self.source_root.join("assets").join(relative));

        candidates
    }

    /// First candidate that exists as a file
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        self.candidates(path).into_iter().find(|p| p.is_file())
    }
}

/// An image to copy into the published repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCopy {
    pub source: PathBuf,
    pub file_name: String,
}

/// Result of rewriting image references in a body
#[derive(Debug, Clone, Default)]
pub struct Relocation {
    /// Body with resolved references pointing at `./images/<name>`
    pub body: String,

    /// Images to copy, in reference order
    pub copies: Vec<ImageCopy>,

    /// Reference paths that were not found anywhere
    pub missing: Vec<String>,
}

impl Relocation {
    /// Copies every resolved image into `destination` under its base name.
    ///
    /// Two sources sharing a base name land on the same file; the later one wins.
    pub fn copy_into(&self, destination: &Path) -> io::Result<usize> {
        if self.copies.is_empty() {
            return Ok(0);
        }

        fs::create_dir_all(destination)?;
        for copy in &self.copies {
            fs::copy(&copy.source, destination.join(&copy.file_name))?;
        }

        Ok(self.copies.len())
    }
}

/// Resolves each reference and rewrites `](path)` to `](./images/<name>)`.
///
/// Unresolved references stay as they are and are listed in
/// [`Relocation::missing`]. Nothing is copied here; see [`Relocation::copy_into`].
pub fn relocate_images(
    body: &str,
    references: &[ImageReference],
    resolver: &ImageResolver,
) -> Relocation {
    let mut relocation = Relocation {
        body: body.to_string(),
        ..Default::default()
    };

    for reference in references {
        let Some(source) = resolver.resolve(&reference.path) else {
            relocation.missing.push(reference.path.clone());
            continue;
        };

        let file_name = match source.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                relocation.missing.push(reference.path.clone());
                continue;
            }
        };

        relocation.body = relocation.body.replace(
            &format!("]({})", reference.path),
            &format!("](./{}/{})", IMAGE_DIR, file_name),
        );
        relocation.copies.push(ImageCopy { source, file_name });
    }

    relocation
}

/// Builds a plain-text description from the leading sentences of a body.
///
/// Markup, images and header markers are dropped and links keep their text.
/// Whole sentences are added while the running length stays under
/// `max_length`; a sentence that would cross it ends the description.
pub fn derive_description(body: &str, max_length: usize) -> String {
    let text = HTML_TAG.replace_all(body, "");
    let text = IMAGE.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = HEADER.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");

    let mut description = String::new();
    let mut length = 0;

    for sentence in SENTENCE_END.split(text.trim()) {
        let sentence = sentence.trim_end_matches(&['.', '!', '?'][..]);
        if sentence.is_empty() {
            continue;
        }

        let sentence_length = sentence.chars().count();
        if length + sentence_length + 1 >= max_length {
            break;
        }

        description.push_str(sentence);
        description.push_str(". ");
        length += sentence_length + 2;
    }

    description.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn strip_templating_removes_tags_and_blank_runs() {
        let body = "Intro\n\n{% include toc.html %}\n\n\n\nText {% raw %}here{% endraw %}\n\n\n";
        assert_eq!(strip_templating(body), "Intro\n\nText here");
    }

    #[test]
    fn strip_templating_handles_multiline_tags() {
        let body = "Before\n{% highlight yaml\n   linenos %}\nkey: value\n{% endhighlight %}\nAfter";
        assert_eq!(strip_templating(body), "Before\n\nkey: value\n\nAfter");
    }

    #[test]
    fn find_images_keeps_order_and_duplicates() {
        let body = "![one](a.png) text ![](b/c.jpg)\n![again](a.png)";
        let refs = find_image_references(body);

        let paths: Vec<_> = refs.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a.png", "b/c.jpg", "a.png"]);
        assert_eq!(refs[0].alt, "one");
        assert_eq!(refs[1].alt, "");
    }

    fn source_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets/images")).unwrap();
        fs::write(dir.path().join("assets/images/foo.png"), b"png-bytes").unwrap();
        dir
    }

    #[test]
    fn relocate_rewrites_found_images() {
        let src = source_tree();
        let resolver = ImageResolver::new(src.path(), src.path().join("assets/images"));
        let body = "Look: ![x](assets/images/foo.png)";

        let relocation = relocate_images(body, &find_image_references(body), &resolver);
        assert_eq!(relocation.body, "Look: ![x](./images/foo.png)");
        assert!(relocation.missing.is_empty());

        let dest = TempDir::new().unwrap();
        let copied = relocation.copy_into(&dest.path().join(IMAGE_DIR)).unwrap();
        assert_eq!(copied, 1);
        assert_eq!(fs::read(dest.path().join("images/foo.png")).unwrap(), b"png-bytes");
    }

    #[test]
    fn relocate_finds_absolute_paths_by_base_name() {
        let src = source_tree();
        let resolver = ImageResolver::new(src.path(), src.path().join("assets/images"));
        let body = "![x](/uploads/2024/foo.png)";

        let relocation = relocate_images(body, &find_image_references(body), &resolver);
        assert_eq!(relocation.body, "![x](./images/foo.png)");
    }

    #[test]
    fn relocate_leaves_missing_images_untouched() {
        let src = source_tree();
        let resolver = ImageResolver::new(src.path(), src.path().join("assets/images"));
        let body = "![x](assets/images/missing.png)";

        let relocation = relocate_images(body, &find_image_references(body), &resolver);
        assert_eq!(relocation.body, body);
        assert_eq!(relocation.missing, vec!["assets/images/missing.png"]);
        assert!(relocation.copies.is_empty());
    }

    #[test]
    fn copy_into_skips_directory_creation_without_images() {
        let dest = TempDir::new().unwrap();
        let relocation = Relocation::default();

        assert_eq!(relocation.copy_into(&dest.path().join(IMAGE_DIR)).unwrap(), 0);
        assert!(!dest.path().join(IMAGE_DIR).exists());
    }

    #[test]
    fn description_keeps_whole_sentences_under_limit() {
        let body = "# Hello\nThis is great. It works well. And more text that pushes past the limit entirely.";
        let description = derive_description(body, 40);

        assert_eq!(description, "Hello This is great. It works well.");
        assert!(description.chars().count() < 40);
    }

    #[test]
    fn description_strips_markup() {
        let body = "## Intro\n\n<div>Read [the docs](https://x.io) first!</div> ![img](a.png) Then go.";
        assert_eq!(derive_description(body, 300), "Intro Read the docs first. Then go.");
    }

    #[test]
    fn description_empty_when_first_sentence_too_long() {
        let body = "This single opening sentence is definitely longer than twenty characters.";
        assert_eq!(derive_description(body, 20), "");
    }

    #[test]
    fn description_of_empty_body_is_empty() {
        assert_eq!(derive_description("", 300), "");
        assert_eq!(derive_description("   \n\n", 300), "");
    }

    proptest! {
        #[test]
        fn strip_templating_is_idempotent_without_tags(body in "[A-Za-z0-9 #*.\n]{0,200}") {
            let once = strip_templating(&body);
            prop_assert_eq!(strip_templating(&once), once);
        }

        #[test]
        fn description_respects_limit(body in "[A-Za-z .!?\n]{0,300}", max in 1usize..120) {
            let description = derive_description(&body, max);
            prop_assert!(description.chars().count() < max.max(1));
        }
    }
}
