//! # Domain
//!
//! Pure text logic shared by every command: the frontmatter codec, metadata
//! extraction from post file names, and body cleanup. Nothing here talks to
//! the forge; the only filesystem access is looking up and copying images.

pub mod content;
pub mod frontmatter;
pub mod post;

pub use content::{
    derive_description, find_image_references, relocate_images, strip_templating, ImageCopy,
    ImageReference, ImageResolver, Relocation, IMAGE_DIR,
};
pub use frontmatter::{parse_lenient, serialize, Document, FrontmatterError, Metadata, MARKER};
pub use post::{
    date_from, sanitize_identifier, slug_from_filename, title_for, title_from_slug, SourcePost,
};
