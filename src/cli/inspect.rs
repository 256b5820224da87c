//! `spoke inspect`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::output::Output;
use crate::domain::{derive_description, find_image_references, strip_templating};
use crate::storage::{Config, PostStore};

#[derive(Args)]
pub struct InspectArgs {
    /// Post file to inspect
    pub file: PathBuf,

    /// Maximum description length
    #[arg(long)]
    pub max_length: Option<usize>,
}

#[derive(Serialize)]
struct InspectReport {
    filename: String,
    identifier: String,
    title: String,
    date: String,
    images: Vec<String>,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    frontmatter_error: Option<String>,
}

pub fn run(args: InspectArgs, config: &Config, output: &Output) -> Result<()> {
    let dir = args
        .file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let post = PostStore::new(dir).read(&args.file)?;

    let body = strip_templating(&post.document.body);
    let max_length = args.max_length.unwrap_or(config.project.verify.max_length);

    let report = InspectReport {
        identifier: post.identifier(),
        title: post.title(),
        date: post.date(),
        images: find_image_references(&body)
            .into_iter()
            .map(|r| r.path)
            .collect(),
        description: derive_description(&body, max_length),
        frontmatter_error: post.frontmatter_error.clone(),
        filename: post.filename,
    };

    if output.is_json() {
        return output.document(&report);
    }

    output.field("Identifier", &report.identifier);
    output.field("Title", &report.title);
    output.field("Date", &report.date);
    for image in &report.images {
        output.field("Image", image);
    }
    output.field("Description", &report.description);
    if let Some(e) = &report.frontmatter_error {
        output.field("Frontmatter error", e);
    }

    Ok(())
}
