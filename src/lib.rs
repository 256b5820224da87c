//! Spoke CLI - Move a Jekyll blog into one repository per post
//!
//! Each post under `_posts/` becomes its own repository whose README is the
//! cleaned-up post. Follow-up passes keep repository descriptions in sync
//! with the READMEs and patch titles into posts published without one.

pub mod cli;
pub mod domain;
pub mod hosting;
pub mod storage;
pub mod workflow;

pub use domain::{Document, Metadata, SourcePost};
pub use hosting::{GhClient, HostingClient, HostingError, MemoryHost};
pub use workflow::{Migrator, RunLog, TitleFixer, Verifier};
