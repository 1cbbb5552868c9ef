//! Filesystem publisher for logbook pages.
//!
//! Template definitions come from `templates.toml` in the template root (or
//! the built-in layouts). Pages are rendered with Jinja templates and written
//! under the output root.

mod builtin;
pub mod config;
mod context;
pub mod markdown;
mod publisher;
mod render;

pub use config::{SetupError, TemplateConfig};
pub use publisher::FsPublisher;
