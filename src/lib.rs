//! Heading ids and tables of contents for HTML pages.
//!
//! [`html::build`] finds the headings of a page, gives each a stable id
//! (adding it to the markup when the heading has none) and nests them into a
//! tree by level. [`Context`] wraps that in the rendering layer: a content hook
//! for page bodies, embedded `[fyplugins_table_of_contents]` tags, and whole
//! site rendering.

pub mod assets;
pub mod cache;
pub mod core;
pub mod guard;
pub mod html;
pub mod options;
pub mod parallel;
pub mod render;
pub mod shortcode;

pub use crate::core::{Config, Context};
