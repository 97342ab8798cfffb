//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering with template suggestion
//! resolution, form rendering and `<head>` element output.

mod engine;

pub use engine::{TOKEN_FIELD, ThemeEngine};
