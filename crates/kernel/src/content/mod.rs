//! Content management module.
//!
//! This module provides:
//! - ContentTypeRegistry: content types loaded at startup
//! - ItemService: item CRUD with `tap_item_save` invocations

mod item_service;
mod type_registry;

pub use item_service::{ItemService, SaveKind};
pub use type_registry::ContentTypeRegistry;
