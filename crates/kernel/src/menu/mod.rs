//! Admin menu registry.
//!
//! Menus are collected from plugins via the `tap_menu` tap at startup and
//! provide the admin pages, their permissions, and the dashboard links.

mod registry;

pub use registry::{CONFIG_PARENT, MenuRegistry};
