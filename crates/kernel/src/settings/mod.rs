//! Plugin settings persistence.
//!
//! Plugins declare settings through `tap_settings_info`; the generic
//! settings endpoint stores every setting of a group when that group's form
//! is submitted.

mod registry;

pub use registry::{SettingsRegistry, values_from_submission};
