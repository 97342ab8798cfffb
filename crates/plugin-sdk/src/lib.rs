//! Vetrina Plugin SDK
//!
//! Types, traits, and host service contracts for Vetrina plugins.
//! Plugins depend on this crate, implement [`plugin::Plugin`], and reach
//! kernel services only through the [`host::Host`] trait handed to each tap.

pub mod form;
pub mod host;
pub mod plugin;
pub mod sanitize;
pub mod types;

// Re-export async_trait so plugins don't need a direct dependency
pub use async_trait::async_trait;

pub mod prelude {
    pub use crate::async_trait;
    pub use crate::form::{ElementType, Form, FormElement};
    pub use crate::host::{Host, HostError, HostResult};
    pub use crate::plugin::{Plugin, TapRegistration, taps};
    pub use crate::sanitize;
    pub use crate::types::*;
}
