//! Form rendering support and CSRF protection.
//!
//! Form definitions live in the SDK so plugins can build them; the kernel
//! fills in tokens and renders them through Tera templates.

pub mod csrf;

pub use csrf::{clear_csrf_tokens, generate_csrf_token, verify_csrf_token};
pub use vetrina_sdk::form::{ElementType, Form, FormElement};
