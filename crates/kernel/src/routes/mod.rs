//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod front;
pub mod health;
pub mod helpers;
pub mod item;
