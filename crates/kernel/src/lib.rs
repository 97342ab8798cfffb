//! Vetrina CMS Kernel Library
//!
//! The kernel serves content, hosts the compiled-in plugins and dispatches
//! their taps. The main entry point for running the server is the `vetrina`
//! binary.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod form;
pub mod host;
pub mod menu;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod session;
pub mod settings;
pub mod state;
pub mod tap;
pub mod theme;

use axum::Router;

use crate::state::AppState;

/// All kernel routes, before session and tracing layers are applied.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .merge(routes::front::router())
        .merge(routes::auth::router())
        .merge(routes::admin::router())
        .merge(routes::health::router())
        .merge(routes::item::router())
}
