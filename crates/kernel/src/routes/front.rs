//! Front page and content-type archive listings.

use axum::Router;
use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use tower_sessions::Session;
use vetrina_sdk::types::PageView;

use crate::error::{AppError, AppResult};
use crate::permissions::ACCESS_CONTENT;
use crate::state::AppState;
use crate::theme::ThemeEngine;

use super::helpers::{render_page, require_permission};

/// Items shown on a listing page.
const LISTING_LIMIT: i64 = 20;

/// Create the front page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(front_page))
        .route("/type/{type}", get(type_archive))
}

/// Front page: the newest published items of every type.
async fn front_page(State(state): State<AppState>, session: Session) -> AppResult<Html<String>> {
    render_listing(&state, &session, "/", None).await
}

/// Archive of one content type.
async fn type_archive(
    State(state): State<AppState>,
    session: Session,
    Path(item_type): Path<String>,
) -> AppResult<Html<String>> {
    if !state.content_types().exists(&item_type) {
        return Err(AppError::NotFound);
    }
    let path = format!("/type/{item_type}");
    render_listing(&state, &session, &path, Some(item_type)).await
}

async fn render_listing(
    state: &AppState,
    session: &Session,
    path: &str,
    item_type: Option<String>,
) -> AppResult<Html<String>> {
    let request = state.request_state(session).await;
    require_permission(&request, ACCESS_CONTENT)?;

    let items = state
        .items()
        .list_published(item_type.as_deref(), LISTING_LIMIT)
        .await?;

    let title = match &item_type {
        Some(t) => state
            .content_types()
            .get(t)
            .map(|info| info.label)
            .unwrap_or_else(|| t.clone()),
        None => "Home".to_string(),
    };

    let view = PageView::Listing { item_type };
    let head = ThemeEngine::render_head(&state.tap_dispatcher().page_head(&request, &view).await);

    let mut context = tera::Context::new();
    context.insert("items", &items);
    context.insert("heading", &title);
    let content = state.theme().render("item/listing.html", &context)?;

    render_page(state, &request, path, &title, &head, &content).await
}
