//! Item routes: viewing, the editing surface, and the save endpoints.
//!
//! Every save path (create, edit, autosave) goes through `ItemService`,
//! which dispatches `tap_item_save` with the submitted values.

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;
use vetrina_sdk::form::{Form as FormDef, FormElement};
use vetrina_sdk::host::Host;
use vetrina_sdk::types::{Item as SdkItem, PageView};

use crate::content::SaveKind;
use crate::error::{AppError, AppResult};
use crate::models::{CreateItem, Item, UpdateItem};
use crate::permissions::{ACCESS_CONTENT, CREATE_CONTENT};
use crate::state::AppState;
use crate::tap::RequestState;
use crate::theme::{TOKEN_FIELD, ThemeEngine};

use super::helpers::{
    ACCESS_DENIED, render_page, require_login, require_permission, submitted, submitted_values,
};

/// Form id of the editing surface; also the token action.
const ITEM_FORM_ID: &str = "item_form";

/// Token action for background autosaves.
const AUTOSAVE_ACTION: &str = "item_autosave";

/// Value of the status checkbox when the item is published.
const PUBLISHED: &str = "published";

/// Create the item router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/item/add/{type}", get(add_form).post(add_submit))
        .route("/item/{id}", get(view_item))
        .route("/item/{id}/edit", get(edit_form).post(edit_submit))
        .route("/item/{id}/autosave", post(autosave))
}

/// Single-item view.
async fn view_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let request = state.request_state(&session).await;
    require_permission(&request, ACCESS_CONTENT)?;

    let item = state.items().load(id).await?.ok_or(AppError::NotFound)?;
    let sdk_item = item.to_sdk();
    let can_edit = request.user.can_edit(&sdk_item);
    if !item.is_published() && !can_edit {
        return Err(AppError::NotFound);
    }

    let view = PageView::Single { item: sdk_item };
    let head = ThemeEngine::render_head(&state.tap_dispatcher().page_head(&request, &view).await);

    let mut context = tera::Context::new();
    context.insert("item", &item);
    context.insert("can_edit", &can_edit);
    let content = state.theme().render("item/view.html", &context)?;

    render_page(
        &state,
        &request,
        &format!("/item/{id}"),
        &item.title,
        &head,
        &content,
    )
    .await
}

/// Editing surface for a new item.
async fn add_form(
    State(state): State<AppState>,
    session: Session,
    Path(item_type): Path<String>,
) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let request = state.request_state(&session).await;
    require_permission(&request, CREATE_CONTENT)?;
    let info = state
        .content_types()
        .get(&item_type)
        .ok_or(AppError::NotFound)?;

    // Plugins see a provisional item until the first save assigns the id
    let now = chrono::Utc::now().timestamp();
    let draft = SdkItem {
        id: Uuid::now_v7(),
        item_type: item_type.clone(),
        title: String::new(),
        status: 1,
        author_id: user.id,
        created: now,
        changed: now,
    };

    let path = format!("/item/add/{item_type}");
    let form = editing_form(&state, &request, &draft, "", path.clone()).await?;

    let mut context = tera::Context::new();
    context.insert("form", &form);
    context.insert("autosave", &false);
    let content = state.theme().render("item/edit.html", &context)?;

    let title = format!("Create {}", info.label);
    Ok(render_page(&state, &request, &path, &title, "", &content)
        .await?
        .into_response())
}

/// Create an item from the editing surface.
async fn add_submit(
    State(state): State<AppState>,
    session: Session,
    Path(item_type): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let request = state.request_state(&session).await;
    require_permission(&request, CREATE_CONTENT)?;
    if !state.content_types().exists(&item_type) {
        return Err(AppError::NotFound);
    }
    verify_form_token(&request, &pairs).await?;

    let core = CoreFields::from_pairs(&pairs)?;
    let item = state
        .items()
        .create(
            CreateItem {
                item_type,
                title: core.title,
                body: core.body,
                author_id: user.id,
                status: Some(core.status),
            },
            &request,
            submitted_values(&pairs),
        )
        .await?;

    Ok(Redirect::to(&format!("/item/{}", item.id)).into_response())
}

/// Editing surface for an existing item.
async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    if let Err(redirect) = require_login(&state, &session).await {
        return Ok(redirect);
    }
    let request = state.request_state(&session).await;
    let item = load_editable(&state, &request, id).await?;

    let path = format!("/item/{id}/edit");
    let form = editing_form(&state, &request, &item.to_sdk(), &item.body, path.clone()).await?;
    let autosave_token = request.issue_token(AUTOSAVE_ACTION).await?;

    let mut context = tera::Context::new();
    context.insert("form", &form);
    context.insert("autosave", &true);
    context.insert("autosave_url", &format!("/item/{id}/autosave"));
    context.insert("autosave_token", &autosave_token);
    let content = state.theme().render("item/edit.html", &context)?;

    let title = format!("Edit {}", item.title);
    Ok(render_page(&state, &request, &path, &title, "", &content)
        .await?
        .into_response())
}

/// Save an existing item from the editing surface.
async fn edit_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    if let Err(redirect) = require_login(&state, &session).await {
        return Ok(redirect);
    }
    let request = state.request_state(&session).await;
    load_editable(&state, &request, id).await?;
    verify_form_token(&request, &pairs).await?;

    let core = CoreFields::from_pairs(&pairs)?;
    let update = UpdateItem {
        title: Some(core.title),
        body: Some(core.body),
        status: Some(core.status),
    };
    state
        .items()
        .update(id, update, &request, submitted_values(&pairs), SaveKind::Explicit)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Redirect::to(&format!("/item/{id}")).into_response())
}

/// Background autosave request.
#[derive(Debug, Deserialize)]
struct AutosaveRequest {
    title: Option<String>,
    body: Option<String>,
    token: String,
}

/// Autosave response; `token` authorises the next autosave.
#[derive(Debug, Serialize)]
struct AutosaveResponse {
    saved: bool,
    changed: i64,
    token: String,
}

/// Save title and body in the background. Plugins are notified with the
/// autosave flag set.
async fn autosave(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(input): Json<AutosaveRequest>,
) -> AppResult<Json<AutosaveResponse>> {
    if state.current_user(&session).await.is_none() {
        return Err(AppError::Unauthorized);
    }
    let request = state.request_state(&session).await;
    load_editable(&state, &request, id).await?;

    if !request.verify_token(AUTOSAVE_ACTION, &input.token).await? {
        return Err(AppError::BadRequest("invalid autosave token".to_string()));
    }

    let mut values = std::collections::HashMap::new();
    if let Some(title) = &input.title {
        values.insert("title".to_string(), title.clone());
    }
    if let Some(body) = &input.body {
        values.insert("body".to_string(), body.clone());
    }

    let update = UpdateItem {
        title: input.title.filter(|t| !t.trim().is_empty()),
        body: input.body,
        status: None,
    };
    let item = state
        .items()
        .update(id, update, &request, values, SaveKind::Autosave)
        .await?
        .ok_or(AppError::NotFound)?;

    let token = request.issue_token(AUTOSAVE_ACTION).await?;
    Ok(Json(AutosaveResponse {
        saved: true,
        changed: item.changed,
        token,
    }))
}

/// Load an item the current user may edit.
async fn load_editable(state: &AppState, request: &RequestState, id: Uuid) -> AppResult<Item> {
    let item = state.items().load(id).await?.ok_or(AppError::NotFound)?;
    if !request.user.can_edit(&item.to_sdk()) {
        return Err(AppError::Forbidden(ACCESS_DENIED.to_string()));
    }
    Ok(item)
}

async fn verify_form_token(request: &RequestState, pairs: &[(String, String)]) -> AppResult<()> {
    let token = submitted(pairs, TOKEN_FIELD).unwrap_or_default();
    if request.verify_token(ITEM_FORM_ID, token).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Invalid form token. Please try again.".to_string(),
        ))
    }
}

/// Title, body and status as submitted from the editing surface.
#[derive(Debug, PartialEq)]
struct CoreFields {
    title: String,
    body: String,
    status: i16,
}

impl CoreFields {
    fn from_pairs(pairs: &[(String, String)]) -> AppResult<Self> {
        let title = submitted(pairs, "title").unwrap_or_default().trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required.".to_string()));
        }
        let body = submitted(pairs, "body").unwrap_or_default().to_string();
        let published = pairs
            .iter()
            .any(|(k, v)| k == "status[]" && v == PUBLISHED);

        Ok(Self {
            title,
            body,
            status: i16::from(published),
        })
    }
}

/// Render the editing surface: core fields, then plugin panels in
/// priority order, then the submit button.
async fn editing_form(
    state: &AppState,
    request: &RequestState,
    item: &SdkItem,
    body: &str,
    action: String,
) -> AppResult<String> {
    let status = if item.is_published() {
        json!([PUBLISHED])
    } else {
        json!([])
    };

    let mut form = FormDef::new(ITEM_FORM_ID)
        .action(action)
        .element(
            "title",
            FormElement::textfield()
                .title("Title")
                .required()
                .max_length(255)
                .default_value(item.title.as_str()),
        )
        .element(
            "body",
            FormElement::textarea(12)
                .title("Body")
                .default_value(body)
                .weight(1),
        )
        .element(
            "status",
            FormElement::checkboxes(vec![(PUBLISHED.to_string(), "Published".to_string())])
                .default_value(status)
                .weight(2),
        )
        .element("submit", FormElement::submit("Save").weight(100));

    let panels = state.tap_dispatcher().edit_panels(request, item).await;
    let mut weight = 10;
    for panel in &panels {
        form = form.element(
            panel.id.clone(),
            ThemeEngine::panel_element(panel).weight(weight),
        );
        weight += 1;
    }

    form.token = request.issue_token(ITEM_FORM_ID).await?;
    Ok(state.theme().render_form(&form)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn core_fields_parse() {
        let core = CoreFields::from_pairs(&pairs(&[
            ("title", "  Hello  "),
            ("body", "text"),
            ("status[]", "published"),
            ("custom_css", "a{}"),
        ]))
        .unwrap();
        assert_eq!(
            core,
            CoreFields {
                title: "Hello".into(),
                body: "text".into(),
                status: 1,
            }
        );
    }

    #[test]
    fn unchecked_status_is_unpublished() {
        let core = CoreFields::from_pairs(&pairs(&[("title", "T")])).unwrap();
        assert_eq!(core.status, 0);
        assert_eq!(core.body, "");
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = CoreFields::from_pairs(&pairs(&[("title", "   ")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
