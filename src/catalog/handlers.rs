use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{debug, info, instrument};

use crate::{
    catalog::{
        dto::{AddImageForm, EditImageForm, ImageListPage, ImagePage, NotFoundPage, SearchForm},
        repo,
    },
    error::{AppError, AppResult},
    extractors::IdPath,
    state::AppState,
    view::{NoContext, View},
};

const LANDING: &str = "/pyq";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pyq", get(landing))
        .route("/get_details", get(add_page))
        .route("/add_to_db", get(back_to_landing).post(add))
        .route("/print_details", get(print_details).post(print_details))
        .route("/search", get(back_to_landing).post(search))
        .route("/show/:id", get(show))
        .route("/:id/edit", get(edit_page).post(edit))
        .route("/delete/:id", get(delete))
}

async fn back_to_landing() -> Redirect {
    Redirect::to(LANDING)
}

#[instrument(skip_all)]
pub async fn landing(State(state): State<AppState>, view: View) -> AppResult<Response> {
    let images = repo::list(&state.db).await?;
    if images.is_empty() {
        return Ok(Redirect::to("/get_details").into_response());
    }
    Ok(view.render("index.html", None, ImageListPage { images }))
}

pub async fn add_page(view: View) -> Response {
    view.render("get_details.html", None, NoContext::default())
}

#[instrument(skip_all)]
pub async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddImageForm>,
) -> AppResult<Redirect> {
    let id = repo::insert(&state.db, &form.image_name, &form.image_url, &form.image_desc).await?;
    info!(image_id = id, name = %form.image_name, "image added");
    Ok(Redirect::to(LANDING))
}

#[instrument(skip_all)]
pub async fn print_details(State(state): State<AppState>, view: View) -> AppResult<Response> {
    for entry in repo::list_index(&state.db).await? {
        debug!(image_id = entry.id, name = %entry.name, "index entry");
    }
    let images = repo::list(&state.db).await?;
    Ok(view.render("print_details.html", None, ImageListPage { images }))
}

#[instrument(skip_all, fields(name = %form.iname))]
pub async fn search(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<SearchForm>,
) -> AppResult<Response> {
    let images = repo::search_by_name(&state.db, &form.iname).await?;
    debug!(hits = images.len(), "image search");
    if images.is_empty() {
        return Ok(view.render(
            "result_not_found.html",
            None,
            NotFoundPage { query: form.iname },
        ));
    }
    Ok(view.render("show_searched_image.html", None, ImageListPage { images }))
}

#[instrument(skip_all, fields(image_id = id))]
pub async fn show(
    State(state): State<AppState>,
    view: View,
    IdPath(id): IdPath,
) -> AppResult<Response> {
    let image = repo::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    Ok(view.render("show_idetails.html", None, ImagePage { image }))
}

#[instrument(skip_all, fields(image_id = id))]
pub async fn edit_page(
    State(state): State<AppState>,
    view: View,
    IdPath(id): IdPath,
) -> AppResult<Response> {
    let image = repo::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    Ok(view.render("edit_idetails.html", None, ImagePage { image }))
}

#[instrument(skip_all, fields(image_id = id))]
pub async fn edit(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Form(form): Form<EditImageForm>,
) -> AppResult<Redirect> {
    if !repo::update(&state.db, id, &form.iname, &form.iurl, &form.idesc).await? {
        return Err(AppError::NotFound);
    }
    info!("image updated");
    Ok(Redirect::to(LANDING))
}

#[instrument(skip_all, fields(image_id = id))]
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> AppResult<Redirect> {
    if !repo::delete(&state.db, id).await? {
        return Err(AppError::NotFound);
    }
    info!("image deleted");
    Ok(Redirect::to(LANDING))
}
