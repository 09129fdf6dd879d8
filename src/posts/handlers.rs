use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Form, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{dto::PublicUser, extractors::AuthUser},
    error::{AppError, AppResult},
    extractors::IdPath,
    flash::{self, Flash},
    forms::{FormErrors, SubmitError},
    posts::{
        dto::{ListPage, PageQuery, PostForm, PostFormPage, PostPage, UserPostsPage},
        services,
    },
    state::AppState,
    view::{NoContext, View},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/home", get(home))
        .route("/about", get(about))
        .route("/post/:id", get(show_post))
        .route("/user/:username", get(user_posts))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/post/new", get(new_post_page).post(create_post))
        .route("/post/:id/update", get(edit_post_page).post(update_post))
        .route("/post/:id/delete", post(delete_post))
}

fn render_form(
    view: View,
    title: &str,
    legend: &'static str,
    form: PostForm,
    errors: FormErrors,
) -> Response {
    view.render(
        "create_post.html",
        Some(title),
        PostFormPage {
            legend,
            form,
            errors,
        },
    )
}

#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    view: View,
    Query(q): Query<PageQuery>,
) -> AppResult<Response> {
    let posts = services::latest(&state.db, q.number()).await?;
    Ok(view.render("home.html", None, ListPage { posts }))
}

pub async fn about(view: View) -> Response {
    view.render("about.html", Some("About"), NoContext::default())
}

#[instrument(skip_all, fields(post_id = id))]
pub async fn show_post(
    State(state): State<AppState>,
    view: View,
    IdPath(id): IdPath,
) -> AppResult<Response> {
    let post = services::get(&state.db, id).await?;
    let title = post.title.clone();
    Ok(view.render("post.html", Some(title.as_str()), PostPage { post }))
}

#[instrument(skip_all, fields(username = %username))]
pub async fn user_posts(
    State(state): State<AppState>,
    view: View,
    Path(username): Path<String>,
    Query(q): Query<PageQuery>,
) -> AppResult<Response> {
    let (user, posts) = services::by_author(&state.db, &username, q.number()).await?;
    let user = PublicUser::new(&user, state.storage.as_ref());
    Ok(view.render("user_posts.html", None, UserPostsPage { user, posts }))
}

pub async fn new_post_page(_user: AuthUser, view: View) -> Response {
    render_form(view, "New Post", "New Post", PostForm::default(), FormErrors::new())
}

#[instrument(skip_all)]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    view: View,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    match services::create(&state.db, current.id(), &form).await {
        Ok(_) => Ok(flash::redirect("/", Flash::success("Your post has been created!"))),
        Err(SubmitError::Invalid(errors)) => {
            warn!(errors = ?errors, "post rejected");
            Ok(render_form(view, "New Post", "New Post", form, errors))
        }
        Err(SubmitError::Internal(e)) => Err(AppError::Internal(e)),
    }
}

#[instrument(skip_all, fields(post_id = id))]
pub async fn edit_post_page(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    view: View,
    IdPath(id): IdPath,
) -> AppResult<Response> {
    let post = services::owned(&state.db, id, current.id()).await?;
    let form = PostForm {
        title: post.title,
        content: post.content,
    };
    Ok(render_form(view, "Update Post", "Update Post", form, FormErrors::new()))
}

#[instrument(skip_all, fields(post_id = id))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    view: View,
    IdPath(id): IdPath,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let post = services::owned(&state.db, id, current.id()).await?;
    match services::update(&state.db, &post, &form).await {
        Ok(()) => Ok(flash::redirect(
            &format!("/post/{}", post.id),
            Flash::success("Your post has been updated!"),
        )),
        Err(SubmitError::Invalid(errors)) => {
            warn!(errors = ?errors, post_id = id, "post update rejected");
            Ok(render_form(view, "Update Post", "Update Post", form, errors))
        }
        Err(SubmitError::Internal(e)) => Err(AppError::Internal(e)),
    }
}

#[instrument(skip_all, fields(post_id = id))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    IdPath(id): IdPath,
) -> AppResult<Response> {
    let post = services::owned(&state.db, id, current.id()).await?;
    services::delete(&state.db, &post).await?;
    Ok(flash::redirect("/", Flash::success("Your post has been deleted!")))
}
