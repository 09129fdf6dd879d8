use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AccountFields, AccountForm, AccountPage, LoginFields, LoginForm, LoginPage,
            NextQuery, RegisterFields, RegisterForm, RegisterPage, UploadedPicture,
        },
        extractors::{safe_next, AuthUser, MaybeUser},
        services, session,
    },
    cookies,
    error::{AppError, AppResult},
    flash::{self, Flash},
    forms::{self, FormErrors, SubmitError},
    state::AppState,
    view::View,
};

const LOGIN_FAILED: &str = "Login Unsuccessful. Please check email and password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

pub fn account_routes() -> Router<AppState> {
    Router::new().route(
        "/account",
        get(account_page)
            .post(update_account)
            .layer(DefaultBodyLimit::max(8 * 1024 * 1024)),
    )
}

fn render_register(view: View, form: &RegisterForm, errors: FormErrors) -> Response {
    view.render(
        "register.html",
        Some("Register"),
        RegisterPage {
            form: RegisterFields {
                username: form.username.clone(),
                email: form.email.clone(),
            },
            errors,
        },
    )
}

fn render_login(view: View, form: &LoginForm, errors: FormErrors, next: Option<String>) -> Response {
    view.render(
        "login.html",
        Some("Login"),
        LoginPage {
            form: LoginFields {
                email: form.email.clone(),
                remember: form.remember(),
            },
            errors,
            next,
        },
    )
}

#[instrument(skip_all)]
pub async fn register_page(view: View) -> Response {
    if view.user().is_some() {
        return Redirect::to("/").into_response();
    }
    render_register(view, &RegisterForm::default(), FormErrors::new())
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if view.user().is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    match services::register(&state.db, &form).await {
        Ok(_) => Ok(flash::redirect(
            "/login",
            Flash::success("Your account has been created! You are now able to log in"),
        )),
        Err(SubmitError::Invalid(errors)) => {
            warn!(errors = ?errors, "registration rejected");
            Ok(render_register(view, &form, errors))
        }
        Err(SubmitError::Internal(e)) => Err(AppError::Internal(e)),
    }
}

#[instrument(skip_all)]
pub async fn login_page(view: View, Query(q): Query<NextQuery>) -> Response {
    if view.user().is_some() {
        return Redirect::to("/").into_response();
    }
    render_login(view, &LoginForm::default(), FormErrors::new(), q.next)
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    mut view: View,
    Query(q): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if view.user().is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut errors = FormErrors::new();
    if forms::required(&mut errors, "email", &form.email) {
        forms::email(&mut errors, "email", form.email.trim());
    }
    forms::required(&mut errors, "password", &form.password);
    if !errors.is_empty() {
        return Ok(render_login(view, &form, errors, q.next));
    }

    let Some(user) = services::authenticate(&state.db, &form.email, &form.password).await? else {
        view.flash(Flash::danger(LOGIN_FAILED));
        return Ok(render_login(view, &form, FormErrors::new(), q.next));
    };

    let cookie = session::start(&state, user.id, form.remember()).await?;
    info!(user_id = user.id, "user logged in");

    let target = safe_next(q.next.as_deref()).unwrap_or("/");
    let mut res = Redirect::to(target).into_response();
    cookies::append(&mut res, &cookie)?;
    Ok(res)
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
) -> AppResult<Response> {
    if let Some(current) = current {
        session::end(&state, &current.token).await?;
        info!(user_id = current.id(), "user logged out");
    }
    let mut res = Redirect::to("/").into_response();
    cookies::append(&mut res, &cookies::expire(session::COOKIE))?;
    Ok(res)
}

fn render_account(view: View, fields: AccountFields, errors: FormErrors) -> Response {
    let image_file = view
        .user()
        .map(|u| u.image_url.clone())
        .unwrap_or_default();
    view.render(
        "account.html",
        Some("Account"),
        AccountPage {
            form: fields,
            errors,
            image_file,
        },
    )
}

#[instrument(skip_all)]
pub async fn account_page(AuthUser(current): AuthUser, view: View) -> Response {
    let fields = AccountFields {
        username: current.user.username.clone(),
        email: current.user.email.clone(),
    };
    render_account(view, fields, FormErrors::new())
}

async fn read_account_form(mut mp: Multipart) -> AppResult<AccountForm> {
    let mut form = AccountForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("username") => {
                form.username = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?
            }
            Some("email") => {
                form.email = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?
            }
            Some("picture") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let body: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // an empty file input still submits a part
                if !filename.is_empty() && !body.is_empty() {
                    form.picture = Some(UploadedPicture { filename, body });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

#[instrument(skip_all)]
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    view: View,
    mp: Multipart,
) -> AppResult<Response> {
    let form = read_account_form(mp).await?;

    match services::update_account(&state, &current.user, &form).await {
        Ok(_) => Ok(flash::redirect(
            "/account",
            Flash::success("Your account has been updated!"),
        )),
        Err(SubmitError::Invalid(errors)) => {
            warn!(errors = ?errors, "account update rejected");
            let fields = AccountFields {
                username: form.username,
                email: form.email,
            };
            Ok(render_account(view, fields, errors))
        }
        Err(SubmitError::Internal(e)) => Err(AppError::Internal(e)),
    }
}
