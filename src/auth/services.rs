use anyhow::Context;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{AccountForm, RegisterForm},
        password::{hash_password, verify_against_dummy, verify_password},
        repo,
        repo_types::{User, DEFAULT_IMAGE_FILE},
    },
    forms::{self, FormErrors, SubmitError},
    images::services::{delete_picture, save_picture, UnreadableImage},
    state::AppState,
};

pub const USERNAME_TAKEN: &str = "That username is taken. Please choose a different one.";
pub const EMAIL_TAKEN: &str = "That email is taken. Please choose a different one.";
pub const PICTURE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const PICTURE_UNREADABLE: &str = "The uploaded file could not be read as an image.";

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_username_and_email(errors: &mut FormErrors, username: &str, email: &str) {
    if forms::required(errors, "username", username) {
        forms::length(errors, "username", username, 2, 20);
    }
    if forms::required(errors, "email", email) {
        forms::email(errors, "email", email);
    }
}

/// Structural checks only; uniqueness needs the store.
pub fn validate_registration(form: &RegisterForm) -> FormErrors {
    let mut errors = FormErrors::new();
    check_username_and_email(&mut errors, form.username.trim(), &normalize_email(&form.email));
    forms::required(&mut errors, "password", &form.password);
    if forms::required(&mut errors, "confirm_password", &form.confirm_password) {
        forms::equal_to(
            &mut errors,
            "confirm_password",
            &form.confirm_password,
            "password",
            &form.password,
        );
    }
    errors
}

/// Field a unique-constraint failure on `users` belongs to.
fn unique_violation_field(err: &sqlx::Error) -> Option<&'static str> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    let message = db_err.message();
    if message.contains("users.email") {
        Some("email")
    } else if message.contains("users.username") {
        Some("username")
    } else {
        None
    }
}

fn taken_message(field: &str) -> &'static str {
    if field == "email" {
        EMAIL_TAKEN
    } else {
        USERNAME_TAKEN
    }
}

pub async fn register(db: &SqlitePool, form: &RegisterForm) -> Result<User, SubmitError> {
    let username = form.username.trim();
    let email = normalize_email(&form.email);

    let mut errors = validate_registration(form);
    if !errors.has("username") && repo::find_by_username(db, username).await?.is_some() {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.has("email") && repo::find_by_email(db, &email).await?.is_some() {
        errors.add("email", EMAIL_TAKEN);
    }
    errors.into_result()?;

    let hash = hash_password(&form.password)?;
    let user = match repo::create(db, username, &email, &hash).await {
        Ok(u) => u,
        Err(e) => {
            // lost a race against a concurrent registration
            if let Some(field) = unique_violation_field(&e) {
                let mut errors = FormErrors::new();
                errors.add(field, taken_message(field));
                return Err(errors.into());
            }
            return Err(anyhow::Error::new(e).context("create user").into());
        }
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// The user whose password matches, or `None` without saying which part was wrong.
pub async fn authenticate(
    db: &SqlitePool,
    email: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let email = normalize_email(email);
    let Some(user) = repo::find_by_email(db, &email)
        .await
        .context("find_by_email")?
    else {
        verify_against_dummy(password);
        warn!(email = %email, "login unknown email");
        return Ok(None);
    };

    if !verify_password(password, &user.password)? {
        warn!(user_id = user.id, "login invalid password");
        return Ok(None);
    }
    Ok(Some(user))
}

pub async fn update_account(
    state: &AppState,
    current: &User,
    form: &AccountForm,
) -> Result<User, SubmitError> {
    let username = form.username.trim();
    let email = normalize_email(&form.email);

    let mut errors = FormErrors::new();
    check_username_and_email(&mut errors, username, &email);
    if let Some(picture) = &form.picture {
        forms::file_allowed(&mut errors, "picture", &picture.filename, PICTURE_EXTENSIONS);
    }
    if !errors.has("username")
        && username != current.username
        && repo::find_by_username(&state.db, username).await?.is_some()
    {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.has("email")
        && email != current.email
        && repo::find_by_email(&state.db, &email).await?.is_some()
    {
        errors.add("email", EMAIL_TAKEN);
    }
    errors.into_result()?;

    let new_picture = match &form.picture {
        Some(p) => match save_picture(state.storage.as_ref(), &p.filename, p.body.clone()).await {
            Ok(name) => Some(name),
            Err(e) if e.downcast_ref::<UnreadableImage>().is_some() => {
                warn!(error = %e, user_id = current.id, "picture rejected");
                let mut errors = FormErrors::new();
                errors.add("picture", PICTURE_UNREADABLE);
                return Err(errors.into());
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };
    let image_file = new_picture.as_deref().unwrap_or(&current.image_file);

    let updated = match repo::update_profile(&state.db, current.id, username, &email, image_file).await
    {
        Ok(u) => u,
        Err(e) => {
            if let Some(name) = &new_picture {
                discard_picture(state, name).await;
            }
            if let Some(field) = unique_violation_field(&e) {
                let mut errors = FormErrors::new();
                errors.add(field, taken_message(field));
                return Err(errors.into());
            }
            return Err(anyhow::Error::new(e).context("update user").into());
        }
    };

    if new_picture.is_some() && current.image_file != DEFAULT_IMAGE_FILE {
        discard_picture(state, &current.image_file).await;
    }

    info!(user_id = updated.id, "account updated");
    Ok(updated)
}

async fn discard_picture(state: &AppState, filename: &str) {
    if let Err(e) = delete_picture(state.storage.as_ref(), filename).await {
        warn!(error = %e, %filename, "failed to remove profile picture");
    }
}
