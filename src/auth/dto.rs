use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{auth::repo_types::User, forms::FormErrors, storage::StorageClient};

pub const PROFILE_PICS: &str = "profile_pics";

/// Form body for registration.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Form body for login. HTML checkboxes are absent when unticked.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        matches!(
            self.remember.as_deref(),
            Some("y" | "on" | "true" | "1" | "yes")
        )
    }
}

/// Picture part of the account form.
#[derive(Debug, Clone)]
pub struct UploadedPicture {
    pub filename: String,
    pub body: Bytes,
}

/// Multipart account update form.
#[derive(Debug, Default)]
pub struct AccountForm {
    pub username: String,
    pub email: String,
    pub picture: Option<UploadedPicture>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Public part of the user shown on pages.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_file: String,
    pub image_url: String,
}

impl PublicUser {
    pub fn new(user: &User, storage: &dyn StorageClient) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            image_file: user.image_file.clone(),
            image_url: storage.public_url(&format!("{}/{}", PROFILE_PICS, user.image_file)),
        }
    }
}

/// Field values echoed back into a re-rendered form. Passwords never are.
#[derive(Debug, Default, Serialize)]
pub struct RegisterFields {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterPage {
    pub form: RegisterFields,
    pub errors: FormErrors,
}

#[derive(Debug, Default, Serialize)]
pub struct LoginFields {
    pub email: String,
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub form: LoginFields,
    pub errors: FormErrors,
    pub next: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct AccountFields {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AccountPage {
    pub form: AccountFields,
    pub errors: FormErrors,
    pub image_file: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;

    #[test]
    fn remember_checkbox_values() {
        let mut form = LoginForm::default();
        assert!(!form.remember());
        form.remember = Some("y".into());
        assert!(form.remember());
        form.remember = Some("off".into());
        assert!(!form.remember());
    }

    #[test]
    fn public_user_hides_password_and_links_avatar() {
        let user = User {
            id: 7,
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "$argon2id$secret".into(),
            image_file: "default.jpg".into(),
        };
        let public = PublicUser::new(&user, &LocalStorage::new("static"));
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("argon2"));
        assert_eq!(public.image_url, "/static/profile_pics/default.jpg");
    }
}
