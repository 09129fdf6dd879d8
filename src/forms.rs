//! Field-level validation for submitted forms.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Errors keyed by field name, in the order they were found.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Outcome of a rejected form submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("form has invalid fields")]
    Invalid(FormErrors),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<FormErrors> for SubmitError {
    fn from(errors: FormErrors) -> Self {
        SubmitError::Invalid(errors)
    }
}

impl From<sqlx::Error> for SubmitError {
    fn from(e: sqlx::Error) -> Self {
        SubmitError::Internal(e.into())
    }
}

pub fn required(errors: &mut FormErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
        return false;
    }
    true
}

/// Length bounds in characters, inclusive.
pub fn length(errors: &mut FormErrors, field: &'static str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.add(
            field,
            format!("Field must be between {} and {} characters long.", min, max),
        );
    }
}

pub fn max_length(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Field cannot be longer than {} characters.", max));
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn email(errors: &mut FormErrors, field: &'static str, value: &str) {
    if !is_valid_email(value) {
        errors.add(field, "Invalid email address.");
    }
}

pub fn equal_to(
    errors: &mut FormErrors,
    field: &'static str,
    value: &str,
    other_field: &str,
    other: &str,
) {
    if value != other {
        errors.add(field, format!("Field must be equal to {}.", other_field));
    }
}

/// Extension of `filename`, lowercased, if it is in `allowed`.
pub fn allowed_extension(filename: &str, allowed: &[&str]) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    allowed.contains(&ext.as_str()).then_some(ext)
}

pub fn file_allowed(errors: &mut FormErrors, field: &'static str, filename: &str, allowed: &[&str]) {
    if allowed_extension(filename, allowed).is_none() {
        errors.add(
            field,
            format!("File does not have an approved extension: {}", allowed.join(", ")),
        );
    }
}
