//! Request validators
//!
//! Pure functions from raw request input to typed values. They never touch
//! the engine or the caller's identity, so a rejected request costs no
//! network call.

use filegate_engine::RESERVED_UPLOAD_FIELDS;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Input rejected before reaching the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field `{field}`: {problem}")]
pub struct ValidationError {
    /// Wire name of the offending field, or `body` for the whole payload
    pub field: &'static str,
    pub problem: Problem,
}

/// What was wrong with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Missing,
    Empty,
    NotAString,
    NotAnObject,
    Malformed,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Missing => "field is required",
            Self::Empty => "must not be empty",
            Self::NotAString => "must be a string",
            Self::NotAnObject => "must be a JSON object",
            Self::Malformed => "malformed JSON payload",
        };
        f.write_str(text)
    }
}

impl ValidationError {
    pub fn new(field: &'static str, problem: Problem) -> Self {
        Self { field, problem }
    }

    /// The request body could not be parsed as JSON
    pub fn malformed_body() -> Self {
        Self::new("body", Problem::Malformed)
    }
}

/// Validated `POST /folders` input
#[derive(Debug, Clone, PartialEq)]
pub struct FolderSpec {
    pub path: String,
    pub folder_name: String,
}

/// Validated `POST /uploads/initiate` input
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSpec {
    pub path: String,
    pub filename: String,
    pub mime_type: String,
    /// Remaining client attributes, reserved names removed
    pub attributes: Map<String, Value>,
}

/// Validated `POST /login` input
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSpec {
    pub email: String,
    pub password: String,
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object()
        .ok_or_else(|| ValidationError::new("body", Problem::NotAnObject))
}

fn required_string(fields: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(field, Problem::Missing)),
        Some(Value::String(s)) => non_empty(s, field),
        Some(_) => Err(ValidationError::new(field, Problem::NotAString)),
    }
}

fn non_empty(value: &str, field: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, Problem::Empty))
    } else {
        Ok(value.to_string())
    }
}

/// CreateFolder: `path` and `folderName`. Anything else in the body,
/// including a client-sent `createdBy`, is ignored.
pub fn folder(body: &Value) -> Result<FolderSpec, ValidationError> {
    let fields = as_object(body)?;
    Ok(FolderSpec {
        path: required_string(fields, "path")?,
        folder_name: required_string(fields, "folderName")?,
    })
}

/// InitiateUpload: `path`, `filename`, `mimeType`, checked in that order.
/// Presence only; content checks belong to the engine.
pub fn upload_intent(body: &Value) -> Result<UploadSpec, ValidationError> {
    let fields = as_object(body)?;

    let path = required_string(fields, "path")?;
    let filename = required_string(fields, "filename")?;
    let mime_type = required_string(fields, "mimeType")?;

    let attributes = fields
        .iter()
        .filter(|(key, _)| !RESERVED_UPLOAD_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(UploadSpec {
        path,
        filename,
        mime_type,
        attributes,
    })
}

/// CompleteUpload: `uploadId`
pub fn upload_id(body: &Value) -> Result<String, ValidationError> {
    required_string(as_object(body)?, "uploadId")
}

/// GetTask: the `{id}` route segment
pub fn task_id(raw: &str) -> Result<String, ValidationError> {
    non_empty(raw, "id")
}

/// Login: `email` and `password`
pub fn login(body: &Value) -> Result<LoginSpec, ValidationError> {
    let fields = as_object(body)?;
    Ok(LoginSpec {
        email: required_string(fields, "email")?,
        password: required_string(fields, "password")?,
    })
}
