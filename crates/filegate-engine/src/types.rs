//! Request and response types exchanged with the engine

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Engine response body, forwarded without interpretation
pub type EngineResponse = Value;

/// Fields of an initiate-upload call that the gateway owns.
/// Client-supplied attributes with these names never reach the engine.
pub const RESERVED_UPLOAD_FIELDS: &[&str] = &["path", "filename", "mimeType", "createdBy"];

/// The authenticated actor a mutating operation is attributed to
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity, rejecting empty and whitespace-only values
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `POST /folders`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolder {
    /// Parent location
    pub path: String,
    /// Name of the new folder
    pub folder_name: String,
    /// Actor creating the folder
    pub created_by: Identity,
}

impl CreateFolder {
    pub fn new(path: impl Into<String>, folder_name: impl Into<String>, created_by: Identity) -> Self {
        Self {
            path: path.into(),
            folder_name: folder_name.into(),
            created_by,
        }
    }
}

/// `POST /uploads/initiate`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUpload {
    /// Target location
    pub path: String,
    /// Object name
    pub filename: String,
    /// Declared content type
    pub mime_type: String,
    /// Actor initiating the upload
    pub created_by: Identity,
    /// Engine-defined extras, passed through verbatim
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl InitiateUpload {
    /// Build an upload intent. Reserved keys are dropped from `attributes`
    /// so the typed fields always win.
    pub fn new(
        path: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        created_by: Identity,
        mut attributes: Map<String, Value>,
    ) -> Self {
        attributes.retain(|key, _| !RESERVED_UPLOAD_FIELDS.contains(&key.as_str()));
        Self {
            path: path.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            created_by,
            attributes,
        }
    }

    /// Extra attributes forwarded to the engine
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

/// `POST /uploads/complete`
///
/// Carries no identity: the engine correlates the upload by id with the
/// actor bound at initiate time.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUpload {
    /// Handle returned by initiate
    pub upload_id: String,
}

impl CompleteUpload {
    pub fn new(upload_id: impl Into<String>) -> Self {
        Self {
            upload_id: upload_id.into(),
        }
    }
}
