use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload as sent by the client. Both fields are optional here
/// so that a missing field is reported as a validation error, not a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct NoteInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A note payload that passed validation. The only way to reach the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidNote {
    title: String,
    content: String,
}

impl ValidNote {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("Title and content are required")]
pub struct ValidationError;

impl NoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }

    pub fn validate(self) -> Result<ValidNote, ValidationError> {
        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        let content = self.content.unwrap_or_default();

        if title.is_empty() || content.trim().is_empty() {
            return Err(ValidationError);
        }

        Ok(ValidNote {
            title: title.to_owned(),
            content,
        })
    }
}

impl From<ValidationError> for crate::Error {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.to_string())
    }
}

/// Wire shape of a note. Exposes the identifier under both `id` and `_id`
/// for clients written against either name.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    #[serde(rename = "_id")]
    pub _id: NoteId,
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteView {
    fn from(note: Note) -> Self {
        Self {
            _id: note.id,
            id: note.id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteNoteResponse {
    pub message: String,
}
