use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};

use crate::{db::DB, extract::Json, state::AppState, Error, Result};

use super::{handlers, DeleteNoteResponse, NoteId, NoteInput, NoteView};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/notes", get(find_notes).post(create_note))
        .route("/notes/{id}", get(get_note).put(update_note).delete(delete_note))
        .with_state(state)
}

/// Ids that are not UUIDs cannot exist in the store.
fn parse_id(id: &str) -> Result<NoteId> {
    NoteId::parse_str(id).map_err(|_| Error::NotFound("Note not found".into()))
}

async fn find_notes(State(db): State<DB>) -> Result<Json<Vec<NoteView>>> {
    let notes = handlers::find_notes(&db)
        .await
        .map_err(|e| Error::from(e).context("Error fetching notes"))?;

    Ok(Json(notes.into_iter().map(NoteView::from).collect()))
}

async fn get_note(State(db): State<DB>, Path(id): Path<String>) -> Result<Json<NoteView>> {
    let note = handlers::get_note(parse_id(&id)?, &db)
        .await
        .map_err(|e| Error::from(e).context("Error fetching note"))?;

    Ok(Json(note.into()))
}

async fn create_note(State(db): State<DB>, Json(input): Json<NoteInput>) -> Result<(StatusCode, Json<NoteView>)> {
    let note = input.validate()?;

    let note = handlers::create_note(note, &db)
        .await
        .map_err(|e| Error::from(e).context("Error creating note"))?;

    tracing::debug!(id = %note.id, "note created");
    Ok((StatusCode::CREATED, Json(note.into())))
}

async fn update_note(
    State(db): State<DB>,
    Path(id): Path<String>,
    Json(input): Json<NoteInput>,
) -> Result<Json<NoteView>> {
    let note = input.validate()?;
    let id = parse_id(&id)?;

    let note = handlers::update_note(id, note, &db)
        .await
        .map_err(|e| Error::from(e).context("Error updating note"))?;

    Ok(Json(note.into()))
}

async fn delete_note(State(db): State<DB>, Path(id): Path<String>) -> Result<Json<DeleteNoteResponse>> {
    handlers::delete_note(parse_id(&id)?, &db)
        .await
        .map_err(|e| Error::from(e).context("Error deleting note"))?;

    tracing::debug!(%id, "note deleted");
    Ok(Json(DeleteNoteResponse {
        message: "Note deleted successfully".into(),
    }))
}
