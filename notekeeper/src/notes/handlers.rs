use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Row};

use crate::db::{self, DB};

use super::{Note, NoteId, ValidNote};

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";
const NEXT_SEQ: &str = "(SELECT coalesce(max(seq), 0) + 1 FROM notes)";

impl<'a> TryFrom<&Row<'a>> for Note {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at: from_millis(3, row.get(3)?)?,
            updated_at: from_millis(4, row.get(4)?)?,
        })
    }
}

fn from_millis(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, format!("timestamp out of range: {millis}").into())
    })
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub async fn find_notes(db: &DB) -> db::Result<Vec<Note>> {
    db.call(move |conn| {
        let notes = conn
            .prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY updated_at DESC, seq DESC"))?
            .query_map([], |row| Note::try_from(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    })
    .await
    .map_err(db::Error::from)
}

pub async fn create_note(note: ValidNote, db: &DB) -> db::Result<Note> {
    db.call(move |conn| {
        let now = now_millis();
        conn.query_row(
            &format!(
                "INSERT INTO notes (title, content, created_at, updated_at, seq)
                VALUES (?1, ?2, ?3, ?3, {NEXT_SEQ})
                RETURNING {NOTE_COLUMNS}"
            ),
            params![note.title(), note.content(), now],
            |row| Note::try_from(row),
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
}

pub async fn get_note(note_id: NoteId, db: &DB) -> db::Result<Note> {
    db.call(move |conn| {
        let note = conn.query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"),
            params![note_id],
            |row| Note::try_from(row),
        )?;
        Ok(note)
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| e.not_found_message("Note not found"))
}

/// Replaces title and content. `updated_at` always moves forward by at least
/// one millisecond, even when two updates land within the same clock tick.
pub async fn update_note(note_id: NoteId, note: ValidNote, db: &DB) -> db::Result<Note> {
    db.call(move |conn| {
        conn.query_row(
            &format!(
                "UPDATE notes SET title = ?1, content = ?2, updated_at = max(?3, updated_at + 1), seq = {NEXT_SEQ}
                WHERE id = ?4
                RETURNING {NOTE_COLUMNS}"
            ),
            params![note.title(), note.content(), now_millis(), note_id],
            |row| Note::try_from(row),
        )
        .map_err(|e| e.into())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| e.not_found_message("Note not found"))
}

pub async fn delete_note(note_id: NoteId, db: &DB) -> db::Result<()> {
    db.call(move |conn| {
        let deleted = conn.execute("DELETE FROM notes WHERE id = ?", params![note_id])?;
        if deleted == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        Ok(())
    })
    .await
    .map_err(db::Error::from)
    .map_err(|e| e.not_found_message("Note not found"))
}

pub async fn ping(db: &DB) -> db::Result<()> {
    db.call(|conn| {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    })
    .await
    .map_err(db::Error::from)
}
