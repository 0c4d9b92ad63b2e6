mod migrations;

use rusqlite::functions::FunctionFlags;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use migrations::MIGRATIONS;

pub use rusqlite;
pub use tokio_rusqlite;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not_found")]
    NotFound(String),
    #[error(transparent)]
    TokioRusqlite(tokio_rusqlite::Error),
    #[error(transparent)]
    Rusqlite(rusqlite::Error),
    #[error(transparent)]
    Migration(#[from] rusqlite_migration::Error),
}

impl Error {
    /// Message of the underlying store error, without wrapper names.
    pub fn detail(&self) -> String {
        match self {
            Self::TokioRusqlite(tokio_rusqlite::Error::Rusqlite(error)) | Self::Rusqlite(error) => error.to_string(),
            error => error.to_string(),
        }
    }

    pub fn not_found_message(self, message: impl Into<String>) -> Self {
        if matches!(self, Self::NotFound(_)) {
            return Self::NotFound(message.into());
        }
        self
    }
}

impl From<tokio_rusqlite::Error> for Error {
    fn from(error: tokio_rusqlite::Error) -> Self {
        match error {
            tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows) => Self::NotFound("Not found".into()),
            tokio_rusqlite::Error::Other(err) if err.is::<rusqlite_migration::Error>() => match err.downcast() {
                Ok(err) => Self::Migration(*err),
                Err(err) => Self::TokioRusqlite(tokio_rusqlite::Error::Other(err)),
            },
            error => Self::TokioRusqlite(error),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound("Not found".into()),
            error => Self::Rusqlite(error),
        }
    }
}

pub type DB = Connection;

/// Opens the store at `database_url` and brings the schema up to date.
///
/// Any failure here is fatal for the process.
pub async fn init_db(database_url: &str) -> Result<DB> {
    let conn = tokio_rusqlite::Connection::open(database_url).await?;

    conn.call(|conn| {
        add_uuid_functions(conn)?;

        MIGRATIONS
            .to_latest(conn)
            .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(())
    })
    .await?;

    Ok(conn)
}

#[cfg(test)]
pub async fn init_test_db() -> Result<DB> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;

    conn.call(|conn| {
        add_uuid_functions(conn)?;

        MIGRATIONS
            .to_latest(conn)
            .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        Ok(())
    })
    .await?;

    Ok(conn)
}

fn add_uuid_functions(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function("uuid7_now", 0, FunctionFlags::SQLITE_UTF8, |_| Ok(Uuid::now_v7()))?;

    Ok(())
}
