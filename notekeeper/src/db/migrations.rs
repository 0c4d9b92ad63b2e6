use lazy_static::lazy_static;
use rusqlite_migration::{Migrations, M};

lazy_static! {
    pub static ref MIGRATIONS: Migrations<'static> = Migrations::new(vec![M::up(
        r#"
        CREATE TABLE notes (
            id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),

            title TEXT NOT NULL CHECK(length(trim(title)) > 0),
            content TEXT NOT NULL CHECK(length(trim(content)) > 0),

            -- unix epoch milliseconds
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL CHECK(updated_at >= created_at),

            -- bumped on every write, orders notes sharing an updated_at
            seq INTEGER NOT NULL
        );

        CREATE INDEX notes_updated_at_idx ON notes (updated_at DESC, seq DESC);
        "#
    ),]);
}

