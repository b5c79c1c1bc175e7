use rusqlite::Connection;

use crate::config;
use crate::db::type_repository;

pub use crate::db::type_repository::seed_default_types;

pub fn init_db() -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(config::database_path())?;
    create_tables(&conn)?;
    type_repository::seed_default_types(&conn)?;
    Ok(conn)
}

pub fn create_tables(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS types (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            title        TEXT NOT NULL,
            bibtex_types TEXT NOT NULL,
            hidden       INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS publications (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            type_id       INTEGER NOT NULL REFERENCES types(id),
            citekey       TEXT NOT NULL DEFAULT '',
            title         TEXT NOT NULL,
            authors       TEXT NOT NULL,
            year          INTEGER NOT NULL,
            month         INTEGER NOT NULL DEFAULT 0,
            journal       TEXT NOT NULL DEFAULT '',
            book_title    TEXT NOT NULL DEFAULT '',
            publisher     TEXT NOT NULL DEFAULT '',
            institution   TEXT NOT NULL DEFAULT '',
            school        TEXT NOT NULL DEFAULT '',
            organization  TEXT NOT NULL DEFAULT '',
            location      TEXT NOT NULL DEFAULT '',
            country       TEXT NOT NULL DEFAULT '',
            volume        INTEGER,
            number        INTEGER,
            chapter       TEXT NOT NULL DEFAULT '',
            section       TEXT NOT NULL DEFAULT '',
            pages         TEXT NOT NULL DEFAULT '',
            url           TEXT NOT NULL DEFAULT '',
            code          TEXT NOT NULL DEFAULT '',
            doi           TEXT NOT NULL DEFAULT '',
            isbn          TEXT NOT NULL DEFAULT '',
            note          TEXT NOT NULL DEFAULT '',
            abstract      TEXT NOT NULL DEFAULT '',
            keywords      TEXT NOT NULL DEFAULT '',
            status        TEXT NOT NULL DEFAULT 'draft',
            external      INTEGER NOT NULL DEFAULT 0,
            created_at    DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Empty identifiers are common, so uniqueness only applies to real values.
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_publications_doi
         ON publications(doi) WHERE doi != ''",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_publications_isbn
         ON publications(isbn) WHERE isbn != ''",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS citations (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_type     TEXT NOT NULL,
            owner_id       INTEGER NOT NULL,
            field_name     TEXT NOT NULL,
            citekey        TEXT NOT NULL,
            publication_id INTEGER REFERENCES publications(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_citations_owner
         ON citations(owner_type, owner_id, field_name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS custom_links (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            publication_id INTEGER NOT NULL REFERENCES publications(id),
            description    TEXT NOT NULL,
            url            TEXT NOT NULL,
            sort           INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS custom_files (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            publication_id INTEGER NOT NULL REFERENCES publications(id),
            description    TEXT NOT NULL,
            file_path      TEXT NOT NULL,
            sort           INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admins (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at    DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}
