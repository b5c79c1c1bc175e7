use crate::errors::PublicationError;
use crate::models::publication_type::PublicationType;
use rusqlite::{params, Connection};

/// Standard publication types installed when the types table is empty, so
/// imports and the admin form work out of the box.
const DEFAULT_TYPES: [(&str, &str); 7] = [
    ("Journal articles", "article"),
    ("Books", "book"),
    ("Conference papers", "inproceedings, conference"),
    ("Book chapters", "incollection, inbook"),
    ("Technical reports", "techreport"),
    ("Theses", "phdthesis, mastersthesis"),
    ("Miscellaneous", "misc, unpublished"),
];

pub fn seed_default_types(conn: &Connection) -> Result<(), rusqlite::Error> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM types", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }
    for (title, bibtex_types) in DEFAULT_TYPES {
        conn.execute(
            "INSERT INTO types (title, bibtex_types, hidden) VALUES (?1, ?2, 0)",
            params![title, bibtex_types],
        )?;
    }
    Ok(())
}

pub struct TypeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TypeRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PublicationType> {
        Ok(PublicationType {
            id: row.get(0)?,
            title: row.get(1)?,
            bibtex_types: row.get(2)?,
            hidden: row.get(3)?,
        })
    }

    pub fn get_all(&self) -> Result<Vec<PublicationType>, PublicationError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, bibtex_types, hidden FROM types ORDER BY id")?;
        let types = stmt.query_map([], Self::map_row)?;
        types
            .collect::<Result<Vec<_>, _>>()
            .map_err(PublicationError::from)
    }
}
