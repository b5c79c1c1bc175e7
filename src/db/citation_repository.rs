use crate::errors::PublicationError;
use crate::models::citation::Citation;
use rusqlite::{params, Connection};

pub struct CitationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> CitationRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Citation> {
        Ok(Citation {
            id: row.get(0)?,
            owner_type: row.get(1)?,
            owner_id: row.get(2)?,
            field_name: row.get(3)?,
            citekey: row.get(4)?,
            publication_id: row.get(5)?,
        })
    }

    pub fn get_for_owner_field(
        &self,
        owner_type: &str,
        owner_id: i64,
        field_name: &str,
    ) -> Result<Vec<Citation>, PublicationError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_type, owner_id, field_name, citekey, publication_id \
             FROM citations WHERE owner_type = ?1 AND owner_id = ?2 AND field_name = ?3 \
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![owner_type, owner_id, field_name], Self::map_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(PublicationError::from)
    }

    pub fn delete_for_owner_field(
        &self,
        owner_type: &str,
        owner_id: i64,
        field_name: &str,
    ) -> Result<usize, PublicationError> {
        self.conn
            .execute(
                "DELETE FROM citations WHERE owner_type = ?1 AND owner_id = ?2 AND field_name = ?3",
                params![owner_type, owner_id, field_name],
            )
            .map_err(PublicationError::from)
    }

    pub fn insert(
        &self,
        owner_type: &str,
        owner_id: i64,
        field_name: &str,
        citekey: &str,
        publication_id: Option<i64>,
    ) -> Result<i64, PublicationError> {
        self.conn.execute(
            "INSERT INTO citations (owner_type, owner_id, field_name, citekey, publication_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![owner_type, owner_id, field_name, citekey, publication_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Clears the publication pointer on rows whose stored citekey no longer
    /// matches the publication's current key. Rows stay; only the link goes.
    pub fn detach_stale(
        &self,
        publication_id: i64,
        current_citekey: &str,
    ) -> Result<usize, PublicationError> {
        self.conn
            .execute(
                "UPDATE citations SET publication_id = NULL \
                 WHERE publication_id = ?1 AND citekey != ?2",
                params![publication_id, current_citekey],
            )
            .map_err(PublicationError::from)
    }

    /// Points rows whose stored citekey matches at the publication, covering
    /// rows created before the publication existed or before a key change.
    pub fn attach_matching(
        &self,
        publication_id: i64,
        citekey: &str,
    ) -> Result<usize, PublicationError> {
        self.conn
            .execute(
                "UPDATE citations SET publication_id = ?1 \
                 WHERE citekey = ?2 AND (publication_id IS NULL OR publication_id != ?1)",
                params![publication_id, citekey],
            )
            .map_err(PublicationError::from)
    }
}
