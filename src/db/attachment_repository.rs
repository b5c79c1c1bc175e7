use crate::config;
use crate::errors::PublicationError;
use crate::models::attachment::{CustomFile, CustomLink, MAX_ATTACHMENTS};
use log::{error, info};
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;

pub struct AttachmentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> AttachmentRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn links_for(&self, publication_id: i64) -> Result<Vec<CustomLink>, PublicationError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, publication_id, description, url, sort FROM custom_links \
             WHERE publication_id = ?1 ORDER BY sort, id",
        )?;
        let rows = stmt.query_map(params![publication_id], |row| {
            Ok(CustomLink {
                id: Some(row.get(0)?),
                publication_id: row.get(1)?,
                description: row.get(2)?,
                url: row.get(3)?,
                sort: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(PublicationError::from)
    }

    pub fn files_for(&self, publication_id: i64) -> Result<Vec<CustomFile>, PublicationError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, publication_id, description, file_path, sort FROM custom_files \
             WHERE publication_id = ?1 ORDER BY sort, id",
        )?;
        let rows = stmt.query_map(params![publication_id], |row| {
            Ok(CustomFile {
                id: Some(row.get(0)?),
                publication_id: row.get(1)?,
                description: row.get(2)?,
                file_path: row.get(3)?,
                sort: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(PublicationError::from)
    }

    /// Replaces the link set of one publication wholesale; the edit form
    /// always submits the full list.
    pub fn replace_links(
        &self,
        publication_id: i64,
        links: &[CustomLink],
    ) -> Result<(), PublicationError> {
        if links.len() > MAX_ATTACHMENTS {
            return Err(PublicationError::ValidationError(format!(
                "At most {} custom links are allowed per publication",
                MAX_ATTACHMENTS
            )));
        }

        self.conn.execute(
            "DELETE FROM custom_links WHERE publication_id = ?1",
            params![publication_id],
        )?;
        for (sort, link) in links.iter().enumerate() {
            self.conn.execute(
                "INSERT INTO custom_links (publication_id, description, url, sort) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![publication_id, link.description, link.url, sort as i64],
            )?;
        }
        Ok(())
    }

    pub fn add_file(
        &self,
        publication_id: i64,
        description: &str,
        file_path: &str,
    ) -> Result<i64, PublicationError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM custom_files WHERE publication_id = ?1",
            params![publication_id],
            |row| row.get(0),
        )?;
        if count as usize >= MAX_ATTACHMENTS {
            return Err(PublicationError::ValidationError(format!(
                "At most {} custom files are allowed per publication",
                MAX_ATTACHMENTS
            )));
        }

        self.conn.execute(
            "INSERT INTO custom_files (publication_id, description, file_path, sort) \
             VALUES (?1, ?2, ?3, ?4)",
            params![publication_id, description, file_path, count],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn delete_file(&self, id: i64) -> Result<(), PublicationError> {
        let file_path: String = self
            .conn
            .query_row(
                "SELECT file_path FROM custom_files WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    PublicationError::NotFound(format!("Custom file with ID {} not found", id))
                }
                _ => PublicationError::DatabaseError(e.to_string()),
            })?;

        self.conn
            .execute("DELETE FROM custom_files WHERE id = ?1", params![id])?;

        let path = Path::new(&config::upload_dir()).join(&file_path);
        match fs::remove_file(&path) {
            Ok(_) => {
                info!("Deleted attachment file: {:?}", path);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to delete attachment file {:?}: {}. DB record was deleted.",
                    path, e
                );
                Err(PublicationError::StorageError(format!(
                    "Attachment record deleted, but failed to remove file {:?}: {}",
                    path, e
                )))
            }
        }
    }
}
