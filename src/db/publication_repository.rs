use crate::errors::PublicationError;
use crate::models::publication::{NewPublication, Publication, PublicationStatus};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct PublicationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> PublicationRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // Shared SELECT list; types joined in for display and export.
    const SELECT_FIELDS: &'static str = "p.id, p.type_id, t.title, t.bibtex_types, p.citekey, \
         p.title, p.authors, p.year, p.month, p.journal, p.book_title, p.publisher, \
         p.institution, p.school, p.organization, p.location, p.country, p.volume, p.number, \
         p.chapter, p.section, p.pages, p.url, p.code, p.doi, p.isbn, p.note, p.abstract, \
         p.keywords, p.status, p.external, p.created_at";

    const FROM_JOINED: &'static str = "FROM publications p JOIN types t ON t.id = p.type_id";

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Publication> {
        let bibtex_types: String = row.get(3)?;
        let bibtex_type = bibtex_types
            .split(',')
            .next()
            .unwrap_or("misc")
            .trim()
            .to_string();

        let status_str: String = row.get(29)?;
        let created_at_str: Option<String> = row.get(31)?;
        let created_at = created_at_str.and_then(|s| {
            NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        });

        Ok(Publication {
            id: Some(row.get(0)?),
            type_id: row.get(1)?,
            type_title: row.get(2)?,
            bibtex_type,
            citekey: row.get(4)?,
            title: row.get(5)?,
            authors: row.get(6)?,
            year: row.get(7)?,
            month: row.get(8)?,
            journal: row.get(9)?,
            book_title: row.get(10)?,
            publisher: row.get(11)?,
            institution: row.get(12)?,
            school: row.get(13)?,
            organization: row.get(14)?,
            location: row.get(15)?,
            country: row.get(16)?,
            volume: row.get(17)?,
            number: row.get(18)?,
            chapter: row.get(19)?,
            section: row.get(20)?,
            pages: row.get(21)?,
            url: row.get(22)?,
            code: row.get(23)?,
            doi: row.get(24)?,
            isbn: row.get(25)?,
            note: row.get(26)?,
            abstract_text: row.get(27)?,
            keywords: row.get(28)?,
            status: PublicationStatus::from_str(&status_str).unwrap_or(PublicationStatus::Draft),
            external: row.get(30)?,
            created_at,
        })
    }

    pub fn get_by_id(&self, id: i64) -> Result<Publication, PublicationError> {
        let query = format!(
            "SELECT {} {} WHERE p.id = ?1",
            Self::SELECT_FIELDS,
            Self::FROM_JOINED
        );
        self.conn
            .query_row(&query, params![id], Self::map_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    PublicationError::NotFound(format!("Publication with ID {} not found", id))
                }
                _ => PublicationError::DatabaseError(e.to_string()),
            })
    }

    pub fn get_all(&self) -> Result<Vec<Publication>, PublicationError> {
        let query = format!(
            "SELECT {} {} ORDER BY p.year DESC, p.month DESC, p.id DESC",
            Self::SELECT_FIELDS,
            Self::FROM_JOINED
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([], Self::map_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(PublicationError::from)
    }

    /// Publications for the public listing pages: external records and hidden
    /// types are filtered out, optionally restricted to one year.
    pub fn get_visible(&self, year: Option<i64>) -> Result<Vec<Publication>, PublicationError> {
        let mut query = format!(
            "SELECT {} {} WHERE p.external = 0 AND t.hidden = 0",
            Self::SELECT_FIELDS,
            Self::FROM_JOINED
        );
        if year.is_some() {
            query.push_str(" AND p.year = ?1");
        }
        query.push_str(" ORDER BY p.year DESC, p.month DESC, p.id DESC");

        let mut stmt = self.conn.prepare(&query)?;
        let rows = match year {
            Some(y) => stmt.query_map(params![y], Self::map_row)?,
            None => stmt.query_map([], Self::map_row)?,
        };
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(PublicationError::from)
    }

    /// Candidate matches for a keyword page; callers refine against the
    /// parsed keyword list for an exact match.
    pub fn search_keyword(&self, keyword: &str) -> Result<Vec<Publication>, PublicationError> {
        let query = format!(
            "SELECT {} {} WHERE p.external = 0 AND p.keywords LIKE ?1 COLLATE NOCASE \
             ORDER BY p.year DESC, p.month DESC, p.id DESC",
            Self::SELECT_FIELDS,
            Self::FROM_JOINED
        );
        let pattern = format!("%{}%", keyword);
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params![pattern], Self::map_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(PublicationError::from)
    }

    /// Looks for a stored publication with field values identical to the
    /// candidate. The citekey, id and attachments are deliberately not part
    /// of the comparison; two imports that differ only in key are the same
    /// publication. `IS` keeps NULL volume/number comparisons exact.
    pub fn find_duplicate(
        &self,
        candidate: &NewPublication,
    ) -> Result<Option<Publication>, PublicationError> {
        let query = format!(
            "SELECT {} {} WHERE p.type_id = ?1 AND p.title = ?2 AND p.authors = ?3 \
             AND p.year = ?4 AND p.month = ?5 AND p.journal = ?6 AND p.book_title = ?7 \
             AND p.publisher = ?8 AND p.institution = ?9 AND p.school = ?10 \
             AND p.organization = ?11 AND p.location = ?12 AND p.country = ?13 \
             AND p.volume IS ?14 AND p.number IS ?15 AND p.chapter = ?16 \
             AND p.section = ?17 AND p.pages = ?18 AND p.url = ?19 AND p.code = ?20 \
             AND p.doi = ?21 AND p.isbn = ?22 AND p.note = ?23 AND p.abstract = ?24 \
             AND p.keywords = ?25 AND p.status = ?26 AND p.external = ?27",
            Self::SELECT_FIELDS,
            Self::FROM_JOINED
        );
        self.conn
            .query_row(
                &query,
                params![
                    candidate.type_id,
                    candidate.title,
                    candidate.authors,
                    candidate.year,
                    candidate.month,
                    candidate.journal,
                    candidate.book_title,
                    candidate.publisher,
                    candidate.institution,
                    candidate.school,
                    candidate.organization,
                    candidate.location,
                    candidate.country,
                    candidate.volume,
                    candidate.number,
                    candidate.chapter,
                    candidate.section,
                    candidate.pages,
                    candidate.url,
                    candidate.code,
                    candidate.doi,
                    candidate.isbn,
                    candidate.note,
                    candidate.abstract_text,
                    candidate.keywords,
                    candidate.status.as_str(),
                    candidate.external,
                ],
                Self::map_row,
            )
            .optional()
            .map_err(PublicationError::from)
    }

    pub fn insert(
        &self,
        candidate: &NewPublication,
        citekey: &str,
    ) -> Result<Publication, PublicationError> {
        let result = self.conn.execute(
            "INSERT INTO publications (type_id, citekey, title, authors, year, month, \
             journal, book_title, publisher, institution, school, organization, location, \
             country, volume, number, chapter, section, pages, url, code, doi, isbn, note, \
             abstract, keywords, status, external) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)",
            params![
                candidate.type_id,
                citekey,
                candidate.title,
                candidate.authors,
                candidate.year,
                candidate.month,
                candidate.journal,
                candidate.book_title,
                candidate.publisher,
                candidate.institution,
                candidate.school,
                candidate.organization,
                candidate.location,
                candidate.country,
                candidate.volume,
                candidate.number,
                candidate.chapter,
                candidate.section,
                candidate.pages,
                candidate.url,
                candidate.code,
                candidate.doi,
                candidate.isbn,
                candidate.note,
                candidate.abstract_text,
                candidate.keywords,
                candidate.status.as_str(),
                candidate.external,
            ],
        );

        match result {
            Ok(_) => self.get_by_id(self.conn.last_insert_rowid()),
            Err(e) => {
                if e.to_string().contains("UNIQUE constraint failed") {
                    Err(PublicationError::Conflict(
                        "A publication with the same DOI or ISBN already exists.".to_string(),
                    ))
                } else {
                    Err(PublicationError::DatabaseError(e.to_string()))
                }
            }
        }
    }

    pub fn update(&self, publication: &Publication) -> Result<(), PublicationError> {
        let id = publication.id.ok_or_else(|| {
            PublicationError::ValidationError("Cannot update publication without ID".to_string())
        })?;

        let result = self.conn.execute(
            "UPDATE publications SET type_id = ?1, citekey = ?2, title = ?3, authors = ?4, \
             year = ?5, month = ?6, journal = ?7, book_title = ?8, publisher = ?9, \
             institution = ?10, school = ?11, organization = ?12, location = ?13, \
             country = ?14, volume = ?15, number = ?16, chapter = ?17, section = ?18, \
             pages = ?19, url = ?20, code = ?21, doi = ?22, isbn = ?23, note = ?24, \
             abstract = ?25, keywords = ?26, status = ?27, external = ?28 WHERE id = ?29",
            params![
                publication.type_id,
                publication.citekey,
                publication.title,
                publication.authors,
                publication.year,
                publication.month,
                publication.journal,
                publication.book_title,
                publication.publisher,
                publication.institution,
                publication.school,
                publication.organization,
                publication.location,
                publication.country,
                publication.volume,
                publication.number,
                publication.chapter,
                publication.section,
                publication.pages,
                publication.url,
                publication.code,
                publication.doi,
                publication.isbn,
                publication.note,
                publication.abstract_text,
                publication.keywords,
                publication.status.as_str(),
                publication.external,
                id,
            ],
        );

        match result {
            Ok(0) => Err(PublicationError::NotFound(format!(
                "Publication with ID {} not found for update",
                id
            ))),
            Ok(_) => Ok(()),
            Err(e) => {
                if e.to_string().contains("UNIQUE constraint failed") {
                    Err(PublicationError::Conflict(
                        "A publication with the same DOI or ISBN already exists.".to_string(),
                    ))
                } else {
                    Err(PublicationError::DatabaseError(e.to_string()))
                }
            }
        }
    }

    pub fn set_status(
        &self,
        id: i64,
        status: PublicationStatus,
    ) -> Result<(), PublicationError> {
        let rows = self.conn.execute(
            "UPDATE publications SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if rows == 0 {
            return Err(PublicationError::NotFound(format!(
                "Publication with ID {} not found",
                id
            )));
        }
        Ok(())
    }

    pub fn find_by_citekey(&self, citekey: &str) -> Result<Option<Publication>, PublicationError> {
        let query = format!(
            "SELECT {} {} WHERE p.citekey = ?1 ORDER BY p.id LIMIT 1",
            Self::SELECT_FIELDS,
            Self::FROM_JOINED
        );
        self.conn
            .query_row(&query, params![citekey], Self::map_row)
            .optional()
            .map_err(PublicationError::from)
    }

    pub fn delete(&self, id: i64) -> Result<(), PublicationError> {
        // Derived and owned rows go first.
        self.conn.execute(
            "DELETE FROM citations WHERE owner_type = 'publication' AND owner_id = ?1",
            params![id],
        )?;
        self.conn.execute(
            "UPDATE citations SET publication_id = NULL WHERE publication_id = ?1",
            params![id],
        )?;
        self.conn
            .execute("DELETE FROM custom_links WHERE publication_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM custom_files WHERE publication_id = ?1", params![id])?;

        let rows = self
            .conn
            .execute("DELETE FROM publications WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(PublicationError::NotFound(format!(
                "Publication with ID {} not found",
                id
            )));
        }
        Ok(())
    }
}
