use crate::bibtex::{mapper, parser};
use crate::citations::{self, SyncGuard};
use crate::db::publication_repository::PublicationRepository;
use crate::db::type_repository::TypeRepository;
use crate::errors::PublicationError;
use crate::models::publication::Publication;
use log::{debug, info};
use rusqlite::Connection;

/// Imports a whole BibTeX document. Every entry is handled on its own: a bad
/// entry contributes an error string while the others import normally. An
/// entry whose mapped fields exactly match a stored publication is skipped
/// and the stored record returned in its place, so re-importing a
/// bibliography never creates duplicates.
///
/// Callers decide the transaction scope; both the upload form and the CLI
/// wrap one call in a single transaction so a crash cannot leave half a
/// document behind.
pub fn import_bibtex(
    conn: &Connection,
    raw: &str,
) -> Result<(Vec<Publication>, Vec<String>), PublicationError> {
    let (entries, mut errors) = parser::parse_document(raw);
    debug!(
        "Parsed {} BibTeX entries ({} parse errors)",
        entries.len(),
        errors.len()
    );

    let types = TypeRepository::new(conn).get_all()?;
    let publications = PublicationRepository::new(conn);
    let mut imported = Vec::new();

    for entry in &entries {
        let candidate = match mapper::map_entry(entry, &types) {
            Ok(candidate) => candidate,
            Err(message) => {
                errors.push(message);
                continue;
            }
        };

        if let Some(existing) = publications.find_duplicate(&candidate)? {
            info!(
                "Entry \"{}\" matches stored publication {}, skipping",
                entry.display_key(),
                existing.id_string()
            );
            imported.push(existing);
            continue;
        }

        match publications.insert(&candidate, &entry.citekey) {
            Ok(publication) => {
                if let Some(id) = publication.id {
                    let mut guard = SyncGuard::new();
                    citations::publication_saved(
                        conn,
                        id,
                        &publication.citekey,
                        &publication.note,
                        &mut guard,
                    )?;
                }
                imported.push(publication);
            }
            Err(e) => {
                errors.push(format!(
                    "An error occurred saving publication \"{}\": {}",
                    entry.display_key(),
                    e
                ));
            }
        }
    }

    Ok((imported, errors))
}
