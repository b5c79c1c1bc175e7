use crate::db::citation_repository::CitationRepository;
use crate::db::publication_repository::PublicationRepository;
use crate::errors::PublicationError;
use regex::Regex;
use rusqlite::Connection;
use std::sync::OnceLock;

/// Pulls citekeys out of a text value.
pub type CitekeyExtractor = fn(&str) -> Vec<String>;

/// A text field whose `\cite{...}` references are tracked in the citations
/// table. Owners are addressed by a type tag plus row id so fields on other
/// tables can be registered without schema changes.
pub struct CitationField {
    pub owner_type: &'static str,
    pub field_name: &'static str,
    pub extractor: CitekeyExtractor,
}

/// The note field of a publication may cite other publications.
pub const PUBLICATION_NOTE: CitationField = CitationField {
    owner_type: "publication",
    field_name: "note",
    extractor: latex_citekey_extractor,
};

pub fn tracked_fields() -> &'static [CitationField] {
    &[PUBLICATION_NOTE]
}

fn cite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\cite\{(.*?)\}").unwrap())
}

/// Extracts the keys of every `\cite{...}` command in the text. A single
/// command may carry several comma-separated keys. Duplicate keys yield
/// duplicate citation rows, mirroring how often a work is cited.
pub fn latex_citekey_extractor(text: &str) -> Vec<String> {
    cite_re()
        .captures_iter(text)
        .flat_map(|c| {
            c[1].split(',')
                .map(|k| k.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|k| !k.is_empty())
        .collect()
}

/// Re-entrancy guard for citation maintenance. A recompute may itself save
/// the owner, which would otherwise recompute again; callers create one guard
/// per edit operation and thread it through.
#[derive(Default)]
pub struct SyncGuard {
    active: bool,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rebuilds the citation rows of one owner field from its current text:
/// deletes the old rows, extracts the keys and inserts one row per key,
/// resolving each against the stored publications. Unresolved keys keep a
/// NULL publication pointer. Returns the number of keys found.
pub fn sync_owner_field(
    conn: &Connection,
    field: &CitationField,
    owner_id: i64,
    text: &str,
    guard: &mut SyncGuard,
) -> Result<usize, PublicationError> {
    if guard.active {
        return Ok(0);
    }
    guard.active = true;

    let result = (|| {
        let citations = CitationRepository::new(conn);
        let publications = PublicationRepository::new(conn);

        citations.delete_for_owner_field(field.owner_type, owner_id, field.field_name)?;
        let keys = (field.extractor)(text);
        for key in &keys {
            let publication_id = publications.find_by_citekey(key)?.and_then(|p| p.id);
            citations.insert(field.owner_type, owner_id, field.field_name, key, publication_id)?;
        }
        Ok(keys.len())
    })();

    guard.active = false;
    result
}

/// Bulk replacement of an owner field's citation set, as triggered by an
/// editing surface that rewrites the whole field. Clears the stored rows
/// first and then recomputes from the new text, so the set ends up exactly
/// matching the text even when the clear and the recompute race with nothing
/// in between.
pub fn replace_citation_set(
    conn: &Connection,
    field: &CitationField,
    owner_id: i64,
    text: &str,
    guard: &mut SyncGuard,
) -> Result<usize, PublicationError> {
    if guard.active {
        return Ok(0);
    }
    CitationRepository::new(conn).delete_for_owner_field(
        field.owner_type,
        owner_id,
        field.field_name,
    )?;
    sync_owner_field(conn, field, owner_id, text, guard)
}

/// Repoints citation rows after a publication's citekey changed: rows that
/// referenced the old key lose their pointer, rows holding the new key gain
/// one. Also covers rows created before the publication existed.
pub fn publication_citekey_changed(
    conn: &Connection,
    publication_id: i64,
    current_citekey: &str,
) -> Result<(), PublicationError> {
    let citations = CitationRepository::new(conn);
    citations.detach_stale(publication_id, current_citekey)?;
    if !current_citekey.is_empty() {
        citations.attach_matching(publication_id, current_citekey)?;
    }
    Ok(())
}

/// Full citation maintenance after a publication insert or update: repoints
/// rows for its (possibly new) citekey, then rebuilds the rows of its own
/// tracked note field.
pub fn publication_saved(
    conn: &Connection,
    publication_id: i64,
    citekey: &str,
    note: &str,
    guard: &mut SyncGuard,
) -> Result<(), PublicationError> {
    publication_citekey_changed(conn, publication_id, citekey)?;
    sync_owner_field(conn, &PUBLICATION_NOTE, publication_id, note, guard)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{create_tables, seed_default_types};
    use crate::models::publication::NewPublication;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        seed_default_types(&conn).unwrap();
        conn
    }

    fn insert_publication(conn: &Connection, citekey: &str, note: &str) -> i64 {
        let candidate = NewPublication {
            type_id: 1,
            title: format!("Title {}", citekey),
            authors: "J. Doe".to_string(),
            year: 2020,
            note: note.to_string(),
            ..NewPublication::default()
        };
        let publication = PublicationRepository::new(conn)
            .insert(&candidate, citekey)
            .unwrap();
        let id = publication.id.unwrap();
        let mut guard = SyncGuard::new();
        publication_saved(conn, id, citekey, note, &mut guard).unwrap();
        id
    }

    #[test]
    fn extractor_finds_all_keys() {
        assert_eq!(
            latex_citekey_extractor(r"see \cite{a} and \cite{b, c}"),
            vec!["a", "b", "c"]
        );
        assert!(latex_citekey_extractor("no citations here").is_empty());
        assert!(latex_citekey_extractor(r"\cite{}").is_empty());
    }

    #[test]
    fn note_citations_resolve_against_stored_keys() {
        let conn = test_conn();
        let a = insert_publication(&conn, "keyA", "");
        let b = insert_publication(&conn, "keyB", r"builds on \cite{keyA} and \cite{missing}");

        let rows = CitationRepository::new(&conn)
            .get_for_owner_field("publication", b, "note")
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].citekey, "keyA");
        assert_eq!(rows[0].publication_id, Some(a));
        assert_eq!(rows[1].citekey, "missing");
        assert_eq!(rows[1].publication_id, None);
    }

    #[test]
    fn resave_leaves_one_row_per_citation() {
        let conn = test_conn();
        insert_publication(&conn, "keyA", "");
        let b = insert_publication(&conn, "keyB", r"\cite{keyA}");

        // editing the owner again must not duplicate the row
        let mut guard = SyncGuard::new();
        publication_saved(&conn, b, "keyB", r"\cite{keyA}", &mut guard).unwrap();

        let rows = CitationRepository::new(&conn)
            .get_for_owner_field("publication", b, "note")
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn late_publication_attaches_to_waiting_rows() {
        let conn = test_conn();
        let a = insert_publication(&conn, "keyA", r"\cite{future}");

        let rows = CitationRepository::new(&conn)
            .get_for_owner_field("publication", a, "note")
            .unwrap();
        assert_eq!(rows[0].publication_id, None);

        // now the cited publication appears
        let f = insert_publication(&conn, "future", "");
        let rows = CitationRepository::new(&conn)
            .get_for_owner_field("publication", a, "note")
            .unwrap();
        assert_eq!(rows[0].publication_id, Some(f));
    }

    #[test]
    fn citekey_change_detaches_and_reattaches() {
        let conn = test_conn();
        let a = insert_publication(&conn, "keyA", "");
        let b = insert_publication(&conn, "keyB", r"\cite{keyA} \cite{keyC}");

        // keyA renamed to keyC
        publication_citekey_changed(&conn, a, "keyC").unwrap();

        let rows = CitationRepository::new(&conn)
            .get_for_owner_field("publication", b, "note")
            .unwrap();
        let for_key = |k: &str| rows.iter().find(|r| r.citekey == k).unwrap();
        assert_eq!(for_key("keyA").publication_id, None);
        assert_eq!(for_key("keyC").publication_id, Some(a));
    }

    #[test]
    fn guard_suppresses_reentrant_sync() {
        let conn = test_conn();
        let a = insert_publication(&conn, "keyA", "");
        let mut guard = SyncGuard::new();
        guard.active = true;
        let n = sync_owner_field(&conn, &PUBLICATION_NOTE, a, r"\cite{x}", &mut guard).unwrap();
        assert_eq!(n, 0);
        let rows = CitationRepository::new(&conn)
            .get_for_owner_field("publication", a, "note")
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn registry_tracks_the_note_field() {
        let fields = tracked_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].owner_type, "publication");
        assert_eq!(fields[0].field_name, "note");
    }
}
