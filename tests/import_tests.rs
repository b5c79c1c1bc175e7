use publications_site::bibtex::import::import_bibtex;
use publications_site::bibtex::latex;
use publications_site::db::citation_repository::CitationRepository;
use publications_site::db::publication_repository::PublicationRepository;
use publications_site::db::schema::{create_tables, seed_default_types};
use publications_site::models::publication::PublicationStatus;
use rusqlite::Connection;

fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();
    seed_default_types(&conn).unwrap();
    conn
}

#[test]
fn minimal_article_imports_with_expected_fields() {
    let conn = test_conn();
    let doc = r#"@article{key1,
        title = {T},
        author = {Doe, J.},
        year = {2020},
    }"#;
    let (imported, errors) = import_bibtex(&conn, doc).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(imported.len(), 1);

    let p = &imported[0];
    assert_eq!(p.citekey, "key1");
    assert_eq!(p.title, "T");
    assert_eq!(p.authors, "J. Doe");
    assert_eq!(p.year, 2020);
    assert_eq!(p.month, 0);
    assert_eq!(p.status, PublicationStatus::Draft);
}

#[test]
fn well_formed_document_imports_every_entry() {
    let conn = test_conn();
    let doc = r#"
@article{a1, title = {One}, author = {A}, year = {2020}}
@book{b1, title = {Two}, author = {B}, year = {2019}}
@inproceedings{c1, title = {Three}, author = {C}, year = {2018}}
@techreport{t1, title = {Four}, author = {D}, year = {2017}}
@misc{m1, title = {Five}, author = {E}, year = {2016}}
"#;
    let (imported, errors) = import_bibtex(&conn, doc).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(imported.len(), 5);
}

#[test]
fn importing_twice_creates_no_duplicates() {
    let conn = test_conn();
    let doc = r#"@article{key1, title = {T}, author = {Doe, J.}, year = {2020}}"#;

    let (first, _) = import_bibtex(&conn, doc).unwrap();
    let (second, _) = import_bibtex(&conn, doc).unwrap();
    assert_eq!(first[0].id, second[0].id);
    assert_eq!(PublicationRepository::new(&conn).get_all().unwrap().len(), 1);
}

#[test]
fn same_fields_under_new_citekey_still_deduplicate() {
    let conn = test_conn();
    let (_, errors) = import_bibtex(
        &conn,
        r#"@article{oldkey, title = {T}, author = {Doe, J.}, year = {2020}}"#,
    )
    .unwrap();
    assert!(errors.is_empty());

    let (imported, errors) = import_bibtex(
        &conn,
        r#"@article{newkey, title = {T}, author = {Doe, J.}, year = {2020}}"#,
    )
    .unwrap();
    assert!(errors.is_empty());
    // the stored record keeps its original citekey
    assert_eq!(imported[0].citekey, "oldkey");
    assert_eq!(PublicationRepository::new(&conn).get_all().unwrap().len(), 1);
}

#[test]
fn entry_errors_are_reported_without_blocking_others() {
    let conn = test_conn();
    let doc = r#"
@article{good, title = {G}, author = {A}, year = {2020}}
@article{noyear, title = {N}, author = {A}}
@widget{badtype, title = {W}, author = {A}, year = {2020}}
"#;
    let (imported, errors) = import_bibtex(&conn, doc).unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].citekey, "good");
    assert!(errors.contains(
        &"BibTeX entry \"noyear\" is missing following mandatory keys: year".to_string()
    ));
    assert!(errors.contains(&"Type \"widget\" unknown.".to_string()));
}

#[test]
fn latex_accents_are_decoded_on_import() {
    let conn = test_conn();
    let doc = r#"@article{umlaut,
        title = {K\"onig's theorem},
        author = {K\"onig, D\'enes},
        year = {1931},
    }"#;
    let (imported, errors) = import_bibtex(&conn, doc).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
    assert!(imported[0].title.contains("König"), "{}", imported[0].title);
    assert!(imported[0].authors.contains("Dénes König"), "{}", imported[0].authors);
}

#[test]
fn doi_in_volume_is_relocated_and_volume_cleared() {
    let conn = test_conn();
    let doc = r#"@article{v1,
        title = {T},
        author = {A},
        year = {2020},
        volume = {10.1000/abc},
    }"#;
    let (imported, errors) = import_bibtex(&conn, doc).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(imported[0].volume, None);
    assert_eq!(imported[0].doi, "10.1000/abc");
}

#[test]
fn duplicate_doi_is_a_conflict_error() {
    let conn = test_conn();
    let (imported, errors) = import_bibtex(
        &conn,
        r#"@article{d1, title = {T1}, author = {A}, year = {2020}, doi = {10.1/x}}"#,
    )
    .unwrap();
    assert!(errors.is_empty());
    assert_eq!(imported.len(), 1);

    // different fields, same DOI
    let (imported, errors) = import_bibtex(
        &conn,
        r#"@article{d2, title = {T2}, author = {B}, year = {2021}, doi = {10.1/x}}"#,
    )
    .unwrap();
    assert!(imported.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("An error occurred saving publication \"d2\":"));
    assert!(errors[0].contains("DOI or ISBN"), "{}", errors[0]);
}

#[test]
fn citations_link_across_entries_in_one_document() {
    let conn = test_conn();
    let doc = r#"
@article{base, title = {Base}, author = {A}, year = {2018}}
@article{follow, title = {F}, author = {A}, year = {2020}, note = {extends \cite{base, elsewhere}}}
"#;
    let (imported, errors) = import_bibtex(&conn, doc).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);

    let base_id = imported[0].id;
    let follow_id = imported[1].id.unwrap();
    let rows = CitationRepository::new(&conn)
        .get_for_owner_field("publication", follow_id, "note")
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].citekey, "base");
    assert_eq!(rows[0].publication_id, base_id);
    assert_eq!(rows[1].citekey, "elsewhere");
    assert_eq!(rows[1].publication_id, None);
}

#[test]
fn forward_citations_attach_when_target_arrives_later() {
    let conn = test_conn();
    let (first, _) = import_bibtex(
        &conn,
        r#"@article{early, title = {E}, author = {A}, year = {2019}, note = {see \cite{later}}}"#,
    )
    .unwrap();
    let early_id = first[0].id.unwrap();

    let rows = CitationRepository::new(&conn)
        .get_for_owner_field("publication", early_id, "note")
        .unwrap();
    assert_eq!(rows[0].publication_id, None);

    let (second, _) = import_bibtex(
        &conn,
        r#"@article{later, title = {L}, author = {B}, year = {2021}}"#,
    )
    .unwrap();

    let rows = CitationRepository::new(&conn)
        .get_for_owner_field("publication", early_id, "note")
        .unwrap();
    assert_eq!(rows[0].publication_id, second[0].id);
}

#[test]
fn transaction_rollback_discards_partial_import()  {
    let mut conn = test_conn();
    {
        let tx = conn.transaction().unwrap();
        let (imported, _) = import_bibtex(
            &tx,
            r#"@article{k, title = {T}, author = {A}, year = {2020}}"#,
        )
        .unwrap();
        assert_eq!(imported.len(), 1);
        tx.rollback().unwrap();
    }
    assert!(PublicationRepository::new(&conn).get_all().unwrap().is_empty());
}

#[test]
fn normalizer_is_idempotent_over_imported_values() {
    let conn = test_conn();
    let doc = r#"@article{n1,
        title = {Pr\text{\^e}t {\`a} Voter},
        author = {A},
        year = {2009},
    }"#;
    let (imported, errors) = import_bibtex(&conn, doc).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
    let title = &imported[0].title;
    assert_eq!(&latex::normalize(title), title);
}
