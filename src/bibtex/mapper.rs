use crate::bibtex::parser::ParsedEntry;
use crate::models::publication::{NewPublication, PublicationStatus};
use crate::models::publication_type::PublicationType;
use log::debug;

/// BibTeX field names the mapper understands. Anything else in an entry is
/// dropped with a debug log line rather than rejected, so bibliographies
/// exported by other tools import cleanly.
pub const IMPORTABLE_FIELDS: [&str; 26] = [
    "title",
    "author",
    "year",
    "month",
    "journal",
    "booktitle",
    "publisher",
    "institution",
    "school",
    "organization",
    "address",
    "location",
    "country",
    "volume",
    "number",
    "chapter",
    "section",
    "pages",
    "url",
    "code",
    "doi",
    "isbn",
    "note",
    "abstract",
    "keywords",
    "tags",
];

/// Month number for the usual BibTeX month spellings, 0 when unknown.
fn month_number(value: &str) -> i64 {
    const MONTHS: [(&str, &str); 12] = [
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("may", "may"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    let lowered = value.trim().to_lowercase();
    if let Ok(n) = lowered.parse::<i64>() {
        if (1..=12).contains(&n) {
            return n;
        }
        return 0;
    }
    for (index, (short, long)) in MONTHS.iter().enumerate() {
        if lowered == *short || lowered == *long {
            return (index + 1) as i64;
        }
    }
    0
}

/// Folds common country spellings to one canonical form so de-duplication is
/// not defeated by "USA" vs "United States".
fn normalize_country(value: &str) -> String {
    let trimmed = value.trim();
    match trimmed.to_lowercase().as_str() {
        "usa" | "us" | "u.s.a." | "united states" | "united states of america" => {
            "United States".to_string()
        }
        "uk" | "u.k." | "great britain" | "united kingdom" => "United Kingdom".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Reorders one "Last, First" name to "First Last"; names without a comma
/// pass through unchanged.
fn reorder_name(name: &str) -> String {
    match name.split_once(',') {
        Some((last, first)) => {
            let first = first.trim();
            let last = last.trim();
            if first.is_empty() {
                last.to_string()
            } else {
                format!("{} {}", first, last)
            }
        }
        None => name.trim().to_string(),
    }
}

/// Maps one parsed entry onto a publication candidate. Mandatory keys are
/// title, author and an integer year; the entry type must match one of the
/// configured publication types.
pub fn map_entry(
    entry: &ParsedEntry,
    types: &[PublicationType],
) -> Result<NewPublication, String> {
    let title = entry.fields.get("title").cloned().unwrap_or_default();
    let year = entry
        .fields
        .get("year")
        .and_then(|y| y.trim().parse::<i64>().ok());

    let mut missing = Vec::new();
    if title.is_empty() {
        missing.push("title");
    }
    if entry.authors.is_empty() {
        missing.push("author");
    }
    if year.is_none() {
        missing.push("year");
    }
    if !missing.is_empty() {
        return Err(format!(
            "BibTeX entry \"{}\" is missing following mandatory keys: {}",
            entry.display_key(),
            missing.join(", ")
        ));
    }

    // entry types are case-insensitive in BibTeX; the error keeps the
    // spelling the document used
    let publication_type = types
        .iter()
        .find(|t| {
            t.bibtex_type_list()
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(&entry.entry_type))
        })
        .ok_or_else(|| format!("Type \"{}\" unknown.", entry.entry_type))?;

    let mut candidate = NewPublication {
        type_id: publication_type.id,
        title,
        authors: entry
            .authors
            .iter()
            .map(|a| reorder_name(a))
            .collect::<Vec<_>>()
            .join(", "),
        year: year.unwrap_or(0),
        keywords: entry.keywords.join(", "),
        status: PublicationStatus::Draft,
        external: false,
        ..NewPublication::default()
    };

    for (name, value) in &entry.fields {
        if !IMPORTABLE_FIELDS.contains(&name.as_str()) {
            debug!(
                "Dropping unknown BibTeX field \"{}\" on entry \"{}\"",
                name,
                entry.display_key()
            );
            continue;
        }
        let value = value.trim();
        match name.as_str() {
            "title" | "year" => {}
            "month" => candidate.month = month_number(value),
            "journal" => candidate.journal = value.to_string(),
            "booktitle" => candidate.book_title = value.to_string(),
            "publisher" => candidate.publisher = value.to_string(),
            "institution" => candidate.institution = value.to_string(),
            "school" => candidate.school = value.to_string(),
            "organization" => candidate.organization = value.to_string(),
            "address" | "location" => candidate.location = value.to_string(),
            "country" => candidate.country = normalize_country(value),
            "volume" => match value.parse::<i64>() {
                Ok(v) => candidate.volume = Some(v),
                Err(_) => {
                    // Some exporters put the DOI into the volume field.
                    if value.to_lowercase().contains("doi") || looks_like_doi(value) {
                        candidate.doi = value.to_string();
                    }
                    candidate.volume = None;
                }
            },
            "number" => candidate.number = value.parse::<i64>().ok(),
            "chapter" => candidate.chapter = value.to_string(),
            "section" => candidate.section = value.to_string(),
            // biblatex renders "--" as an en dash before we see it
            "pages" => {
                candidate.pages = value
                    .replace("--", "-")
                    .replace(['\u{2013}', '\u{2014}'], "-")
                    .trim()
                    .to_string()
            }
            "url" => candidate.url = value.to_string(),
            "code" => candidate.code = value.to_string(),
            "doi" => candidate.doi = value.to_string(),
            "isbn" => candidate.isbn = value.to_string(),
            "note" => candidate.note = value.to_string(),
            "abstract" => candidate.abstract_text = value.to_string(),
            // author, keywords and tags are split off before mapping
            _ => {}
        }
    }

    Ok(candidate)
}

fn looks_like_doi(value: &str) -> bool {
    value.starts_with("10.") && value.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn types() -> Vec<PublicationType> {
        vec![
            PublicationType {
                id: 1,
                title: "Journal articles".to_string(),
                bibtex_types: "article".to_string(),
                hidden: false,
            },
            PublicationType {
                id: 3,
                title: "Conference papers".to_string(),
                bibtex_types: "inproceedings, conference".to_string(),
                hidden: false,
            },
        ]
    }

    fn entry() -> ParsedEntry {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "T".to_string());
        fields.insert("year".to_string(), "2020".to_string());
        ParsedEntry {
            citekey: "key1".to_string(),
            entry_type: "article".to_string(),
            authors: vec!["Doe, J.".to_string()],
            keywords: vec![],
            fields,
        }
    }

    #[test]
    fn maps_minimal_entry() {
        let candidate = map_entry(&entry(), &types()).unwrap();
        assert_eq!(candidate.type_id, 1);
        assert_eq!(candidate.title, "T");
        assert_eq!(candidate.authors, "J. Doe");
        assert_eq!(candidate.year, 2020);
        assert_eq!(candidate.month, 0);
        assert_eq!(candidate.status, PublicationStatus::Draft);
    }

    #[test]
    fn missing_year_is_reported() {
        let mut e = entry();
        e.fields.remove("year");
        let err = map_entry(&e, &types()).unwrap_err();
        assert_eq!(
            err,
            "BibTeX entry \"key1\" is missing following mandatory keys: year"
        );
    }

    #[test]
    fn non_numeric_year_counts_as_missing() {
        let mut e = entry();
        e.fields.insert("year".to_string(), "in press".to_string());
        let err = map_entry(&e, &types()).unwrap_err();
        assert!(err.contains("year"), "{}", err);
    }

    #[test]
    fn all_missing_keys_are_listed_for_unnamed_entry() {
        let e = ParsedEntry {
            citekey: String::new(),
            entry_type: "article".to_string(),
            authors: vec![],
            keywords: vec![],
            fields: BTreeMap::new(),
        };
        let err = map_entry(&e, &types()).unwrap_err();
        assert_eq!(
            err,
            "BibTeX entry \"<unnamed>\" is missing following mandatory keys: title, author, year"
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut e = entry();
        e.entry_type = "patent".to_string();
        let err = map_entry(&e, &types()).unwrap_err();
        assert_eq!(err, "Type \"patent\" unknown.");
    }

    #[test]
    fn type_matching_covers_all_aliases() {
        let mut e = entry();
        e.entry_type = "conference".to_string();
        let candidate = map_entry(&e, &types()).unwrap();
        assert_eq!(candidate.type_id, 3);
    }

    #[test]
    fn type_matching_ignores_case_but_errors_keep_it() {
        let mut e = entry();
        e.entry_type = "Article".to_string();
        assert_eq!(map_entry(&e, &types()).unwrap().type_id, 1);

        e.entry_type = "Patent".to_string();
        let err = map_entry(&e, &types()).unwrap_err();
        assert_eq!(err, "Type \"Patent\" unknown.");
    }

    #[test]
    fn authors_are_reordered_and_joined() {
        let mut e = entry();
        e.authors = vec!["Doe, John".to_string(), "Anna Smith".to_string()];
        let candidate = map_entry(&e, &types()).unwrap();
        assert_eq!(candidate.authors, "John Doe, Anna Smith");
    }

    #[test]
    fn doi_in_volume_field_is_relocated() {
        let mut e = entry();
        e.fields
            .insert("volume".to_string(), "10.1000/abc".to_string());
        let candidate = map_entry(&e, &types()).unwrap();
        assert_eq!(candidate.volume, None);
        assert_eq!(candidate.doi, "10.1000/abc");
    }

    #[test]
    fn non_numeric_volume_and_number_are_cleared() {
        let mut e = entry();
        e.fields.insert("volume".to_string(), "Vol. X".to_string());
        e.fields.insert("number".to_string(), "n/a".to_string());
        let candidate = map_entry(&e, &types()).unwrap();
        assert_eq!(candidate.volume, None);
        assert_eq!(candidate.number, None);
    }

    #[test]
    fn pages_dashes_are_collapsed() {
        for raw in ["12--34", "12\u{2013}34", "12\u{2014}34"] {
            let mut e = entry();
            e.fields.insert("pages".to_string(), raw.to_string());
            let candidate = map_entry(&e, &types()).unwrap();
            assert_eq!(candidate.pages, "12-34", "from {:?}", raw);
        }
    }

    #[test]
    fn month_names_and_numbers_are_understood() {
        assert_eq!(month_number("sep"), 9);
        assert_eq!(month_number("September"), 9);
        assert_eq!(month_number("3"), 3);
        assert_eq!(month_number("13"), 0);
        assert_eq!(month_number("spring"), 0);
    }

    #[test]
    fn country_aliases_are_folded() {
        assert_eq!(normalize_country("USA"), "United States");
        assert_eq!(normalize_country("u.k."), "United Kingdom");
        assert_eq!(normalize_country("Germany"), "Germany");
    }

    #[test]
    fn address_maps_to_location() {
        let mut e = entry();
        e.fields
            .insert("address".to_string(), "Berlin".to_string());
        let candidate = map_entry(&e, &types()).unwrap();
        assert_eq!(candidate.location, "Berlin");
    }

    #[test]
    fn every_importable_field_reaches_the_candidate() {
        let mut e = entry();
        for name in IMPORTABLE_FIELDS {
            // author, keywords and tags never arrive as raw fields
            if matches!(name, "title" | "year" | "author" | "keywords" | "tags") {
                continue;
            }
            let value = match name {
                "month" => "sep",
                "volume" => "7",
                "number" => "2",
                _ => "x",
            };
            e.fields.insert(name.to_string(), value.to_string());
        }
        let c = map_entry(&e, &types()).unwrap();
        assert_eq!(c.month, 9);
        assert_eq!(c.volume, Some(7));
        assert_eq!(c.number, Some(2));
        for field in [
            &c.journal,
            &c.book_title,
            &c.publisher,
            &c.institution,
            &c.school,
            &c.organization,
            &c.location,
            &c.country,
            &c.chapter,
            &c.section,
            &c.pages,
            &c.url,
            &c.code,
            &c.doi,
            &c.isbn,
            &c.note,
            &c.abstract_text,
        ] {
            assert_eq!(field, "x");
        }
    }

    #[test]
    fn unknown_fields_are_dropped_silently() {
        let mut e = entry();
        e.fields
            .insert("howpublished".to_string(), "online".to_string());
        let candidate = map_entry(&e, &types()).unwrap();
        // nothing of the unknown field ends up on the candidate
        assert_eq!(candidate.note, "");
        assert_eq!(candidate.url, "");
    }
}
