use actix_web::{post, web, HttpResponse};
use log::info;
use serde::Deserialize;

use crate::{
    citations::{self, SyncGuard},
    db::{
        publication_repository::PublicationRepository, schema::init_db,
        type_repository::TypeRepository,
    },
    errors::PublicationError,
    models::{
        publication::{NewPublication, PublicationStatus},
        response::ValidationResponse,
    },
};

/// Payload for the programmatic add endpoint. Only this allow-list of fields
/// is accepted; unknown keys reject the request so typos do not silently lose
/// data.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiPublication {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub title: String,
    pub authors: String,
    pub year: i64,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub pages: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub isbn: String,
}

fn validate(payload: &ApiPublication) -> Vec<ValidationResponse> {
    let mut failures = Vec::new();
    if payload.title.trim().is_empty() {
        failures.push(ValidationResponse {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        });
    }
    if payload.authors.trim().is_empty() {
        failures.push(ValidationResponse {
            field: "authors".to_string(),
            message: "Authors are required".to_string(),
        });
    }
    if payload.year <= 0 {
        failures.push(ValidationResponse {
            field: "year".to_string(),
            message: "Year must be a positive number".to_string(),
        });
    }
    failures
}

/// Adds one publication from a JSON payload. Responds 201 with the stored
/// record, 400 with per-field messages on validation failure, 409 when the
/// DOI or ISBN is already taken.
#[post("/api/publications")]
pub async fn add_publication(
    payload: web::Json<ApiPublication>,
) -> Result<HttpResponse, PublicationError> {
    let failures = validate(&payload);
    if !failures.is_empty() {
        return Ok(HttpResponse::BadRequest().json(failures));
    }

    let conn = init_db()?;
    let types = TypeRepository::new(&conn).get_all()?;
    let publication_type = types
        .iter()
        .find(|t| t.bibtex_type_list().contains(&payload.entry_type.as_str()))
        .ok_or_else(|| {
            PublicationError::ValidationError(format!("Type \"{}\" unknown.", payload.entry_type))
        })?;

    let candidate = NewPublication {
        type_id: publication_type.id,
        title: payload.title.trim().to_string(),
        authors: payload.authors.trim().to_string(),
        year: payload.year,
        journal: payload.journal.trim().to_string(),
        volume: payload.volume,
        number: payload.number,
        pages: payload.pages.trim().to_string(),
        url: payload.url.trim().to_string(),
        doi: payload.doi.trim().to_string(),
        isbn: payload.isbn.trim().to_string(),
        status: PublicationStatus::Published,
        ..NewPublication::default()
    };

    // Conflict on a duplicate DOI/ISBN surfaces as 409 via the error type
    let publication = PublicationRepository::new(&conn).insert(&candidate, "")?;
    if let Some(id) = publication.id {
        let mut guard = SyncGuard::new();
        citations::publication_saved(&conn, id, &publication.citekey, &publication.note, &mut guard)?;
    }

    info!("API added publication {}", publication.id_string());
    Ok(HttpResponse::Created().json(publication))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ApiPublication {
        ApiPublication {
            entry_type: "article".to_string(),
            title: "T".to_string(),
            authors: "J. Doe".to_string(),
            year: 2020,
            journal: String::new(),
            volume: None,
            number: None,
            pages: String::new(),
            url: String::new(),
            doi: String::new(),
            isbn: String::new(),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate(&payload()).is_empty());
    }

    #[test]
    fn every_failing_field_is_reported() {
        let mut p = payload();
        p.title = "  ".to_string();
        p.authors = String::new();
        p.year = 0;
        let failures = validate(&p);
        let fields: Vec<&str> = failures.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "authors", "year"]);
    }

    #[test]
    fn unknown_json_keys_are_rejected() {
        let err = serde_json::from_str::<ApiPublication>(
            r#"{"type":"article","title":"T","authors":"A","year":2020,"publisher":"X"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("publisher"), "{}", err);
    }

    #[test]
    fn optional_fields_default() {
        let p: ApiPublication =
            serde_json::from_str(r#"{"type":"article","title":"T","authors":"A","year":2020}"#)
                .unwrap();
        assert_eq!(p.journal, "");
        assert_eq!(p.volume, None);
    }
}
