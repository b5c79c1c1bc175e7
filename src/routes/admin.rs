use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{delete, get, post, web, HttpResponse};
use askama::Template;
use futures::StreamExt;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::{
    bibtex::import::import_bibtex,
    citations::{self, SyncGuard},
    db::{
        attachment_repository::AttachmentRepository,
        publication_repository::PublicationRepository, schema::init_db,
        type_repository::TypeRepository,
    },
    errors::PublicationError,
    models::{
        attachment::{CustomFile, CustomLink, MAX_ATTACHMENTS},
        publication::{Publication, PublicationStatus},
        publication_type::PublicationType,
    },
    utils::{self, FlashMessage},
};

type AuthResult = Result<i32, HttpResponse>;

fn check_authentication(session: &Session) -> AuthResult {
    match session.get::<i32>("admin_id") {
        Ok(Some(admin_id)) => Ok(admin_id),
        _ => {
            warn!("Unauthorized access attempt to admin route.");
            Err(HttpResponse::Found()
                .append_header(("Location", "/admin/login"))
                .finish())
        }
    }
}

// --- Templates ---
#[derive(Template)]
#[template(path = "admin/import.html")]
struct ImportTemplate {
    current_page: &'static str,
    types: Vec<PublicationType>,
}

#[derive(Template)]
#[template(path = "admin/publications.html")]
struct AdminPublicationsTemplate {
    current_page: &'static str,
    publications: Vec<Publication>,
    flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "admin/edit_publication.html")]
struct EditPublicationTemplate {
    current_page: &'static str,
    publication: Publication,
    types: Vec<PublicationType>,
    links: Vec<CustomLink>,
    files: Vec<CustomFile>,
}

#[derive(Deserialize)]
pub struct ImportForm {
    pub bibliography: String,
}

fn render<T: Template>(template: &T) -> Result<HttpResponse, PublicationError> {
    let body = template.render().map_err(|e| {
        error!("Template render error: {:?}", e);
        PublicationError::InternalError("Template error".to_string())
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

// --- Handlers ---

#[get("/import")]
pub async fn import_form_handler(session: Session) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let conn = init_db()?;
            let types = TypeRepository::new(&conn).get_all()?;
            render(&ImportTemplate {
                current_page: "import",
                types,
            })
        }
        Err(redirect) => Ok(redirect),
    }
}

/// Runs the pasted bibliography through the import pipeline inside one
/// transaction, queues a summary flash plus one flash per entry error and
/// redirects to the admin publication list.
#[post("/import")]
pub async fn process_import(
    session: Session,
    form: web::Form<ImportForm>,
) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let mut conn = init_db()?;
            let tx = conn.transaction()?;
            let (imported, errors) = import_bibtex(&tx, &form.bibliography)?;
            tx.commit()?;

            info!(
                "BibTeX import finished: {} imported, {} errors",
                imported.len(),
                errors.len()
            );

            if imported.is_empty() {
                utils::push_flash(
                    &session,
                    "error",
                    &format!("No publications were added, {} errors occurred", errors.len()),
                );
            } else {
                utils::push_flash(
                    &session,
                    "info",
                    &format!(
                        "Successfully added {} publications ({} skipped due to errors)",
                        imported.len(),
                        errors.len()
                    ),
                );
            }
            for message in &errors {
                utils::push_flash(&session, "error", message);
            }

            Ok(HttpResponse::Found()
                .append_header(("Location", "/admin/publications"))
                .finish())
        }
        Err(redirect) => Ok(redirect),
    }
}

#[get("/publications")]
pub async fn admin_publications_handler(
    session: Session,
) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let conn = init_db()?;
            let publications = PublicationRepository::new(&conn).get_all()?;
            render(&AdminPublicationsTemplate {
                current_page: "publications",
                publications,
                flashes: utils::take_flashes(&session),
            })
        }
        Err(redirect) => Ok(redirect),
    }
}

#[get("/publications/{id}/edit")]
pub async fn edit_publication_form_handler(
    session: Session,
    id: web::Path<i64>,
) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let publication_id = id.into_inner();
            let conn = init_db()?;
            let publication = PublicationRepository::new(&conn).get_by_id(publication_id)?;
            let types = TypeRepository::new(&conn).get_all()?;
            let attachments = AttachmentRepository::new(&conn);
            render(&EditPublicationTemplate {
                current_page: "publications",
                links: attachments.links_for(publication_id)?,
                files: attachments.files_for(publication_id)?,
                publication,
                types,
            })
        }
        Err(redirect) => Ok(redirect),
    }
}

/// Applies the edit form: scalar fields, the custom link list and optionally
/// one new file attachment arrive in a single multipart payload. Citation
/// rows are rebuilt afterwards so the stored set always matches the saved
/// note text and citekey.
#[post("/publications/{id}/edit")]
pub async fn update_publication_handler(
    session: Session,
    id: web::Path<i64>,
    mut payload: Multipart,
) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let publication_id = id.into_inner();

            let mut fields = std::collections::HashMap::new();
            let mut link_descriptions: Vec<String> = Vec::new();
            let mut link_urls: Vec<String> = Vec::new();
            let mut file_name: Option<String> = None;
            let mut file_description = String::new();

            while let Some(field_result) = payload.next().await {
                let mut field = field_result.map_err(|e| {
                    PublicationError::FileProcessingError(format!("Multipart error: {:?}", e))
                })?;
                let content_disposition = field.content_disposition().cloned().ok_or_else(|| {
                    PublicationError::ValidationError("Content disposition missing".to_string())
                })?;
                let name = content_disposition
                    .get_name()
                    .ok_or_else(|| {
                        PublicationError::ValidationError("Field name missing".to_string())
                    })?
                    .to_string();

                match name.as_str() {
                    "link_description" => {
                        link_descriptions.push(utils::read_field(field).await?)
                    }
                    "link_url" => link_urls.push(utils::read_field(field).await?),
                    "file" => {
                        // an empty filename means no file was chosen
                        let has_file = content_disposition
                            .get_filename()
                            .map(|f| !f.is_empty())
                            .unwrap_or(false);
                        if has_file {
                            file_name = Some(utils::save_uploaded_file(field).await?);
                        } else {
                            while field.next().await.is_some() {}
                        }
                    }
                    "file_description" => file_description = utils::read_field(field).await?,
                    _ => {
                        fields.insert(name, utils::read_field(field).await?);
                    }
                }
            }

            let text = |key: &str| fields.get(key).cloned().unwrap_or_default();
            let required = |key: &str| -> Result<String, PublicationError> {
                let value = text(key);
                if value.trim().is_empty() {
                    return Err(PublicationError::ValidationError(format!(
                        "{} is required",
                        key
                    )));
                }
                Ok(value.trim().to_string())
            };

            let conn = init_db()?;
            let repository = PublicationRepository::new(&conn);
            let stored = repository.get_by_id(publication_id)?;

            let status = PublicationStatus::from_str(&text("status"))
                .ok_or_else(|| PublicationError::ValidationError("Invalid status".to_string()))?;
            let type_id = text("type_id").parse::<i64>().map_err(|_| {
                PublicationError::ValidationError("Invalid publication type".to_string())
            })?;
            let year = required("year")?.parse::<i64>().map_err(|_| {
                PublicationError::ValidationError("Year must be a number".to_string())
            })?;
            let month = text("month").parse::<i64>().unwrap_or(0);

            let updated = Publication {
                id: Some(publication_id),
                type_id,
                type_title: stored.type_title,
                bibtex_type: stored.bibtex_type,
                citekey: text("citekey").trim().to_string(),
                title: required("title")?,
                authors: required("authors")?,
                year,
                month,
                journal: text("journal"),
                book_title: text("book_title"),
                publisher: text("publisher"),
                institution: text("institution"),
                school: text("school"),
                organization: text("organization"),
                location: text("location"),
                country: text("country"),
                volume: text("volume").parse::<i64>().ok(),
                number: text("number").parse::<i64>().ok(),
                chapter: text("chapter"),
                section: text("section"),
                pages: text("pages"),
                url: text("url"),
                code: text("code"),
                doi: text("doi").trim().to_string(),
                isbn: text("isbn").trim().to_string(),
                note: text("note"),
                abstract_text: text("abstract"),
                keywords: text("keywords"),
                status,
                external: fields.contains_key("external"),
                created_at: None,
            };

            repository.update(&updated)?;

            // keep citation rows in step with the saved text and citekey
            let mut guard = SyncGuard::new();
            citations::publication_citekey_changed(&conn, publication_id, &updated.citekey)?;
            citations::replace_citation_set(
                &conn,
                &citations::PUBLICATION_NOTE,
                publication_id,
                &updated.note,
                &mut guard,
            )?;

            let links: Vec<CustomLink> = link_descriptions
                .into_iter()
                .zip(link_urls)
                .filter(|(description, url)| !description.is_empty() || !url.is_empty())
                .take(MAX_ATTACHMENTS)
                .map(|(description, url)| CustomLink {
                    id: None,
                    publication_id,
                    description,
                    url,
                    sort: 0,
                })
                .collect();
            AttachmentRepository::new(&conn).replace_links(publication_id, &links)?;

            if let Some(file_name) = file_name {
                AttachmentRepository::new(&conn).add_file(
                    publication_id,
                    &file_description,
                    &file_name,
                )?;
            }

            Ok(HttpResponse::Found()
                .append_header(("Location", format!("/publications/{}", publication_id)))
                .finish())
        }
        Err(redirect) => Ok(redirect),
    }
}

#[post("/publications/{id}/status/{status}")]
pub async fn set_status_handler(
    session: Session,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let (publication_id, status) = path.into_inner();
            let status = PublicationStatus::from_str(&status).ok_or_else(|| {
                PublicationError::ValidationError(format!("Unknown status \"{}\"", status))
            })?;

            let conn = init_db()?;
            PublicationRepository::new(&conn).set_status(publication_id, status)?;

            Ok(HttpResponse::Found()
                .append_header(("Location", "/admin/publications"))
                .finish())
        }
        Err(redirect) => Ok(redirect),
    }
}

#[delete("/publications/{id}")]
pub async fn delete_publication_handler(
    session: Session,
    id: web::Path<i64>,
) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let publication_id = id.into_inner();
            let conn = init_db()?;
            PublicationRepository::new(&conn).delete(publication_id)?;

            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": format!("Publication with ID {} deleted successfully", publication_id)
            })))
        }
        Err(redirect) => Ok(redirect),
    }
}

#[delete("/files/{id}")]
pub async fn delete_file_handler(
    session: Session,
    id: web::Path<i64>,
) -> Result<HttpResponse, PublicationError> {
    match check_authentication(&session) {
        Ok(_) => {
            let file_id = id.into_inner();
            let conn = init_db()?;
            AttachmentRepository::new(&conn).delete_file(file_id)?;

            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": format!("Attachment {} deleted", file_id)
            })))
        }
        Err(redirect) => Ok(redirect),
    }
}
