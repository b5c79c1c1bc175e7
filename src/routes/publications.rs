use actix_session::Session;
use actix_web::{get, web, HttpRequest, HttpResponse};
use askama::Template;
use log::error;
use std::collections::HashMap;

use crate::{
    config::{get_site_config, SiteConfig},
    db::{
        attachment_repository::AttachmentRepository, publication_repository::PublicationRepository,
        schema::init_db,
    },
    errors::PublicationError,
    models::{
        attachment::{CustomFile, CustomLink},
        publication::Publication,
    },
};

/// Alternative representations of the publication pages, requested by a bare
/// query-string flag (`?bibtex`, `?ris`, ...). No flag means HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Plain,
    Bibtex,
    Mods,
    Ris,
    Rss,
}

impl ExportFormat {
    pub fn from_query(query: &HashMap<String, String>) -> Option<Self> {
        // flag priority is fixed so `?plain&bibtex` is deterministic
        const FLAGS: [(&str, ExportFormat); 5] = [
            ("plain", ExportFormat::Plain),
            ("bibtex", ExportFormat::Bibtex),
            ("mods", ExportFormat::Mods),
            ("ris", ExportFormat::Ris),
            ("rss", ExportFormat::Rss),
        ];
        FLAGS
            .iter()
            .find(|(flag, _)| query.contains_key(*flag))
            .map(|(_, format)| *format)
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Plain => "text/plain; charset=UTF-8",
            ExportFormat::Bibtex => "text/x-bibtex; charset=UTF-8",
            ExportFormat::Mods => "application/xml; charset=UTF-8",
            ExportFormat::Ris => "application/x-research-info-systems; charset=UTF-8",
            ExportFormat::Rss => "application/rss+xml; charset=UTF-8",
        }
    }
}

pub struct YearGroup {
    pub year: i64,
    pub publications: Vec<Publication>,
}

/// Splits an already year-descending list into one group per year.
pub fn group_by_year(publications: Vec<Publication>) -> Vec<YearGroup> {
    let mut groups: Vec<YearGroup> = Vec::new();
    for publication in publications {
        match groups.last_mut() {
            Some(group) if group.year == publication.year => {
                group.publications.push(publication)
            }
            _ => groups.push(YearGroup {
                year: publication.year,
                publications: vec![publication],
            }),
        }
    }
    groups
}

// --- Templates ---
#[derive(Template)]
#[template(path = "publications/list.html")]
struct PublicationListTemplate {
    site: SiteConfig,
    heading: String,
    groups: Vec<YearGroup>,
    is_admin: bool,
}

#[derive(Template)]
#[template(path = "publications/detail.html")]
struct PublicationDetailTemplate {
    site: SiteConfig,
    publication: Publication,
    links: Vec<CustomLink>,
    files: Vec<CustomFile>,
    is_admin: bool,
}

#[derive(Template)]
#[template(path = "404.html")]
struct NotFoundTemplate {
    site: SiteConfig,
    message: String,
}

#[derive(Template)]
#[template(path = "export/publications.txt", escape = "none")]
struct PlainExport<'a> {
    publications: &'a [Publication],
}

#[derive(Template)]
#[template(path = "export/publications.bib", escape = "none")]
struct BibtexExport<'a> {
    publications: &'a [Publication],
}

#[derive(Template)]
#[template(path = "export/publications.mods", escape = "html")]
struct ModsExport<'a> {
    publications: &'a [Publication],
}

#[derive(Template)]
#[template(path = "export/publications.ris", escape = "none")]
struct RisExport<'a> {
    publications: &'a [Publication],
}

#[derive(Template)]
#[template(path = "export/publications.rss", escape = "html")]
struct RssExport<'a> {
    site: SiteConfig,
    link: &'a str,
    publications: &'a [Publication],
}

fn render_template<T: Template>(template: &T) -> Result<String, PublicationError> {
    template.render().map_err(|e| {
        error!("Template render error: {:?}", e);
        PublicationError::InternalError("Template error".to_string())
    })
}

pub fn render_export(
    format: ExportFormat,
    publications: &[Publication],
    link: &str,
) -> Result<HttpResponse, PublicationError> {
    let body = match format {
        ExportFormat::Plain => render_template(&PlainExport { publications })?,
        ExportFormat::Bibtex => render_template(&BibtexExport { publications })?,
        ExportFormat::Mods => render_template(&ModsExport { publications })?,
        ExportFormat::Ris => render_template(&RisExport { publications })?,
        ExportFormat::Rss => render_template(&RssExport {
            site: get_site_config(),
            link,
            publications,
        })?,
    };
    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .body(body))
}

fn is_admin(session: &Session) -> bool {
    session.get::<i32>("admin_id").unwrap_or(None).is_some()
}

// --- Handlers ---

#[get("/publications")]
pub async fn list_publications(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    session: Session,
) -> Result<HttpResponse, PublicationError> {
    let conn = init_db()?;
    let publications = PublicationRepository::new(&conn).get_visible(None)?;

    if let Some(format) = ExportFormat::from_query(&query) {
        return render_export(format, &publications, req.path());
    }

    let template = PublicationListTemplate {
        site: get_site_config(),
        heading: "Publications".to_string(),
        groups: group_by_year(publications),
        is_admin: is_admin(&session),
    };
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_template(&template)?))
}

#[get("/publications/year/{year}")]
pub async fn publications_by_year(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<HashMap<String, String>>,
    session: Session,
) -> Result<HttpResponse, PublicationError> {
    let year = path.into_inner();
    let conn = init_db()?;
    let publications = PublicationRepository::new(&conn).get_visible(Some(year))?;

    if let Some(format) = ExportFormat::from_query(&query) {
        return render_export(format, &publications, req.path());
    }

    let template = PublicationListTemplate {
        site: get_site_config(),
        heading: format!("Publications {}", year),
        groups: group_by_year(publications),
        is_admin: is_admin(&session),
    };
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_template(&template)?))
}

#[get("/publications/keyword/{keyword}")]
pub async fn publications_by_keyword(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
    session: Session,
) -> Result<HttpResponse, PublicationError> {
    let keyword = path.into_inner().to_lowercase();
    let conn = init_db()?;

    // LIKE narrows the candidates, the keyword list check makes it exact
    let candidates = PublicationRepository::new(&conn).search_keyword(&keyword)?;
    let publications: Vec<Publication> = candidates
        .into_iter()
        .filter(|p| {
            p.keywords_list()
                .iter()
                .any(|k| k.to_lowercase() == keyword)
        })
        .collect();

    if let Some(format) = ExportFormat::from_query(&query) {
        if format != ExportFormat::Rss {
            return render_export(format, &publications, req.path());
        }
    }

    let template = PublicationListTemplate {
        site: get_site_config(),
        heading: format!("Publications with keyword \"{}\"", keyword),
        groups: group_by_year(publications),
        is_admin: is_admin(&session),
    };
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_template(&template)?))
}

#[get("/publications/{id}")]
pub async fn publication_detail(
    path: web::Path<i64>,
    query: web::Query<HashMap<String, String>>,
    session: Session,
) -> Result<HttpResponse, PublicationError> {
    let id = path.into_inner();
    let conn = init_db()?;

    let publication = match PublicationRepository::new(&conn).get_by_id(id) {
        Ok(publication) => publication,
        Err(PublicationError::NotFound(message)) => {
            let template = NotFoundTemplate {
                site: get_site_config(),
                message,
            };
            return Ok(HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body(render_template(&template)?));
        }
        Err(e) => return Err(e),
    };

    if let Some(format) = ExportFormat::from_query(&query) {
        if format != ExportFormat::Rss {
            let publications = [publication];
            return render_export(format, &publications, "");
        }
    }

    let attachments = AttachmentRepository::new(&conn);
    let template = PublicationDetailTemplate {
        site: get_site_config(),
        links: attachments.links_for(id)?,
        files: attachments.files_for(id)?,
        publication,
        is_admin: is_admin(&session),
    };
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_template(&template)?))
}
