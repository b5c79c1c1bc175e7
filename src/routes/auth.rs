use crate::{
    db::{admin_repository::AdminRepository, schema::init_db},
    errors::PublicationError,
    utils::security::verify_password,
};
use actix_session::Session;
use actix_web::{get, post, web, HttpResponse, Responder};
use askama::Template;
use log::{error, info, warn};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "admin/login.html")]
struct LoginTemplate {
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginFormData {
    email: String,
    password: String,
}

fn login_page(error: Option<String>) -> String {
    LoginTemplate { error }.render().unwrap_or_else(|e| {
        error!("Login template render error: {}", e);
        "Error rendering login page.".to_string()
    })
}

// Show Login Form
#[get("/admin/login")]
pub async fn show_login_form(session: Session) -> impl Responder {
    if session.get::<i32>("admin_id").unwrap_or(None).is_some() {
        return HttpResponse::Found()
            .append_header(("Location", "/admin/publications"))
            .finish();
    }
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(login_page(None))
}

// Process Login
#[post("/admin/login")]
pub async fn login(
    session: Session,
    form: web::Form<LoginFormData>,
) -> Result<HttpResponse, PublicationError> {
    let email = form.email.clone();
    let password = form.password.clone();

    let result = web::block(move || {
        let conn = init_db().map_err(|e| PublicationError::DatabaseError(e.to_string()))?;
        let admin_repo = AdminRepository::new(&conn);
        admin_repo.find_admin_by_email(&email)
    })
    .await
    .map_err(|e| PublicationError::DatabaseError(format!("Blocking error: {}", e)))??;

    match result {
        Some(admin) => {
            let stored_hash = admin.password_hash.clone();
            let match_result = web::block(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| {
                    PublicationError::InternalError(format!(
                        "Password verification task failed: {}",
                        e
                    ))
                })?;

            match match_result {
                Ok(true) => {
                    session.insert("admin_id", admin.id).map_err(|e| {
                        PublicationError::StorageError(format!("Session insert error: {}", e))
                    })?;
                    session.renew();
                    info!("Admin login successful for email: {}", form.email);
                    Ok(HttpResponse::Found()
                        .append_header(("Location", "/admin/publications"))
                        .finish())
                }
                Ok(false) => {
                    warn!(
                        "Admin login failed (wrong password) for email: {}",
                        form.email
                    );
                    Ok(HttpResponse::Unauthorized()
                        .content_type("text/html; charset=utf-8")
                        .body(login_page(Some("Invalid email or password.".to_string()))))
                }
                Err(e) => {
                    error!(
                        "Password verification error for email {}: {}",
                        form.email, e
                    );
                    Err(PublicationError::HashingError(format!(
                        "Password verification failed: {}",
                        e
                    )))
                }
            }
        }
        None => {
            warn!("Admin login failed (email not found): {}", form.email);
            Ok(HttpResponse::Unauthorized()
                .content_type("text/html; charset=utf-8")
                .body(login_page(Some("Invalid email or password.".to_string()))))
        }
    }
}

// Logout Handler
#[post("/logout")]
pub async fn logout(session: Session) -> impl Responder {
    let admin_id_result = session.get::<i32>("admin_id");
    session.purge();
    match admin_id_result {
        Ok(Some(id)) => info!("Admin logout successful for ID: {}", id),
        Ok(None) => info!("Admin logout successful (no ID found in session)."),
        Err(e) => warn!("Error reading admin_id during logout: {}", e),
    };
    HttpResponse::Found()
        .append_header(("Location", "/admin/login"))
        .finish()
}
