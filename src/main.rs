use actix_files as fs;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, web, App, HttpResponse, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};

use publications_site::{
    config,
    db::{admin_repository::AdminRepository, schema::init_db},
    routes,
    utils::{ensure_upload_dir, security::hash_password},
};

async fn seed_admin_user() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let admin_email = std::env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL must be set in .env");
    let admin_password =
        std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set in .env");

    let conn = init_db()?;
    let admin_repo = AdminRepository::new(&conn);

    if admin_repo.find_admin_by_email(&admin_email)?.is_none() {
        info!("Admin user not found, creating...");
        let password_clone = admin_password.clone();
        let hashed_password = web::block(move || hash_password(&password_clone)).await??;

        admin_repo.create_admin(&admin_email, &hashed_password)?;
        info!("Admin user created successfully for email: {}", admin_email);
    } else {
        info!("Admin user already exists for email: {}", admin_email);
    }

    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = seed_admin_user().await {
        error!("Failed to seed admin user: {}", e);
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid number");

    if let Err(e) = ensure_upload_dir() {
        warn!("Failed to create uploads directory: {}", e);
    }

    let session_secret =
        std::env::var("SESSION_SECRET_KEY").expect("SESSION_SECRET_KEY must be set in .env");
    // Raw bytes of the secret; must be at least 64 bytes long.
    let secret_key = Key::from(session_secret.as_bytes());

    info!("Starting server on http://{}:{}...", host, port);

    HttpServer::new(move || {
        let secret_key = secret_key.clone();

        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key)
                    .cookie_secure(false)
                    .cookie_path("/".to_string())
                    .cookie_name("publications-session".to_string())
                    .cookie_http_only(true)
                    .cookie_same_site(actix_web::cookie::SameSite::Lax)
                    .build(),
            )
            .wrap(actix_web::middleware::Logger::default())
            // Uploaded attachments are served straight from disk
            .service(fs::Files::new("/download", config::upload_dir()))
            // --- Public Routes ---
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/publications"))
                        .finish()
                }),
            )
            .service(routes::publications::list_publications)
            .service(routes::publications::publications_by_year)
            .service(routes::publications::publications_by_keyword)
            .service(routes::publications::publication_detail)
            .service(routes::api::add_publication)
            .service(routes::auth::show_login_form)
            .service(routes::auth::login)
            // --- Admin Routes (Scoped under /admin) ---
            .service(
                web::scope("/admin")
                    .service(routes::auth::logout)
                    .service(routes::admin::import_form_handler)
                    .service(routes::admin::process_import)
                    .service(routes::admin::admin_publications_handler)
                    .service(routes::admin::edit_publication_form_handler)
                    .service(routes::admin::update_publication_handler)
                    .service(routes::admin::set_status_handler)
                    .service(routes::admin::delete_publication_handler)
                    .service(routes::admin::delete_file_handler),
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
