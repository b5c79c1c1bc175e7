/// Site-wide settings. Paths come from the environment so the CLI importer
/// and the server can point at the same database.
pub struct SiteConfig {
    pub name: String,
    pub description: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: String::from("Publications"),
            description: String::from("Bibliography of publications maintained by this site."),
        }
    }
}

pub fn get_site_config() -> SiteConfig {
    SiteConfig::default()
}

pub fn database_path() -> String {
    std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/publications.db".to_string())
}

pub fn upload_dir() -> String {
    std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./data/uploads".to_string())
}
