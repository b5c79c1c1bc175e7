use serde::{Deserialize, Serialize};

/// Maximum number of custom links and of custom files per publication.
pub const MAX_ATTACHMENTS: usize = 5;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomLink {
    pub id: Option<i64>,
    pub publication_id: i64,
    pub description: String,
    pub url: String,
    pub sort: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomFile {
    pub id: Option<i64>,
    pub publication_id: i64,
    pub description: String,
    pub file_path: String,
    pub sort: i64,
}

impl CustomFile {
    pub fn download_url(&self) -> String {
        format!("/download/{}", self.file_path)
    }
}
