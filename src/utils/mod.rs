use actix_multipart::Field;
use actix_session::Session;
use futures::StreamExt;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use crate::config;
use crate::errors::PublicationError;

pub mod security;

/// One queued flash message, rendered on the next page the admin sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: String,
    pub text: String,
}

const FLASH_KEY: &str = "flash_messages";

pub fn push_flash(session: &Session, level: &str, text: &str) {
    let mut messages: Vec<FlashMessage> = session.get(FLASH_KEY).unwrap_or(None).unwrap_or_default();
    messages.push(FlashMessage {
        level: level.to_string(),
        text: text.to_string(),
    });
    if let Err(e) = session.insert(FLASH_KEY, &messages) {
        warn!("Failed to store flash message: {}", e);
    }
}

/// Drains the queued flash messages so each is shown exactly once.
pub fn take_flashes(session: &Session) -> Vec<FlashMessage> {
    let messages: Vec<FlashMessage> = session.get(FLASH_KEY).unwrap_or(None).unwrap_or_default();
    session.remove(FLASH_KEY);
    messages
}

pub fn ensure_upload_dir() -> std::io::Result<()> {
    let upload_dir = config::upload_dir();
    let upload_dir = Path::new(&upload_dir);
    if !upload_dir.exists() {
        info!("Creating uploads directory...");
        fs::create_dir_all(upload_dir)?;
    }
    Ok(())
}

// Helper to read text fields from multipart
pub async fn read_field(mut field: Field) -> Result<String, PublicationError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk
            .map_err(|e| PublicationError::FileProcessingError(format!("Chunk error: {}", e)))?;
        bytes.extend_from_slice(&data);
    }
    String::from_utf8(bytes)
        .map_err(|e| PublicationError::FileProcessingError(format!("Invalid UTF-8: {}", e)))
}

/// Streams an uploaded file to the upload directory under a fresh UUID name,
/// keeping the original extension. Returns the generated filename.
pub async fn save_uploaded_file(mut field: Field) -> Result<String, PublicationError> {
    let content_disposition = field.content_disposition().ok_or_else(|| {
        PublicationError::ValidationError("Content disposition not found".to_string())
    })?;
    let original_filename = content_disposition.get_filename().unwrap_or("unknown.bin");
    let extension = Path::new(original_filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = Path::new(&config::upload_dir()).join(&file_name);

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PublicationError::StorageError(format!("Failed to create upload dir: {}", e))
        })?;
    }

    let mut file = fs::File::create(&file_path).map_err(|e| {
        PublicationError::FileProcessingError(format!(
            "Failed to create file {:?}: {}",
            file_path, e
        ))
    })?;

    while let Some(chunk) = field.next().await {
        let data = chunk
            .map_err(|e| PublicationError::FileProcessingError(format!("Chunk error: {}", e)))?;
        file.write_all(&data).map_err(|e| {
            PublicationError::FileProcessingError(format!(
                "Failed to write to file {:?}: {}",
                file_path, e
            ))
        })?;
    }

    Ok(file_name)
}
