use serde::Serialize;

#[derive(Serialize)]
pub struct ValidationResponse {
    pub field: String,
    pub message: String,
}
