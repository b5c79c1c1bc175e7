use serde::{Deserialize, Serialize};

/// A derived row linking a citekey mention found in an owner's text field to
/// the publication whose citekey matches, if any.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Citation {
    pub id: i64,
    pub owner_type: String,
    pub owner_id: i64,
    pub field_name: String,
    pub citekey: String,
    pub publication_id: Option<i64>,
}
