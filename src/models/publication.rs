use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow status of a publication record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    Submitted,
    Accepted,
    Published,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Draft => "draft",
            PublicationStatus::Submitted => "submitted",
            PublicationStatus::Accepted => "accepted",
            PublicationStatus::Published => "published",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PublicationStatus::Draft),
            "submitted" => Some(PublicationStatus::Submitted),
            "accepted" => Some(PublicationStatus::Accepted),
            "published" => Some(PublicationStatus::Published),
            _ => None,
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A stored bibliographic record. `type_title` and `bibtex_type` are joined in
/// from the types table for display and export.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Publication {
    pub id: Option<i64>,
    pub type_id: i64,
    pub type_title: String,
    pub bibtex_type: String,
    pub citekey: String,
    pub title: String,
    pub authors: String,
    pub year: i64,
    pub month: i64,
    pub journal: String,
    pub book_title: String,
    pub publisher: String,
    pub institution: String,
    pub school: String,
    pub organization: String,
    pub location: String,
    pub country: String,
    pub volume: Option<i64>,
    pub number: Option<i64>,
    pub chapter: String,
    pub section: String,
    pub pages: String,
    pub url: String,
    pub code: String,
    pub doi: String,
    pub isbn: String,
    pub note: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: String,
    pub status: PublicationStatus,
    pub external: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Publication {
    pub fn id_string(&self) -> String {
        self.id.map_or_else(String::new, |id| id.to_string())
    }

    pub fn first_author(&self) -> String {
        self.authors
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    }

    /// English month name, or an empty string for month 0 (unknown).
    pub fn month_name(&self) -> &'static str {
        if (1..=12).contains(&self.month) {
            MONTH_NAMES[(self.month - 1) as usize]
        } else {
            ""
        }
    }

    pub fn keywords_list(&self) -> Vec<String> {
        self.keywords
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn journal_or_book_title(&self) -> &str {
        if !self.journal.is_empty() {
            &self.journal
        } else {
            &self.book_title
        }
    }

    /// RIS reference type tag derived from the BibTeX type.
    pub fn ris_type(&self) -> &'static str {
        match self.bibtex_type.as_str() {
            "article" => "JOUR",
            "inproceedings" | "conference" | "proceedings" => "CONF",
            "book" => "BOOK",
            "incollection" | "inbook" => "CHAP",
            "techreport" => "RPRT",
            "phdthesis" | "mastersthesis" => "THES",
            "unpublished" => "UNPB",
            _ => "GEN",
        }
    }

    /// MODS genre string derived from the BibTeX type.
    pub fn mods_genre(&self) -> &'static str {
        match self.bibtex_type.as_str() {
            "article" => "academic journal",
            "inproceedings" | "conference" | "proceedings" => "conference publication",
            "book" | "incollection" | "inbook" => "book",
            "techreport" => "report",
            "phdthesis" | "mastersthesis" => "thesis",
            _ => "other",
        }
    }

    pub fn volume_string(&self) -> String {
        self.volume.map_or_else(String::new, |v| v.to_string())
    }

    pub fn number_string(&self) -> String {
        self.number.map_or_else(String::new, |n| n.to_string())
    }
}

/// A candidate field set produced by the BibTeX field mapper, ready for the
/// de-duplication check and insertion. Carries every mapped field except the
/// citekey, which is attached only when a fresh row is created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPublication {
    pub type_id: i64,
    pub title: String,
    pub authors: String,
    pub year: i64,
    pub month: i64,
    pub journal: String,
    pub book_title: String,
    pub publisher: String,
    pub institution: String,
    pub school: String,
    pub organization: String,
    pub location: String,
    pub country: String,
    pub volume: Option<i64>,
    pub number: Option<i64>,
    pub chapter: String,
    pub section: String,
    pub pages: String,
    pub url: String,
    pub code: String,
    pub doi: String,
    pub isbn: String,
    pub note: String,
    pub abstract_text: String,
    pub keywords: String,
    pub status: PublicationStatus,
    pub external: bool,
}

impl Default for NewPublication {
    fn default() -> Self {
        Self {
            type_id: 0,
            title: String::new(),
            authors: String::new(),
            year: 0,
            month: 0,
            journal: String::new(),
            book_title: String::new(),
            publisher: String::new(),
            institution: String::new(),
            school: String::new(),
            organization: String::new(),
            location: String::new(),
            country: String::new(),
            volume: None,
            number: None,
            chapter: String::new(),
            section: String::new(),
            pages: String::new(),
            url: String::new(),
            code: String::new(),
            doi: String::new(),
            isbn: String::new(),
            note: String::new(),
            abstract_text: String::new(),
            keywords: String::new(),
            status: PublicationStatus::Draft,
            external: false,
        }
    }
}
