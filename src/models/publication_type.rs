use serde::{Deserialize, Serialize};

/// A configured publication type, mapping one or more BibTeX type strings
/// (e.g. "inproceedings, conference") to a single internal type.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicationType {
    pub id: i64,
    pub title: String,
    pub bibtex_types: String,
    pub hidden: bool,
}

impl PublicationType {
    pub fn bibtex_type_list(&self) -> Vec<&str> {
        self.bibtex_types
            .split(',')
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bibtex_type_list_splits_and_trims() {
        let t = PublicationType {
            id: 1,
            title: "Conference paper".to_string(),
            bibtex_types: "inproceedings, conference".to_string(),
            hidden: false,
        };
        assert_eq!(t.bibtex_type_list(), vec!["inproceedings", "conference"]);
    }
}
