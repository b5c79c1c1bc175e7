use crate::bibtex::latex;
use biblatex::{Bibliography, Chunk, Entry};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// One BibTeX entry after parsing and LaTeX normalization, before field
/// mapping. Authors and keywords are already split; everything else sits in
/// `fields` keyed by the lowercase BibTeX field name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub citekey: String,
    pub entry_type: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub fields: BTreeMap<String, String>,
}

impl ParsedEntry {
    /// Citekey for error messages; keyless entries get a placeholder.
    pub fn display_key(&self) -> &str {
        if self.citekey.is_empty() {
            "<unnamed>"
        } else {
            &self.citekey
        }
    }
}

fn citekey_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+\s*\{\s*([^,\s{}]+)").unwrap())
}

/// Parses a whole BibTeX document. Entries are isolated from each other: a
/// malformed entry produces an error string and does not prevent the entries
/// around it from parsing.
pub fn parse_document(raw: &str) -> (Vec<ParsedEntry>, Vec<String>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for block in split_entry_blocks(raw) {
        match parse_block(&block) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(message) => errors.push(message),
        }
    }

    (entries, errors)
}

/// Splits the document into one string per `@type{...}` block by scanning for
/// balanced braces. Escaped braces do not count towards the balance. Text
/// between entries is ignored, as standard BibTeX treats it as commentary.
fn split_entry_blocks(raw: &str) -> Vec<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '@' {
            i += 1;
            continue;
        }

        let start = i;
        // skip over "@typename" to the opening brace
        let mut j = i + 1;
        while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j].is_whitespace()) {
            j += 1;
        }
        if j >= chars.len() || chars[j] != '{' {
            // not a well-formed entry head, resume scanning after the '@'
            i += 1;
            continue;
        }

        let mut depth = 0usize;
        let mut k = j;
        let mut closed = false;
        while k < chars.len() {
            match chars[k] {
                '\\' => {
                    k += 2;
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        closed = true;
                        break;
                    }
                }
                _ => {}
            }
            k += 1;
        }

        let end = if closed { k + 1 } else { chars.len() };
        blocks.push(chars[start..end].iter().collect());
        i = end;
    }

    blocks
}

/// Parses a single block. `@comment`, `@preamble` and `@string` blocks are
/// skipped; abbreviation definitions are not expanded into entry fields.
fn parse_block(block: &str) -> Result<Option<ParsedEntry>, String> {
    let head: String = block
        .trim_start()
        .chars()
        .skip(1)
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if matches!(
        head.to_lowercase().as_str(),
        "comment" | "preamble" | "string"
    ) {
        return Ok(None);
    }

    let key = guess_citekey(block);
    let bibliography = Bibliography::parse(block)
        .map_err(|e| format!("Unable to parse BibTeX entry \"{}\": {}", key, e))?;
    let entry = bibliography
        .iter()
        .next()
        .cloned()
        .ok_or_else(|| format!("Unable to parse BibTeX entry \"{}\"", key))?;

    // biblatex folds nonstandard types into one "unknown" variant, so the
    // type that error messages and type matching see comes from the head.
    Ok(Some(convert_entry(&entry, &head)))
}

fn guess_citekey(block: &str) -> String {
    citekey_re()
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Flattens a chunk list back into one string. Brace groups are re-emitted
/// so the LaTeX normalizer can tell command arguments (`\cite{...}`) apart
/// from plain grouping, and math stays delimited.
fn flatten_chunks(chunks: &[biblatex::Spanned<Chunk>]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        match &chunk.v {
            Chunk::Normal(text) => out.push_str(text),
            Chunk::Verbatim(text) => {
                out.push('{');
                out.push_str(text);
                out.push('}');
            }
            Chunk::Math(text) => {
                out.push('$');
                out.push_str(text);
                out.push('$');
            }
        }
    }
    out
}

fn convert_entry(entry: &Entry, raw_type: &str) -> ParsedEntry {
    let mut fields = BTreeMap::new();
    let mut authors = Vec::new();
    let mut keywords = Vec::new();

    for (name, chunks) in &entry.fields {
        let value = latex::normalize(flatten_chunks(chunks).trim());
        match name.as_str() {
            "author" => authors = split_authors(&value),
            // tags is a common non-standard alias for keywords
            "keywords" | "tags" => keywords.extend(split_keywords(&value)),
            _ => {
                fields.insert(name.to_lowercase(), value);
            }
        }
    }

    ParsedEntry {
        citekey: entry.key.clone(),
        entry_type: raw_type.to_string(),
        authors,
        keywords,
        fields,
    }
}

fn split_authors(value: &str) -> Vec<String> {
    value
        .split(" and ")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_keywords(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"@article{key1,
        title = {T},
        author = {Doe, J.},
        year = {2020},
    }"#;

    #[test]
    fn parses_single_entry() {
        let (entries, errors) = parse_document(ARTICLE);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.citekey, "key1");
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.fields.get("title").map(String::as_str), Some("T"));
        assert_eq!(entry.authors, vec!["Doe, J."]);
    }

    #[test]
    fn splits_multiple_entries() {
        let doc = format!(
            "{}\n\n@book{{key2,\n title = {{B}},\n author = {{A}},\n year = {{1999}}\n}}\n",
            ARTICLE
        );
        let (entries, errors) = parse_document(&doc);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].citekey, "key2");
        assert_eq!(entries[1].entry_type, "book");
    }

    #[test]
    fn malformed_entry_does_not_poison_neighbours() {
        let doc = ARTICLE.to_string() + "\n\n@article{broken,\n title = {unclosed\n";
        let (entries, _errors) = parse_document(&doc);
        assert!(entries.iter().any(|e| e.citekey == "key1"));
    }

    #[test]
    fn bad_block_reports_error_with_key() {
        let doc = "@article{badkey, !!! }\n\n".to_string() + ARTICLE;
        let (entries, errors) = parse_document(&doc);
        assert!(entries.iter().any(|e| e.citekey == "key1"));
        assert!(errors.iter().any(|e| e.contains("badkey")), "{:?}", errors);
    }

    #[test]
    fn nonstandard_entry_type_is_kept_verbatim() {
        let doc = r#"@widget{w1,
            title = {T},
            author = {A},
            year = {2020},
        }"#;
        let (entries, errors) = parse_document(doc);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(entries[0].entry_type, "widget");
    }

    #[test]
    fn skips_comment_and_string_blocks() {
        let doc = format!("@comment{{ignore me}}\n@string{{x = {{y}}}}\n{}", ARTICLE);
        let (entries, errors) = parse_document(&doc);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn splits_authors_and_keywords() {
        let doc = r#"@article{k,
            title = {T},
            author = {Doe, John and Smith, Anna},
            year = {2020},
            keywords = {voting; privacy, crypto},
        }"#;
        let (entries, errors) = parse_document(doc);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(entries[0].authors, vec!["Doe, John", "Smith, Anna"]);
        assert_eq!(entries[0].keywords, vec!["voting", "privacy", "crypto"]);
    }

    #[test]
    fn normalizes_latex_in_values() {
        let doc = r#"@article{k,
            title = {K\"onig's {Theorem}},
            author = {K\"onig, D.},
            year = {1931},
        }"#;
        let (entries, errors) = parse_document(doc);
        assert!(errors.is_empty(), "{:?}", errors);
        let title = entries[0].fields.get("title").unwrap();
        assert!(title.contains("König"), "{:?}", title);
        assert!(!title.contains('{'), "{:?}", title);
    }

    #[test]
    fn display_key_falls_back_for_unnamed() {
        let entry = ParsedEntry {
            citekey: String::new(),
            entry_type: "misc".to_string(),
            authors: vec![],
            keywords: vec![],
            fields: BTreeMap::new(),
        };
        assert_eq!(entry.display_key(), "<unnamed>");
    }
}
