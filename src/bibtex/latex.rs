use regex::Regex;
use std::sync::OnceLock;

// Known LaTeX accent sequences and their Unicode equivalents. Longer
// (grouped) spellings come first so they win over the bare forms.
const ACCENTS: [(&str, &str); 62] = [
    (r#"\"{a}"#, "ä"),
    (r#"{\"a}"#, "ä"),
    (r#"\"a"#, "ä"),
    (r#"\"{A}"#, "Ä"),
    (r#"{\"A}"#, "Ä"),
    (r#"\"A"#, "Ä"),
    (r#"\"{o}"#, "ö"),
    (r#"{\"o}"#, "ö"),
    (r#"\"o"#, "ö"),
    (r#"\"{O}"#, "Ö"),
    (r#"{\"O}"#, "Ö"),
    (r#"\"O"#, "Ö"),
    (r#"\"{u}"#, "ü"),
    (r#"{\"u}"#, "ü"),
    (r#"\"u"#, "ü"),
    (r#"\"{U}"#, "Ü"),
    (r#"{\"U}"#, "Ü"),
    (r#"\"U"#, "Ü"),
    (r"\'{a}", "á"),
    (r"{\'a}", "á"),
    (r"\'a", "á"),
    (r"\'{A}", "Á"),
    (r"{\'A}", "Á"),
    (r"\'A", "Á"),
    (r"\'{e}", "é"),
    (r"{\'e}", "é"),
    (r"\'e", "é"),
    (r"\'{E}", "É"),
    (r"{\'E}", "É"),
    (r"\'E", "É"),
    (r"\'{o}", "ó"),
    (r"{\'o}", "ó"),
    (r"\'o", "ó"),
    (r"\'{O}", "Ó"),
    (r"{\'O}", "Ó"),
    (r"\'O", "Ó"),
    (r"\'{u}", "ú"),
    (r"{\'u}", "ú"),
    (r"\'u", "ú"),
    (r"\'{U}", "Ú"),
    (r"{\'U}", "Ú"),
    (r"\'U", "Ú"),
    (r"\`{a}", "à"),
    (r"{\`a}", "à"),
    (r"\`a", "à"),
    (r"\`{A}", "À"),
    (r"{\`A}", "À"),
    (r"\`A", "À"),
    (r"\`{e}", "è"),
    (r"{\`e}", "è"),
    (r"\`e", "è"),
    (r"\`{E}", "È"),
    (r"{\`E}", "È"),
    (r"\`E", "È"),
    (r"\`u", "ù"),
    (r"\`U", "Ù"),
    (r"\`o", "ò"),
    (r"\`O", "Ò"),
    (r"\^o", "ô"),
    (r"\^O", "Ô"),
    (r"\ss", "ß"),
    (r"\ae", "æ"),
];

fn text_grouping_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\\text\{)(\\[^{}]*)(\})").unwrap())
}

fn command_tail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\[a-zA-Z]+$").unwrap())
}

/// Some upstream exporters emit accent macros wrapped in `\text{...}` without
/// the inner grouping braces, e.g. `\text{\^e}`. Re-wraps those into the
/// well-formed `\text{{\^e}}` so downstream rendering is not broken. Already
/// well-formed input is untouched (the inner text must start with a bare
/// macro for the rewrite to fire).
pub fn fix_text_grouping(text: &str) -> String {
    text_grouping_re()
        .replace_all(text, "$1{$2}$3")
        .into_owned()
}

/// Removes curly braces that serve purely as LaTeX grouping. Braces that form
/// the argument group of a command (`\text{...}`, `\cite{...}`) are kept, as
/// are escaped `\{`/`\}` sequences, which denote literal braces rather than
/// grouping.
fn strip_grouping_braces(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut keep_stack: Vec<bool> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        match c {
            '{' => {
                let attached_to_command = command_tail_re().is_match(&out);
                let nested_in_kept = out.ends_with('{') && keep_stack.last() == Some(&true);
                let keep = attached_to_command || nested_in_kept;
                keep_stack.push(keep);
                if keep {
                    out.push('{');
                }
            }
            '}' => match keep_stack.pop() {
                Some(true) => out.push('}'),
                Some(false) => {}
                // Unbalanced closer, leave it alone.
                None => out.push('}'),
            },
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Converts LaTeX-escaped text to plain Unicode: fixes the `\text{}` grouping
/// bug, decodes the accent table, collapses escaped spaces and strips
/// grouping braces. Idempotent, and a no-op on text without LaTeX markup.
pub fn normalize(text: &str) -> String {
    let mut s = fix_text_grouping(text);
    for (tex, unicode) in ACCENTS {
        if s.contains(tex) {
            s = s.replace(tex, unicode);
        }
    }
    let s = s.replace("\\ ", " ");
    strip_grouping_braces(&s)
}
