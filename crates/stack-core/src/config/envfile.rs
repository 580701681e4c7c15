//! `KEY=value` source files
//!
//! [`parse_entries`] is the read path used by the cascade. [`EnvDocument`] is
//! the write path: it keeps every line it does not understand byte-for-byte
//! and only rewrites the entries it is asked to change.

/// One `KEY=value` assignment read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    /// 1-based line number in the source
    pub line: usize,
}

/// Check that `key` is a shell-style variable name.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse one line into a key and value.
///
/// Returns `None` for blank lines, comments and anything that is not an
/// assignment.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let assignment = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = assignment.split_once('=')?;
    let key = key.trim();
    if !is_valid_key(key) {
        return None;
    }
    Some((key.to_string(), unquote(value.trim()).to_string()))
}

/// Parse all assignments in `content`, in file order.
pub fn parse_entries(content: &str) -> Vec<EnvEntry> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let parsed = parse_line(line);
            if parsed.is_none() && looks_like_garbage(line) {
                tracing::debug!(line = idx + 1, "Ignoring unparseable line");
            }
            parsed.map(|(key, value)| EnvEntry {
                key,
                value,
                line: idx + 1,
            })
        })
        .collect()
}

fn looks_like_garbage(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Render an assignment that [`parse_line`] reads back as `value`.
///
/// The reader trims the value and strips one pair of matching outer quotes,
/// with no escapes, so wrapping in double quotes always round-trips.
pub fn format_entry(key: &str, value: &str) -> String {
    let needs_quotes = value.trim() != value
        || value.chars().any(|c| c.is_whitespace() || c == '#')
        || unquote(value).len() != value.len();
    if needs_quotes {
        format!("{key}=\"{value}\"")
    } else {
        format!("{key}={value}")
    }
}

#[derive(Debug, Clone)]
enum Line {
    Entry {
        key: String,
        exported: bool,
        raw: String,
    },
    Verbatim(String),
}

/// A source file held as lines for targeted, content-preserving edits.
#[derive(Debug, Clone, Default)]
pub struct EnvDocument {
    lines: Vec<Line>,
    trailing_newline: bool,
}

impl EnvDocument {
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .map(|raw| match parse_line(raw) {
                Some((key, _)) => Line::Entry {
                    key,
                    exported: raw.trim_start().starts_with("export "),
                    raw: raw.to_string(),
                },
                None => Line::Verbatim(raw.to_string()),
            })
            .collect();

        Self {
            lines,
            trailing_newline: content.is_empty() || content.ends_with('\n'),
        }
    }

    /// The value a reader would see for `key` (last assignment wins).
    pub fn get(&self, key: &str) -> Option<String> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, raw, .. } if k == key => parse_line(raw).map(|(_, v)| v),
            _ => None,
        })
    }

    /// Set `key` to `value`.
    ///
    /// Every existing assignment of the key is rewritten in place; if there is
    /// none the assignment is appended. Returns `true` if the document changed.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let mut found = false;
        let mut changed = false;

        for line in &mut self.lines {
            if let Line::Entry {
                key: k,
                exported,
                raw,
            } = line
                && k == key
            {
                found = true;
                let mut rendered = format_entry(key, value);
                if *exported {
                    rendered = format!("export {rendered}");
                }
                if *raw != rendered {
                    *raw = rendered;
                    changed = true;
                }
            }
        }

        if !found {
            self.lines.push(Line::Entry {
                key: key.to_string(),
                exported: false,
                raw: format_entry(key, value),
            });
            changed = true;
        }

        changed
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, .. } => Some(key.as_str()),
            Line::Verbatim(_) => None,
        })
    }

    pub fn render(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(|line| match line {
                Line::Entry { raw, .. } => raw.as_str(),
                Line::Verbatim(raw) => raw.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline && !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let entries = parse_entries("# header\n\nA=1\n  # indented comment\nB = two\n");
        let pairs: Vec<_> = entries.iter().map(|e| (e.key.as_str(), e.value.as_str())).collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "two")]);
        assert_eq!(entries[1].line, 5);
    }

    #[test]
    fn parse_strips_export_and_quotes() {
        let entries = parse_entries("export NAME=\"hello world\"\nSINGLE='x'\nMIXED=\"y'\n");
        assert_eq!(entries[0].key, "NAME");
        assert_eq!(entries[0].value, "hello world");
        assert_eq!(entries[1].value, "x");
        assert_eq!(entries[2].value, "\"y'");
    }

    #[test]
    fn parse_keeps_equals_inside_value() {
        let entries = parse_entries("DATABASE_URL=postgres://u:p@h:5432/db?sslmode=disable\n");
        assert_eq!(entries[0].value, "postgres://u:p@h:5432/db?sslmode=disable");
    }

    #[test]
    fn parse_ignores_invalid_keys_and_non_assignments() {
        let entries = parse_entries("1BAD=x\nnot an assignment\nGOOD_KEY=ok\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "GOOD_KEY");
    }

    #[test]
    fn document_set_preserves_everything_else() {
        let original = "# Team settings\nPROJECT_NAME=My App\n\n# odd line kept\n!!weird!!\nexport DEBUG=yes\n";
        let mut doc = EnvDocument::parse(original);

        assert!(doc.set("PROJECT_NAME", "my-app"));
        assert!(doc.set("DEBUG", "true"));

        assert_eq!(
            doc.render(),
            "# Team settings\nPROJECT_NAME=my-app\n\n# odd line kept\n!!weird!!\nexport DEBUG=true\n"
        );
    }

    #[test]
    fn document_set_appends_missing_key() {
        let mut doc = EnvDocument::parse("A=1\n");
        assert!(doc.set("B", "two words"));
        assert_eq!(doc.render(), "A=1\nB=\"two words\"\n");
        assert_eq!(doc.get("B").as_deref(), Some("two words"));
    }

    #[rstest]
    #[case("plain")]
    #[case("")]
    #[case("two words")]
    #[case("  padded  ")]
    #[case("say \"hi there\"")]
    #[case("'x'")]
    #[case("\"quoted\"")]
    #[case("\"")]
    #[case("a#b")]
    #[case("it's")]
    fn formatted_entry_reads_back_unchanged(#[case] value: &str) {
        let line = format_entry("K", value);
        assert_eq!(parse_line(&line), Some(("K".to_string(), value.to_string())), "{line}");

        let mut doc = EnvDocument::parse("K=old\n");
        doc.set("K", value);
        assert_eq!(doc.get("K").as_deref(), Some(value));
        assert_eq!(parse_entries(&doc.render())[0].value, value);
    }

    #[test]
    fn document_set_same_value_is_no_change() {
        let mut doc = EnvDocument::parse("A=1\n");
        assert!(!doc.set("A", "1"));
    }

    #[test]
    fn document_without_trailing_newline_round_trips() {
        let doc = EnvDocument::parse("A=1\n# end");
        assert_eq!(doc.render(), "A=1\n# end");
    }

    #[test]
    fn document_get_returns_last_assignment() {
        let doc = EnvDocument::parse("A=1\nA=2\n");
        assert_eq!(doc.get("A").as_deref(), Some("2"));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["A", "A"]);
    }
}
