//! Corpus types and the `urls.csv` on-disk format.
//!
//! The corpus file is the contract between acquisition and evaluation:
//! rows of `url,label` with labels `phish`/`legit`. The trainer and both
//! techniques recover everything else (artifact keys, stored variants)
//! from these rows alone.

pub mod feeds;
pub mod validator;

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ground-truth class of a corpus URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlClass {
    Phishing,
    Legitimate,
}

impl UrlClass {
    /// Corpus-file label string.
    pub fn label(self) -> &'static str {
        match self {
            UrlClass::Phishing => "phish",
            UrlClass::Legitimate => "legit",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "phish" => Some(UrlClass::Phishing),
            "legit" => Some(UrlClass::Legitimate),
            _ => None,
        }
    }

    /// Binary classification target (phishing is the positive class).
    pub fn as_target(self) -> u8 {
        match self {
            UrlClass::Phishing => 1,
            UrlClass::Legitimate => 0,
        }
    }
}

impl fmt::Display for UrlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A URL emitted by the feed aggregator, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub class: UrlClass,
}

/// A corpus row: URL plus ground-truth label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledUrl {
    pub url: String,
    pub class: UrlClass,
}

/// A page that passed the liveness and content-size checks.
#[derive(Debug, Clone)]
pub struct ValidatedPage {
    /// URL as emitted by the aggregator; this string keys the artifacts.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub html: String,
    pub rendered_at: DateTime<Utc>,
}

/// Write corpus rows as `url,label` CSV.
pub fn write_corpus(path: &Path, rows: &[LabeledUrl]) -> Result<()> {
    let mut out = String::from("url,label\n");
    for row in rows {
        out.push_str(&csv_field(&row.url));
        out.push(',');
        out.push_str(row.class.label());
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}

/// Read corpus rows from `url,label` CSV. Rows with unknown labels are
/// skipped with a warning.
pub fn read_corpus(path: &Path) -> Result<Vec<LabeledUrl>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus {}", path.display()))?;

    let mut rows = Vec::new();
    for (lineno, line) in content.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        let (Some(url), Some(label)) = (fields.first(), fields.get(1)) else {
            tracing::warn!("corpus line {} is malformed, skipping", lineno + 1);
            continue;
        };
        let Some(class) = UrlClass::from_label(label.trim()) else {
            tracing::warn!("corpus line {} has unknown label {label:?}, skipping", lineno + 1);
            continue;
        };
        rows.push(LabeledUrl {
            url: url.trim().to_string(),
            class,
        });
    }
    Ok(rows)
}

/// Quote a CSV field only when it needs it.
pub(crate) fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split one CSV line into fields, honoring double-quoted fields with
/// `""` escapes. Feed files (PhishTank, Cloudflare) quote freely.
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");

        let rows = vec![
            LabeledUrl {
                url: "https://phish.example/a?x=1,2".to_string(),
                class: UrlClass::Phishing,
            },
            LabeledUrl {
                url: "https://legit.example/".to_string(),
                class: UrlClass::Legitimate,
            },
        ];
        write_corpus(&path, &rows).unwrap();
        let read = read_corpus(&path).unwrap();
        assert_eq!(read, rows);
    }

    #[test]
    fn unknown_labels_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(&path, "url,label\nhttps://a.example,phish\nhttps://b.example,banana\n")
            .unwrap();
        let rows = read_corpus(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].class, UrlClass::Phishing);
    }

    #[test]
    fn split_handles_quoted_fields() {
        assert_eq!(
            split_csv_line(r#"1,"http://x.example/a,b","said ""hi""""#),
            vec!["1", "http://x.example/a,b", r#"said "hi""#]
        );
    }

    #[test]
    fn split_plain_line() {
        assert_eq!(split_csv_line("a,b,c"), vec!["a", "b", "c"]);
    }
}
