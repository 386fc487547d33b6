// src/listing.rs
// Turns the daemon's column-aligned `ollama list` text into model records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^NAME\s+").expect("static header pattern"));
static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("static column pattern"));

/// Number of columns in a full listing row: NAME, ID, SIZE, MODIFIED.
const FULL_ROW_COLUMNS: usize = 4;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelRecord {
    pub name: String,
    pub id: Option<String>,
    pub size: Option<String>,
    pub modified: Option<String>,
}

impl ModelRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Parses a listing into records, unique by name in first-seen order.
///
/// Never fails: lines that fit neither the four-column layout nor the
/// first-token fallback are skipped.
pub fn parse(text: &str) -> Vec<ModelRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let Some(first) = lines.first() else {
        return Vec::new();
    };
    let start = usize::from(HEADER.is_match(first));

    let rows = lines[start..]
        .iter()
        .filter_map(|line| parse_columns(line).or_else(|| parse_first_token(line)));

    dedup_by_name(rows)
}

/// Splits a row on runs of two or more whitespace characters.
pub fn split_columns(line: &str) -> Vec<&str> {
    COLUMN_GAP
        .split(line)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

/// Column-aligned extraction. `None` when the row has fewer than four fields.
pub fn parse_columns(line: &str) -> Option<ModelRecord> {
    let fields = split_columns(line);
    if fields.len() < FULL_ROW_COLUMNS {
        return None;
    }
    Some(ModelRecord {
        name: fields[0].to_string(),
        id: Some(fields[1].to_string()),
        size: Some(fields[2].to_string()),
        modified: Some(fields[3..].join(" ")),
    })
}

/// First-token extraction: the leading run of non-whitespace becomes the name.
pub fn parse_first_token(line: &str) -> Option<ModelRecord> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    line.split_whitespace().next().map(ModelRecord::named)
}

fn dedup_by_name(rows: impl IntoIterator<Item = ModelRecord>) -> Vec<ModelRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert(r.name.clone()))
        .collect()
}

/// Case-insensitive substring match of `query` against `"{name} {id}"`.
pub fn filter_models<'a>(models: &'a [ModelRecord], query: &str) -> Vec<&'a ModelRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return models.iter().collect();
    }
    models
        .iter()
        .filter(|m| {
            format!("{} {}", m.name, m.id.as_deref().unwrap_or_default())
                .to_lowercase()
                .contains(&needle)
        })
        .collect()
}
