//! Series document schema validation.
//!
//! A series document is a JSON object with five string fields and a
//! `chapters` map. Chapter entries are lenient: malformed entries are
//! skipped, and the document only fails when no entry carries at least one
//! non-blank group link.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::Chapter;

/// Root string fields, checked in this order before `chapters`.
pub const REQUIRED_STRING_FIELDS: [&str; 5] = ["title", "description", "artist", "author", "cover"];

/// Why a document failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("root is not an object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid type for field: {field} (expected {expected})")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("chapters is empty")]
    EmptyChapters,

    #[error("no valid chapters found")]
    NoValidChapters,
}

/// A document that passed validation, with only the valid chapters kept.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDocument {
    pub title: String,
    pub description: String,
    pub artist: String,
    pub author: String,
    pub cover: String,
    pub chapters: BTreeMap<String, Chapter>,
}

/// Validate a parsed JSON value against the series schema.
pub fn validate_series(value: &Value) -> Result<SeriesDocument, SchemaError> {
    let root = value.as_object().ok_or(SchemaError::NotAnObject)?;

    let [title, description, artist, author, cover] = REQUIRED_STRING_FIELDS;
    let title = string_field(root, title)?;
    let description = string_field(root, description)?;
    let artist = string_field(root, artist)?;
    let author = string_field(root, author)?;
    let cover = string_field(root, cover)?;

    let raw_chapters = match root.get("chapters") {
        None => return Err(SchemaError::MissingField("chapters")),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(SchemaError::WrongType { field: "chapters", expected: "object" }),
    };

    if raw_chapters.is_empty() {
        return Err(SchemaError::EmptyChapters);
    }

    let chapters: BTreeMap<String, Chapter> = raw_chapters
        .iter()
        .filter_map(|(key, entry)| valid_chapter(entry).map(|chapter| (key.clone(), chapter)))
        .collect();

    if chapters.is_empty() {
        return Err(SchemaError::NoValidChapters);
    }

    Ok(SeriesDocument { title, description, artist, author, cover, chapters })
}

fn string_field(root: &Map<String, Value>, field: &'static str) -> Result<String, SchemaError> {
    match root.get(field) {
        None => Err(SchemaError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SchemaError::WrongType { field, expected: "string" }),
    }
}

fn valid_chapter(entry: &Value) -> Option<Chapter> {
    let entry = entry.as_object()?;
    let groups = entry.get("groups")?.as_object()?;

    let groups: BTreeMap<String, String> = groups
        .iter()
        .filter_map(|(name, link)| match link {
            Value::String(s) if !s.trim().is_empty() => Some((name.clone(), s.clone())),
            _ => None,
        })
        .collect();

    if groups.is_empty() {
        return None;
    }

    Some(Chapter { title: text_field(entry, "title"), volume: text_field(entry, "volume"), groups })
}

/// Render a loosely-typed chapter field as text.
fn text_field(entry: &Map<String, Value>, key: &str) -> String {
    match entry.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
