//! Domain DTOs for the characters service.
//!
//! # Design
//! `Character` is shared by the upstream API and the record store. Upstream
//! ids are numeric while store ids are opaque strings, so `id` accepts both
//! on the way in and is always a string on the way out. Every field carries a
//! serde default so that partially-populated documents still decode into the
//! full shape. A stored `null` reads the same as an absent field.

use serde::{Deserialize, Deserializer, Serialize};

/// Life status of a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Alive,
    Dead,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

/// A named link to another resource (origin or last known location).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
}

/// A character record, either mirrored from upstream or created locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default = "unknown_name", deserialize_with = "nullable_name")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Status,
    #[serde(default, deserialize_with = "nullable")]
    pub species: String,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub gender: Gender,
    #[serde(default, deserialize_with = "nullable")]
    pub origin: Reference,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Reference,
    #[serde(default, deserialize_with = "nullable")]
    pub image: String,
    #[serde(default, deserialize_with = "nullable")]
    pub episode: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub created: String,
}

pub(crate) const UNKNOWN_NAME: &str = "Unknown";

fn unknown_name() -> String {
    UNKNOWN_NAME.to_string()
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown_name))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// A caller-supplied subset of `Character` fields, used for create and
/// update. Absent fields are skipped on serialization so a store write only
/// carries what the caller sent. An `id` in the body is ignored, and on
/// create so are `url` and `created`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl CharacterPatch {
    /// Build a new record: omitted fields get their defaults, an empty name
    /// becomes "Unknown", `url` is always empty and `created` is always the
    /// given timestamp.
    pub fn into_character(self, created: String) -> Character {
        Character {
            id: String::new(),
            name: self
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(unknown_name),
            status: self.status.unwrap_or_default(),
            species: self.species.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            gender: self.gender.unwrap_or_default(),
            origin: self.origin.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
            episode: self.episode.unwrap_or_default(),
            url: String::new(),
            created,
        }
    }
}

/// A location mirrored from upstream. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub dimension: String,
    #[serde(default)]
    pub residents: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created: String,
}

/// Pagination metadata reported by upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: u64,
    pub pages: u64,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// A page of upstream results. `info` is absent when upstream had no match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<PageInfo>,
    pub results: Vec<T>,
}

impl<T> Info<T> {
    pub fn empty() -> Self {
        Self {
            info: None,
            results: Vec::new(),
        }
    }
}

/// Query parameters forwarded to the upstream character search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterFilter {
    pub page: Option<u32>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub species: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub gender: Option<String>,
}

impl CharacterFilter {
    /// Set fields as query pairs in the fixed order
    /// page, name, status, species, type, gender. Empty strings and a zero
    /// page count as unset.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page.filter(|p| *p > 0) {
            pairs.push(("page", page.to_string()));
        }
        let text = [
            ("name", &self.name),
            ("status", &self.status),
            ("species", &self.species),
            ("type", &self.kind),
            ("gender", &self.gender),
        ];
        for (key, value) in text {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }
}

/// Body returned by a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub success: bool,
}
