//! Read-only catalog of knot descriptions for the browsing screens.
//!
//! # Design
//! The catalog is plain data parsed once into a `StaticCatalog` and handed to
//! whoever needs it. Nothing mutates it after construction. The bundled
//! entries live in `data/catalog.json`, in the order the app lists them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Class labels the classification server can return.
pub const SUPPORTED_CLASSES: [&str; 13] = [
    "Nudo Ahorcado",
    "Nudo Calabrote",
    "Nudo Cote",
    "Nudo Empaquetador",
    "Nudo Llano",
    "Nudo Llano Doble",
    "Nudo Margarita",
    "Nudo Mariposa",
    "Nudo Pescador",
    "Nudo Pescador Doble",
    "Nudo Zarpa de Gato",
    "Nudo de Doble Lazo",
    "Nudo de Ocho",
];

/// How hard a knot is to tie. Serialized with the catalog's own labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Fácil")]
    Easy,
    #[serde(rename = "Intermedia")]
    Intermediate,
    #[serde(rename = "Difícil")]
    Hard,
}

impl Difficulty {
    /// Label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Fácil",
            Difficulty::Intermediate => "Intermedia",
            Difficulty::Hard => "Difícil",
        }
    }
}

/// One pre-authored knot description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnotCatalogEntry {
    pub name: String,
    /// Name of the illustration asset in the host app.
    pub image_ref: String,
    pub description: String,
    pub uses: Vec<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog lists {0:?} more than once")]
    DuplicateName(String),
}

/// Source of catalog entries for the browsing UI.
pub trait CatalogProvider {
    fn entries(&self) -> &[KnotCatalogEntry];

    fn find(&self, name: &str) -> Option<&KnotCatalogEntry> {
        self.entries().iter().find(|e| e.name == name)
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Immutable in-memory catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCatalog {
    entries: Vec<KnotCatalogEntry>,
}

impl StaticCatalog {
    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse a JSON array of entries. Names must be unique.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<KnotCatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn new(entries: Vec<KnotCatalogEntry>) -> Result<Self, CatalogError> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.name == entry.name) {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }
}

impl CatalogProvider for StaticCatalog {
    fn entries(&self) -> &[KnotCatalogEntry] {
        &self.entries
    }
}
