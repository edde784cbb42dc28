//! Level-pack catalog, loaded once at process start.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One challenge statement within a level pack.
///
/// `level` is the ordinal shown to players; it comes from the catalog
/// file verbatim rather than being derived from position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub level: u32,
    pub problem: String,
}

/// Errors raised while loading the catalog.
///
/// All of them are fatal at startup; a server with no problems to pose
/// is not worth running.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read level catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse level catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level catalog contains no packs")]
    Empty,
}

/// Named, ordered collections of [`Problem`]s.
///
/// Parsed from JSON shaped `{"Pack Name": [{"level": 1, "problem": "…"}]}`
/// and shared read-only across every room playing a pack.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    packs: HashMap<String, Arc<[Problem]>>,
}

impl LevelCatalog {
    /// Parses a catalog from raw JSON.
    ///
    /// # Errors
    /// Fails on malformed JSON or a catalog with zero packs. A pack with
    /// zero problems is accepted here and rejected when a round starts.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let packs: HashMap<String, Vec<Problem>> = serde_json::from_str(raw)?;
        if packs.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self {
            packs: packs
                .into_iter()
                .map(|(name, problems)| (name, problems.into()))
                .collect(),
        })
    }

    /// Reads and parses the catalog file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Returns the problems of the named pack, if it exists.
    ///
    /// The handle shares storage with the catalog; rooms keep it for
    /// their lifetime without copying problem text.
    pub fn get(&self, name: &str) -> Option<Arc<[Problem]>> {
        self.packs.get(name).cloned()
    }

    /// Pack names in sorted order, for stable client listings.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.packs.keys().cloned().collect();
        names.sort();
        names
    }
}
