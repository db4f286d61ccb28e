//! Curated fallback catalog.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tod_core::{ContentType, DifficultyLevel};

/// Built-in catalog, embedded at compile time.
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// `type -> level -> entries`, keyed by canonical wire names.
type CatalogFile = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Hand-written cards for every (type, level) pair.
///
/// Construction guarantees every pair has at least one non-blank entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCatalog {
    entries: BTreeMap<(ContentType, DifficultyLevel), Vec<String>>,
}

impl FallbackCatalog {
    /// The built-in Hebrew catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parse a catalog from TOML.
    ///
    /// Entries are trimmed and blank ones dropped. Fails if any pair ends up empty.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::check_keys(&file)?;

        let mut entries = BTreeMap::new();
        for content_type in ContentType::ALL {
            for level in DifficultyLevel::ALL {
                let list: Vec<String> = file
                    .get(content_type.name())
                    .and_then(|levels| levels.get(level.name()))
                    .into_iter()
                    .flatten()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();

                if list.is_empty() {
                    return Err(CatalogError::EmptyPair {
                        content_type,
                        level,
                    });
                }
                entries.insert((content_type, level), list);
            }
        }

        Ok(Self { entries })
    }

    fn check_keys(file: &CatalogFile) -> Result<(), CatalogError> {
        for (type_key, levels) in file {
            if ContentType::ALL.iter().all(|t| t.name() != type_key.as_str()) {
                return Err(CatalogError::UnknownKey(type_key.clone()));
            }
            for level_key in levels.keys() {
                if DifficultyLevel::ALL.iter().all(|l| l.name() != level_key.as_str()) {
                    return Err(CatalogError::UnknownKey(format!("{}.{}", type_key, level_key)));
                }
            }
        }
        Ok(())
    }

    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Entries for a pair. Never empty.
    pub fn entries(&self, content_type: ContentType, level: DifficultyLevel) -> &[String] {
        self.entries
            .get(&(content_type, level))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total entries across all pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog loading errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown catalog key: {0}")]
    UnknownKey(String),

    #[error("Catalog has no entries for {content_type:?}/{level:?}")]
    EmptyPair {
        content_type: ContentType,
        level: DifficultyLevel,
    },
}
