//! Built-in monster catalog.
//!
//! Compiled in from `data/monster_catalog.json`; `MONSTER_CATALOG_PATH` may point at a
//! replacement file with the same layout.

use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::threshold::{threshold_for, DropRate, KillThreshold};

pub const BUILTIN_MONSTER_CATALOG: &str = include_str!("data/monster_catalog.json");

/// One row of the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub rarest_drop: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub exempt: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub monsters: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterDefinition {
    pub name: String,
    pub rarest_drop: String,
    pub rate: DropRate,
    pub threshold: KillThreshold,
}

impl MonsterDefinition {
    pub fn new(name: impl Into<String>, rarest_drop: impl Into<String>, rate: DropRate) -> Self {
        Self {
            name: name.into(),
            rarest_drop: rarest_drop.into(),
            rate,
            threshold: threshold_for(rate),
        }
    }

    pub fn is_exempt(&self) -> bool {
        self.threshold.is_infinite()
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse monster catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read monster catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("catalog entry '{name}' is invalid: {reason}")]
    InvalidEntry { name: String, reason: &'static str },
}

/// Read-only name -> definition table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct MonsterCatalog {
    entries: HashMap<String, MonsterDefinition>,
}

impl MonsterCatalog {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            MonsterCatalog::from_json_str(BUILTIN_MONSTER_CATALOG)
                .expect("builtin monster catalog should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        MonsterCatalog::from_entries(file.monsters)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        MonsterCatalog::from_json_str(&contents)
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut table = HashMap::with_capacity(entries.len());
        for entry in entries {
            let rate = match (entry.exempt, entry.denominator) {
                (true, _) => DropRate::Exempt,
                (false, Some(denominator)) => DropRate::from_denominator(denominator).ok_or(
                    CatalogError::InvalidEntry {
                        name: entry.name.clone(),
                        reason: "denominator must be positive",
                    },
                )?,
                (false, None) => {
                    return Err(CatalogError::InvalidEntry {
                        name: entry.name,
                        reason: "needs either a denominator or exempt=true",
                    });
                }
            };
            let definition = MonsterDefinition::new(entry.name, entry.rarest_drop, rate);
            table.insert(definition.name.clone(), definition);
        }
        Ok(Self { entries: table })
    }

    pub fn get(&self, name: &str) -> Option<&MonsterDefinition> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions sorted by name.
    pub fn definitions(&self) -> Vec<&MonsterDefinition> {
        let mut definitions: Vec<_> = self.entries.values().collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }
}

pub fn load_monster_catalog_from_env() -> Arc<MonsterCatalog> {
    let Some(path) = env::var("MONSTER_CATALOG_PATH").ok().map(PathBuf::from) else {
        return MonsterCatalog::builtin();
    };

    match MonsterCatalog::from_file(&path) {
        Ok(catalog) => {
            tracing::info!(
                target: "fifty_fifty::config",
                path = %path.display(),
                monsters = catalog.len(),
                "monster_catalog.loaded=file"
            );
            Arc::new(catalog)
        }
        Err(err) => {
            tracing::warn!(
                target: "fifty_fifty::config",
                path = %path.display(),
                error = %err,
                "monster_catalog.load_failed"
            );
            MonsterCatalog::builtin()
        }
    }
}
