//! Two-tier monster lookup: user overrides first, then the built-in catalog,
//! then the configured default budget.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{CatalogEntry, MonsterCatalog};
use crate::store::{load_json_or_default, save_json, ConfigStore};
use crate::threshold::{
    denominator_for, drop_rate_for, threshold_for, DropRate, KillThreshold,
};

pub const CUSTOM_THRESHOLDS_KEY: &str = "customThresholds";
pub const CUSTOM_DROPS_KEY: &str = "customDrops";
pub const EXEMPT_MONSTERS_KEY: &str = "exemptMonsters";

pub const UNKNOWN_DROP_LABEL: &str = "Unknown";
pub const DEFAULT_KILL_THRESHOLD: u32 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("monster name must not be empty")]
    EmptyName,
    #[error("drop rate for '{name}' must be in (0, 1], got {rate}")]
    InvalidDropRate { name: String, rate: f64 },
    #[error("kill threshold for '{name}' must be at least 1")]
    ZeroThreshold { name: String },
}

/// A user-authored definition that shadows the catalog entry of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideEntry {
    pub threshold: KillThreshold,
    pub rarest_drop: String,
    pub exempt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionSource {
    Override,
    Catalog,
    Default,
}

/// Everything the registry knows about one name.
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterProfile {
    pub name: String,
    pub rarest_drop: String,
    pub rate: Option<DropRate>,
    pub threshold: KillThreshold,
    pub exempt: bool,
    pub source: DefinitionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

#[derive(Debug, Clone, Copy)]
pub struct RegistrySettings {
    pub default_threshold: u32,
    pub use_catalog: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_KILL_THRESHOLD,
            use_catalog: true,
        }
    }
}

pub struct MonsterRegistry {
    catalog: Arc<MonsterCatalog>,
    overrides: RwLock<HashMap<String, OverrideEntry>>,
    write_gate: Mutex<()>,
    store: Arc<dyn ConfigStore>,
    default_threshold: AtomicU32,
    use_catalog: AtomicBool,
}

impl MonsterRegistry {
    /// Build the registry with `catalog` as the base tier and persisted overrides merged on top.
    pub fn load(
        catalog: Arc<MonsterCatalog>,
        store: Arc<dyn ConfigStore>,
        settings: RegistrySettings,
    ) -> Self {
        let overrides = load_overrides(store.as_ref());
        info!(
            target: "fifty_fifty::registry",
            catalog = catalog.len(),
            overrides = overrides.len(),
            "registry.loaded"
        );
        Self {
            catalog,
            overrides: RwLock::new(overrides),
            write_gate: Mutex::new(()),
            store,
            default_threshold: AtomicU32::new(settings.default_threshold.max(1)),
            use_catalog: AtomicBool::new(settings.use_catalog),
        }
    }

    pub fn set_default_threshold(&self, threshold: u32) {
        self.default_threshold
            .store(threshold.max(1), Ordering::Relaxed);
    }

    pub fn default_threshold(&self) -> KillThreshold {
        KillThreshold::Finite(self.default_threshold.load(Ordering::Relaxed))
    }

    /// Toggle the built-in catalog tier.
    pub fn set_use_catalog(&self, enabled: bool) {
        self.use_catalog.store(enabled, Ordering::Relaxed);
    }

    fn catalog_entry(&self, name: &str) -> Option<&crate::catalog::MonsterDefinition> {
        if self.use_catalog.load(Ordering::Relaxed) {
            self.catalog.get(name)
        } else {
            None
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.overrides.read().contains_key(name) || self.catalog_entry(name).is_some()
    }

    pub fn threshold(&self, name: &str) -> KillThreshold {
        if let Some(entry) = self.overrides.read().get(name) {
            return entry.threshold;
        }
        if let Some(definition) = self.catalog_entry(name) {
            return definition.threshold;
        }
        self.default_threshold()
    }

    pub fn is_exempt(&self, name: &str) -> bool {
        self.threshold(name).is_infinite()
    }

    pub fn rarest_drop_label(&self, name: &str) -> String {
        if let Some(entry) = self.overrides.read().get(name) {
            return entry.rarest_drop.clone();
        }
        self.catalog_entry(name)
            .map(|definition| definition.rarest_drop.clone())
            .unwrap_or_else(|| UNKNOWN_DROP_LABEL.to_string())
    }

    /// Catalog rate, or the rate that reproduces an override's budget.
    pub fn drop_rate(&self, name: &str) -> Option<DropRate> {
        if let Some(entry) = self.overrides.read().get(name) {
            if entry.exempt {
                return Some(DropRate::Exempt);
            }
            return Some(drop_rate_for(entry.threshold));
        }
        self.catalog_entry(name).map(|definition| definition.rate)
    }

    pub fn profile(&self, name: &str) -> MonsterProfile {
        if let Some(entry) = self.overrides.read().get(name).cloned() {
            let rate = if entry.exempt {
                DropRate::Exempt
            } else {
                drop_rate_for(entry.threshold)
            };
            return MonsterProfile {
                name: name.to_string(),
                rarest_drop: entry.rarest_drop,
                rate: Some(rate),
                threshold: entry.threshold,
                exempt: entry.exempt,
                source: DefinitionSource::Override,
            };
        }
        if let Some(definition) = self.catalog_entry(name) {
            return MonsterProfile {
                name: name.to_string(),
                rarest_drop: definition.rarest_drop.clone(),
                rate: Some(definition.rate),
                threshold: definition.threshold,
                exempt: definition.is_exempt(),
                source: DefinitionSource::Catalog,
            };
        }
        MonsterProfile {
            name: name.to_string(),
            rarest_drop: UNKNOWN_DROP_LABEL.to_string(),
            rate: None,
            threshold: self.default_threshold(),
            exempt: false,
            source: DefinitionSource::Default,
        }
    }

    /// Add or replace the override for `name` and persist the override set.
    ///
    /// With `exempt` the rate is ignored and the budget is infinite.
    pub fn upsert_override(
        &self,
        name: &str,
        rarest_drop: &str,
        rate: DropRate,
        exempt: bool,
    ) -> Result<UpsertOutcome, RegistryError> {
        let name = validate_name(name)?;
        let threshold = if exempt {
            KillThreshold::Infinite
        } else {
            match rate {
                DropRate::Exempt => KillThreshold::Infinite,
                DropRate::Chance(p) if p > 0.0 && p <= 1.0 => threshold_for(rate),
                DropRate::Chance(p) => {
                    return Err(RegistryError::InvalidDropRate {
                        name: name.to_string(),
                        rate: p,
                    });
                }
            }
        };
        Ok(self.store_override(name, rarest_drop, threshold, exempt))
    }

    /// Edit an override by budget instead of by rate.
    pub fn upsert_override_by_threshold(
        &self,
        name: &str,
        rarest_drop: &str,
        threshold: u32,
    ) -> Result<UpsertOutcome, RegistryError> {
        let name = validate_name(name)?;
        if threshold == 0 {
            return Err(RegistryError::ZeroThreshold {
                name: name.to_string(),
            });
        }
        let threshold = KillThreshold::try_from(i64::from(threshold))
            .unwrap_or(KillThreshold::Infinite);
        Ok(self.store_override(name, rarest_drop, threshold, false))
    }

    fn store_override(
        &self,
        name: &str,
        rarest_drop: &str,
        threshold: KillThreshold,
        exempt: bool,
    ) -> UpsertOutcome {
        let _gate = self.write_gate.lock();
        let outcome = if self.is_defined(name) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Added
        };
        self.overrides.write().insert(
            name.to_string(),
            OverrideEntry {
                threshold,
                rarest_drop: rarest_drop.to_string(),
                exempt,
            },
        );
        self.persist();
        info!(
            target: "fifty_fifty::registry",
            npc = %name,
            %threshold,
            exempt,
            ?outcome,
            "override.upserted"
        );
        outcome
    }

    pub fn reset_overrides(&self) {
        let _gate = self.write_gate.lock();
        self.overrides.write().clear();
        self.persist();
        info!(target: "fifty_fifty::registry", "override.reset_all");
    }

    /// Resolved budget of every defined name; overrides win over catalog entries.
    pub fn all_thresholds(&self) -> BTreeMap<String, KillThreshold> {
        let mut thresholds = BTreeMap::new();
        if self.use_catalog.load(Ordering::Relaxed) {
            for definition in self.catalog.definitions() {
                thresholds.insert(definition.name.clone(), definition.threshold);
            }
        }
        for (name, entry) in self.overrides.read().iter() {
            thresholds.insert(name.clone(), entry.threshold);
        }
        thresholds
    }

    pub fn overrides(&self) -> BTreeMap<String, OverrideEntry> {
        self.overrides
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    /// Overrides for names the built-in catalog does not know.
    pub fn unique_overrides(&self) -> BTreeMap<String, OverrideEntry> {
        self.overrides
            .read()
            .iter()
            .filter(|(name, _)| !self.catalog.contains(name))
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    /// Render unique overrides as catalog rows, one JSON object per line, ready to
    /// paste into the catalog's `monsters` array.
    pub fn export_overrides(&self) -> String {
        self.unique_overrides()
            .into_iter()
            .map(|(name, entry)| {
                let denominator = denominator_for(entry.threshold);
                let row = CatalogEntry {
                    name,
                    rarest_drop: entry.rarest_drop,
                    exempt: entry.exempt || denominator.is_none(),
                    denominator: if entry.exempt { None } else { denominator },
                };
                serde_json::to_string(&row).unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(",\n")
    }

    // Caller holds the write gate.
    fn persist(&self) {
        let overrides = self.overrides();
        let thresholds: BTreeMap<&str, KillThreshold> = overrides
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.threshold))
            .collect();
        let drops: BTreeMap<&str, &str> = overrides
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.rarest_drop.as_str()))
            .collect();
        let exempt: BTreeMap<&str, bool> = overrides
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.exempt))
            .collect();
        save_json(self.store.as_ref(), CUSTOM_THRESHOLDS_KEY, &thresholds);
        save_json(self.store.as_ref(), CUSTOM_DROPS_KEY, &drops);
        save_json(self.store.as_ref(), EXEMPT_MONSTERS_KEY, &exempt);
    }
}

fn validate_name(name: &str) -> Result<&str, RegistryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(RegistryError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

fn load_overrides(store: &dyn ConfigStore) -> HashMap<String, OverrideEntry> {
    let thresholds: HashMap<String, i64> = load_json_or_default(store, CUSTOM_THRESHOLDS_KEY);
    let mut drops: HashMap<String, String> = load_json_or_default(store, CUSTOM_DROPS_KEY);
    let exempt: HashMap<String, bool> = load_json_or_default(store, EXEMPT_MONSTERS_KEY);

    let mut overrides = HashMap::with_capacity(thresholds.len());
    for (name, raw) in thresholds {
        let threshold = match KillThreshold::try_from(raw) {
            Ok(threshold) => threshold,
            Err(err) => {
                warn!(
                    target: "fifty_fifty::registry",
                    npc = %name,
                    error = %err,
                    "override.skipped=invalid_threshold"
                );
                continue;
            }
        };
        let is_exempt = exempt.get(&name).copied().unwrap_or(false);
        let rarest_drop = drops
            .remove(&name)
            .unwrap_or_else(|| UNKNOWN_DROP_LABEL.to_string());
        let threshold = if is_exempt {
            KillThreshold::Infinite
        } else {
            threshold
        };
        overrides.insert(
            name,
            OverrideEntry {
                threshold,
                rarest_drop,
                exempt: is_exempt,
            },
        );
    }
    overrides
}
