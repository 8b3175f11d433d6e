//! Reacting to kills of monsters the registry has never heard of.
//!
//! Either the add/edit dialog is requested right away (rate limited per name) or,
//! in batch mode, the name is parked in a persisted pending set for later review.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::registry::MonsterRegistry;
use crate::store::{load_json_or_default, save_json, ConfigStore};
use crate::threshold::DropRate;

pub const PENDING_MONSTERS_KEY: &str = "pendingMonsters";
pub const DEFAULT_NEW_MONSTER_COOLDOWN_SECS: u64 = 60;

/// Data the external add/edit dialog is opened with.
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterPrompt {
    pub name: String,
    /// Editing an existing definition rather than adding a new one.
    pub existing: bool,
    pub rarest_drop: String,
    pub rate: Option<DropRate>,
    pub exempt: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    /// Prompted for this name too recently.
    Suppressed,
    /// Newly added to the pending set.
    QueuedPending,
    AlreadyPending,
    Prompt(MonsterPrompt),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMonster {
    pub name: String,
    pub detected_at_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DiscoverySettings {
    pub batch_mode: bool,
    pub cooldown_secs: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            batch_mode: false,
            cooldown_secs: DEFAULT_NEW_MONSTER_COOLDOWN_SECS,
        }
    }
}

pub struct NewMonsterDetector {
    registry: Arc<MonsterRegistry>,
    store: Arc<dyn ConfigStore>,
    batch_mode: AtomicBool,
    cooldown_ms: AtomicU64,
    last_prompted: Mutex<HashMap<String, u64>>,
    pending: Mutex<BTreeMap<String, u64>>,
}

impl NewMonsterDetector {
    /// Restore the pending set saved by an earlier session, stamped with `now_ms`.
    pub fn load(
        registry: Arc<MonsterRegistry>,
        store: Arc<dyn ConfigStore>,
        settings: DiscoverySettings,
        now_ms: u64,
    ) -> Self {
        let names: Vec<String> = load_json_or_default(store.as_ref(), PENDING_MONSTERS_KEY);
        let pending: BTreeMap<String, u64> =
            names.into_iter().map(|name| (name, now_ms)).collect();
        if !pending.is_empty() {
            info!(
                target: "fifty_fifty::discovery",
                pending = pending.len(),
                "pending.loaded"
            );
        }
        Self {
            registry,
            store,
            batch_mode: AtomicBool::new(settings.batch_mode),
            cooldown_ms: AtomicU64::new(settings.cooldown_secs.saturating_mul(1000)),
            last_prompted: Mutex::new(HashMap::new()),
            pending: Mutex::new(pending),
        }
    }

    pub fn set_batch_mode(&self, enabled: bool) {
        self.batch_mode.store(enabled, Ordering::Relaxed);
    }

    pub fn batch_mode(&self) -> bool {
        self.batch_mode.load(Ordering::Relaxed)
    }

    /// A kill of `name` was attributed and the registry does not define it.
    pub fn on_undefined_kill(&self, name: &str, now_ms: u64) -> DiscoveryOutcome {
        if self.batch_mode() {
            let mut pending = self.pending.lock();
            if pending.contains_key(name) {
                return DiscoveryOutcome::AlreadyPending;
            }
            pending.insert(name.to_string(), now_ms);
            info!(target: "fifty_fifty::discovery", npc = %name, "pending.added");
            return DiscoveryOutcome::QueuedPending;
        }

        let cooldown = self.cooldown_ms.load(Ordering::Relaxed);
        {
            let mut last_prompted = self.last_prompted.lock();
            if let Some(&seen) = last_prompted.get(name) {
                if now_ms.saturating_sub(seen) < cooldown {
                    debug!(target: "fifty_fifty::discovery", npc = %name, "prompt.suppressed");
                    return DiscoveryOutcome::Suppressed;
                }
            }
            last_prompted.insert(name.to_string(), now_ms);
        }
        DiscoveryOutcome::Prompt(self.prompt_for(name))
    }

    /// Manual "add or edit monster" request; never rate limited.
    pub fn request_prompt(&self, name: &str, now_ms: u64) -> Option<MonsterPrompt> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.last_prompted.lock().insert(name.to_string(), now_ms);
        Some(self.prompt_for(name))
    }

    fn prompt_for(&self, name: &str) -> MonsterPrompt {
        if !self.registry.is_defined(name) {
            return MonsterPrompt {
                name: name.to_string(),
                existing: false,
                rarest_drop: String::new(),
                rate: None,
                exempt: false,
            };
        }
        let profile = self.registry.profile(name);
        MonsterPrompt {
            name: name.to_string(),
            existing: true,
            rarest_drop: profile.rarest_drop,
            rate: profile.rate,
            exempt: profile.exempt,
        }
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.lock().contains_key(name)
    }

    /// Pending names in name order.
    pub fn pending(&self) -> Vec<PendingMonster> {
        self.pending
            .lock()
            .iter()
            .map(|(name, at)| PendingMonster {
                name: name.clone(),
                detected_at_ms: *at,
            })
            .collect()
    }

    /// The pending entry was added to the registry.
    pub fn resolve_pending(&self, name: &str) -> bool {
        self.remove_pending(name, "pending.resolved")
    }

    /// The user chose not to define this monster.
    pub fn skip_pending(&self, name: &str) -> bool {
        self.remove_pending(name, "pending.skipped")
    }

    fn remove_pending(&self, name: &str, message: &'static str) -> bool {
        let mut pending = self.pending.lock();
        let removed = pending.remove(name).is_some();
        if removed {
            self.persist(&pending);
            info!(target: "fifty_fifty::discovery", npc = %name, "{message}");
        }
        removed
    }

    pub fn clear_pending(&self) {
        let mut pending = self.pending.lock();
        pending.clear();
        self.persist(&pending);
        info!(target: "fifty_fifty::discovery", "pending.cleared");
    }

    /// Write the pending set if there is anything to keep.
    pub fn save_pending(&self) {
        let pending = self.pending.lock();
        if !pending.is_empty() {
            self.persist(&pending);
        }
    }

    /// Forget prompt cooldowns; a new session prompts afresh.
    pub fn reset_cooldowns(&self) {
        self.last_prompted.lock().clear();
    }

    fn persist(&self, pending: &BTreeMap<String, u64>) {
        let names: Vec<&str> = pending.keys().map(String::as_str).collect();
        save_json(self.store.as_ref(), PENDING_MONSTERS_KEY, &names);
    }
}

#[cfg(test)]
mod tests {
    use budget_schema::CONFIG_GROUP;

    use super::*;
    use crate::catalog::MonsterCatalog;
    use crate::registry::RegistrySettings;
    use crate::store::MemoryStore;

    fn detector_with(store: Arc<MemoryStore>, batch_mode: bool) -> NewMonsterDetector {
        let catalog = Arc::new(
            MonsterCatalog::from_json_str(
                r#"{"monsters": [
                    {"name": "Goblin", "rarest_drop": "Grimy Dwarf Weed", "denominator": 2731}
                ]}"#,
            )
            .unwrap(),
        );
        let registry = Arc::new(MonsterRegistry::load(
            catalog,
            store.clone(),
            RegistrySettings::default(),
        ));
        NewMonsterDetector::load(
            registry,
            store,
            DiscoverySettings {
                batch_mode,
                ..DiscoverySettings::default()
            },
            0,
        )
    }

    #[test]
    fn prompts_are_rate_limited_per_name() {
        let detector = detector_with(Arc::new(MemoryStore::new()), false);
        assert!(matches!(
            detector.on_undefined_kill("Imp", 1_000),
            DiscoveryOutcome::Prompt(MonsterPrompt { existing: false, .. })
        ));
        assert_eq!(
            detector.on_undefined_kill("Imp", 30_000),
            DiscoveryOutcome::Suppressed
        );
        assert!(matches!(
            detector.on_undefined_kill("Spider", 30_000),
            DiscoveryOutcome::Prompt(_)
        ));
        assert!(matches!(
            detector.on_undefined_kill("Imp", 61_000),
            DiscoveryOutcome::Prompt(_)
        ));
    }

    #[test]
    fn batch_mode_queues_each_name_once() {
        let detector = detector_with(Arc::new(MemoryStore::new()), true);
        assert_eq!(
            detector.on_undefined_kill("Imp", 5),
            DiscoveryOutcome::QueuedPending
        );
        assert_eq!(
            detector.on_undefined_kill("Imp", 9),
            DiscoveryOutcome::AlreadyPending
        );
        assert_eq!(
            detector.pending(),
            vec![PendingMonster {
                name: "Imp".into(),
                detected_at_ms: 5
            }]
        );
    }

    #[test]
    fn resolve_skip_and_clear() {
        let store = Arc::new(MemoryStore::new());
        let detector = detector_with(store.clone(), true);
        for name in ["Imp", "Spider", "Bat"] {
            detector.on_undefined_kill(name, 1);
        }
        assert!(detector.resolve_pending("Imp"));
        assert!(!detector.resolve_pending("Imp"));
        assert!(detector.skip_pending("Spider"));
        assert_eq!(
            store.get(CONFIG_GROUP, PENDING_MONSTERS_KEY).as_deref(),
            Some(r#"["Bat"]"#)
        );
        detector.clear_pending();
        assert!(detector.pending().is_empty());
        assert_eq!(
            store.get(CONFIG_GROUP, PENDING_MONSTERS_KEY).as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn pending_survives_restart() {
        let store = Arc::new(MemoryStore::new());
        let detector = detector_with(store.clone(), true);
        detector.on_undefined_kill("Imp", 1);
        detector.on_undefined_kill("Bat", 1);
        detector.save_pending();

        let reloaded = detector_with(store, true);
        assert!(reloaded.is_pending("Imp"));
        assert!(reloaded.is_pending("Bat"));
        assert_eq!(reloaded.pending()[0].detected_at_ms, 0);
    }

    #[test]
    fn manual_prompt_reflects_existing_definition() {
        let detector = detector_with(Arc::new(MemoryStore::new()), false);
        let prompt = detector.request_prompt(" Goblin ", 0).unwrap();
        assert!(prompt.existing);
        assert_eq!(prompt.name, "Goblin");
        assert_eq!(prompt.rarest_drop, "Grimy Dwarf Weed");
        assert_eq!(prompt.rate.and_then(DropRate::denominator), Some(2731));
        assert!(detector.request_prompt("   ", 0).is_none());
    }
}
