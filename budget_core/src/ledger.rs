//! Persistent per-name kill counts.
//!
//! Reads go through a `RwLock` and never wait on persistence. Writers are
//! serialized by a separate gate that is held across mutate-then-persist, so the
//! store always receives snapshots in mutation order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::store::{load_json_or_default, save_json, ConfigStore};

pub const KILLS_KEY: &str = "enemyKills";

pub struct KillLedger {
    counts: RwLock<HashMap<String, u32>>,
    write_gate: Mutex<()>,
    store: Arc<dyn ConfigStore>,
}

impl KillLedger {
    /// Load persisted counts; missing or corrupt data yields an empty ledger.
    pub fn load(store: Arc<dyn ConfigStore>) -> Self {
        let counts: HashMap<String, u32> = load_json_or_default(store.as_ref(), KILLS_KEY);
        debug!(
            target: "fifty_fifty::ledger",
            records = counts.len(),
            "ledger.loaded"
        );
        Self {
            counts: RwLock::new(counts),
            write_gate: Mutex::new(()),
            store,
        }
    }

    pub fn kills(&self, name: &str) -> u32 {
        self.counts.read().get(name).copied().unwrap_or(0)
    }

    /// Record one kill and return the new count.
    pub fn increment(&self, name: &str) -> u32 {
        let kills = self.mutate(|counts| {
            let entry = counts.entry(name.to_string()).or_insert(0);
            *entry = entry.saturating_add(1);
            *entry
        });
        debug!(target: "fifty_fifty::ledger", npc = %name, kills, "ledger.increment");
        kills
    }

    /// Administrative override; may exceed the budget.
    pub fn set_exact(&self, name: &str, kills: u32) {
        self.mutate(|counts| {
            counts.insert(name.to_string(), kills);
        });
        info!(target: "fifty_fifty::ledger", npc = %name, kills, "ledger.set_exact");
    }

    /// Add `amount` kills on top of the current count and return the new total.
    pub fn add_kills(&self, name: &str, amount: u32) -> u32 {
        let total = self.mutate(|counts| {
            let entry = counts.entry(name.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
            *entry
        });
        info!(target: "fifty_fifty::ledger", npc = %name, amount, total, "ledger.add_kills");
        total
    }

    pub fn reset_all(&self) {
        self.mutate(|counts| counts.clear());
        info!(target: "fifty_fifty::ledger", "ledger.reset_all");
    }

    /// Consistent copy of every record, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.counts
            .read()
            .iter()
            .map(|(name, kills)| (name.clone(), *kills))
            .collect()
    }

    pub fn total_kills(&self) -> u64 {
        self.counts.read().values().map(|kills| u64::from(*kills)).sum()
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut HashMap<String, u32>) -> R) -> R {
        let _gate = self.write_gate.lock();
        let result = {
            let mut counts = self.counts.write();
            apply(&mut counts)
        };
        self.persist();
        result
    }

    // Caller holds the write gate.
    fn persist(&self) {
        let snapshot = self.snapshot();
        save_json(self.store.as_ref(), KILLS_KEY, &snapshot);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use budget_schema::CONFIG_GROUP;

    use super::*;
    use crate::store::MemoryStore;

    fn ledger_with(store: Arc<MemoryStore>) -> KillLedger {
        KillLedger::load(store)
    }

    #[test]
    fn increments_count_from_zero() {
        let ledger = ledger_with(Arc::new(MemoryStore::new()));
        assert_eq!(ledger.kills("Goblin"), 0);
        for expected in 1..=5 {
            assert_eq!(ledger.increment("Goblin"), expected);
        }
        assert_eq!(ledger.kills("Goblin"), 5);
        assert_eq!(ledger.kills("goblin"), 0);
    }

    #[test]
    fn every_write_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(store.clone());
        ledger.increment("Goblin");
        ledger.set_exact("Cow", 40);
        assert_eq!(
            store.get(CONFIG_GROUP, KILLS_KEY).as_deref(),
            Some(r#"{"Cow":40,"Goblin":1}"#)
        );

        let reloaded = ledger_with(store);
        assert_eq!(reloaded.kills("Cow"), 40);
        assert_eq!(reloaded.kills("Goblin"), 1);
    }

    #[test]
    fn reset_clears_every_record() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(store.clone());
        ledger.increment("Goblin");
        ledger.increment("Rat");
        ledger.reset_all();
        assert_eq!(ledger.kills("Goblin"), 0);
        assert_eq!(ledger.kills("Rat"), 0);
        assert!(ledger.snapshot().is_empty());
        assert_eq!(store.get(CONFIG_GROUP, KILLS_KEY).as_deref(), Some("{}"));
    }

    #[test]
    fn snapshot_is_detached() {
        let ledger = ledger_with(Arc::new(MemoryStore::new()));
        ledger.increment("Goblin");
        let snapshot = ledger.snapshot();
        ledger.increment("Goblin");
        assert_eq!(snapshot.get("Goblin"), Some(&1));
        assert_eq!(ledger.kills("Goblin"), 2);
    }

    #[test]
    fn corrupt_persisted_data_starts_empty() {
        let store =
            Arc::new(MemoryStore::new().with_value(CONFIG_GROUP, KILLS_KEY, r#"{"Goblin": -4}"#));
        let ledger = ledger_with(store);
        assert!(ledger.snapshot().is_empty());
    }

    #[test]
    fn add_kills_saturates_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(store.clone());
        ledger.set_exact("Goblin", u32::MAX - 1);
        assert_eq!(ledger.add_kills("Goblin", 5), u32::MAX);
        assert_eq!(ledger.add_kills("Imp", 3), 3);

        let reloaded = ledger_with(store);
        assert_eq!(reloaded.kills("Goblin"), u32::MAX);
        assert_eq!(reloaded.kills("Imp"), 3);
    }

    #[test]
    fn concurrent_writers_do_not_lose_increments() {
        let ledger = Arc::new(ledger_with(Arc::new(MemoryStore::new())));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for _ in 0..250 {
                        ledger.increment("Goblin");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.kills("Goblin"), 500);
        assert_eq!(ledger.total_kills(), 500);
    }
}
