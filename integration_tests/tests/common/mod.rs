use std::path::PathBuf;
use std::sync::{Arc, Once};

use budget_core::{
    ChannelNotifier, ConfigStore, EventOutcome, KillBudgetTracker, ManualClock, MemoryStore,
    MonsterCatalog, Notification, Scene, TrackerConfig, TrackerServices,
};
use budget_schema::{Actor, HostEvent, MenuActionKind, MenuEntry, MenuOptionClicked, NpcView};
use crossbeam_channel::Receiver;

#[allow(dead_code)]
pub const LOCAL_PLAYER: u32 = 1;

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_tracker_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test tracker config at {}",
            config_path.display()
        );

        std::env::set_var("FIFTY_FIFTY_CONFIG_PATH", &config_path);
    });
}

/// A tracker plus the host-side state a real client would keep around it.
#[allow(dead_code)]
pub struct Session {
    pub tracker: KillBudgetTracker,
    pub store: Arc<dyn ConfigStore>,
    pub clock: Arc<ManualClock>,
    pub messages: Receiver<Notification>,
    pub scene: Scene,
    pub menu: Vec<MenuEntry>,
}

#[allow(dead_code)]
impl Session {
    pub fn start() -> Self {
        Session::with_store(Arc::new(MemoryStore::new()), TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Session::with_store(Arc::new(MemoryStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn ConfigStore>, config: TrackerConfig) -> Self {
        let clock = Arc::new(ManualClock::starting_at(1_000_000));
        let (notifier, messages) = ChannelNotifier::new();
        let tracker = KillBudgetTracker::new(
            Arc::clone(&store),
            MonsterCatalog::builtin(),
            config,
            TrackerServices {
                notifier: Arc::new(notifier),
                clock: clock.clone(),
            },
        );
        Session {
            tracker,
            store,
            clock,
            messages,
            scene: Scene::logged_in(LOCAL_PLAYER),
            menu: Vec::new(),
        }
    }

    /// Shut down and bring a fresh tracker up over the same store.
    pub fn restart(self) -> Self {
        self.tracker.shutdown();
        let config = self.tracker.config();
        Session::with_store(self.store, config)
    }

    pub fn spawn(&mut self, id: u32, name: &str) -> NpcView {
        let npc = NpcView::new(id, name);
        self.scene.spawn(npc.clone());
        npc
    }

    pub fn send(&mut self, event: HostEvent) -> EventOutcome {
        self.tracker.handle(&event, &self.scene, &mut self.menu)
    }

    pub fn engage(&mut self, npc: &NpcView) -> EventOutcome {
        self.send(HostEvent::InteractingChanged {
            source: Actor::player(LOCAL_PLAYER),
            target: Some(Actor::npc(npc.clone())),
        })
    }

    /// Engage `npc`, let it die, and respawn a fresh instance under the same id.
    pub fn kill(&mut self, npc: &NpcView) -> EventOutcome {
        self.engage(npc);
        let outcome = self.send(HostEvent::NpcDespawned {
            npc: npc.clone().killed(),
        });
        self.scene.spawn(npc.clone());
        outcome
    }

    pub fn add_entry(&mut self, option: &str, npc: &NpcView, kind: MenuActionKind) -> EventOutcome {
        let entry = MenuEntry::new(option, npc.name().unwrap_or_default(), npc.id.0, kind);
        self.menu.push(entry.clone());
        self.send(HostEvent::MenuEntryAdded { entry })
    }

    pub fn click(&mut self, option: &str, npc: &NpcView) -> EventOutcome {
        let click = MenuOptionClicked::from(&MenuEntry::new(
            option,
            npc.name().unwrap_or_default(),
            npc.id.0,
            MenuActionKind::NpcFirstOption,
        ));
        self.send(HostEvent::MenuOptionClicked { click })
    }

    pub fn drain_messages(&self) -> Vec<String> {
        self.messages.try_iter().map(|n| n.text).collect()
    }
}
