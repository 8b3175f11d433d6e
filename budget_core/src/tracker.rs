//! `KillBudgetTracker`: one explicitly constructed object owning every component,
//! plus the dispatch from host events to the component responsible.
//!
//! Construction order matters: the catalog is loaded first, persisted overrides are
//! merged on top, then the ledger and pending set are restored.

use std::collections::BTreeMap;
use std::sync::Arc;

use budget_schema::{HostEvent, MenuEntry, CONFIG_GROUP};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::catalog::{load_monster_catalog_from_env, MonsterCatalog};
use crate::clock::{Clock, SystemClock};
use crate::commands::{apply_command, handle_chat_line};
use crate::config::{
    load_tracker_config, ConfigUpdate, TrackerConfig, BATCH_MODE_KEY, DEFAULT_KILL_THRESHOLD_KEY,
    HIDE_ATTACK_OPTION_KEY, RESET_CUSTOM_MONSTERS_KEY, RESET_KILLS_KEY, USE_GLOBAL_THRESHOLDS_KEY,
};
use crate::correlator::{InteractionCorrelator, KillAttribution};
use crate::discovery::{DiscoveryOutcome, MonsterPrompt, NewMonsterDetector, PendingMonster};
use crate::gate::{AttackGate, BudgetStatus, GateDecision};
use crate::ledger::KillLedger;
use crate::menu_filter::{ClickVerdict, MenuFilterPipeline};
use crate::notify::{LogNotifier, Notification, NotificationKind, Notifier};
use crate::overlay::{Highlight, OverlayModel, RecentKillView};
use crate::registry::{MonsterProfile, MonsterRegistry, RegistryError, UpsertOutcome};
use crate::scene::SceneView;
use crate::store::ConfigStore;
use crate::threshold::{progress, DropRate, KillThreshold};

/// Collaborators the host may swap out.
#[derive(Clone)]
pub struct TrackerServices {
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl Default for TrackerServices {
    fn default() -> Self {
        Self {
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
        }
    }
}

/// What handling one host event did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOutcome {
    /// The menu list passed in was modified.
    pub menu_changed: bool,
    /// The host must swallow the click.
    pub click_consumed: bool,
    pub kill: Option<KillAttribution>,
    /// Open the add/edit dialog with this data.
    pub prompt: Option<MonsterPrompt>,
    pub config: Option<ConfigUpdate>,
}

pub struct KillBudgetTracker {
    config: RwLock<TrackerConfig>,
    store: Arc<dyn ConfigStore>,
    registry: Arc<MonsterRegistry>,
    ledger: Arc<KillLedger>,
    gate: AttackGate,
    menu: MenuFilterPipeline,
    correlator: InteractionCorrelator,
    discovery: NewMonsterDetector,
    overlay: OverlayModel,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl KillBudgetTracker {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        catalog: Arc<MonsterCatalog>,
        config: TrackerConfig,
        services: TrackerServices,
    ) -> Self {
        let registry = Arc::new(MonsterRegistry::load(
            catalog,
            Arc::clone(&store),
            config.registry_settings(),
        ));
        let ledger = Arc::new(KillLedger::load(Arc::clone(&store)));
        let gate = AttackGate::new(Arc::clone(&registry), Arc::clone(&ledger));
        let menu = MenuFilterPipeline::new(gate.clone(), config.hide_attack_option());
        let correlator = InteractionCorrelator::new(Arc::clone(&ledger));
        let discovery = NewMonsterDetector::load(
            Arc::clone(&registry),
            Arc::clone(&store),
            config.discovery_settings(),
            services.clock.now_ms(),
        );
        let overlay = OverlayModel::new(Arc::clone(&registry), Arc::clone(&ledger), gate.clone());
        info!(
            target: "fifty_fifty::config",
            hide_attack_option = config.hide_attack_option(),
            batch_mode = config.batch_mode_enabled(),
            "tracker.started"
        );
        Self {
            config: RwLock::new(config),
            store,
            registry,
            ledger,
            gate,
            menu,
            correlator,
            discovery,
            overlay,
            notifier: services.notifier,
            clock: services.clock,
        }
    }

    /// Catalog from `MONSTER_CATALOG_PATH` (or builtin), config layered from the
    /// environment and the store.
    pub fn from_env(store: Arc<dyn ConfigStore>, services: TrackerServices) -> Self {
        let catalog = load_monster_catalog_from_env();
        let config = load_tracker_config(store.as_ref());
        KillBudgetTracker::new(store, catalog, config, services)
    }

    /// Persist what is only saved on exit and drop session state.
    pub fn shutdown(&self) {
        self.discovery.save_pending();
        self.discovery.reset_cooldowns();
        self.correlator.on_session_reset();
        info!(target: "fifty_fifty::config", "tracker.stopped");
    }

    /// Dispatch one host event.
    ///
    /// `menu` is the host's current menu list. For `MenuEntryAdded` it already
    /// contains the added entry.
    pub fn handle(
        &self,
        event: &HostEvent,
        scene: &dyn SceneView,
        menu: &mut Vec<MenuEntry>,
    ) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        match event {
            HostEvent::InteractingChanged { source, target } => {
                self.on_interacting_changed(scene, source, target.as_ref());
            }
            HostEvent::NpcDespawned { npc } => {
                if let Some(kill) = self.correlator.on_npc_despawned(scene, npc) {
                    outcome.prompt = self.after_kill(&kill);
                    outcome.kill = Some(kill);
                }
            }
            HostEvent::MenuEntryAdded { entry } => {
                outcome.menu_changed = self.menu.on_entry_added(scene, entry, menu) > 0;
            }
            HostEvent::ClientTick => {
                if let Some(filtered) = self.menu.on_client_tick(scene, menu) {
                    *menu = filtered;
                    outcome.menu_changed = true;
                }
            }
            HostEvent::MenuOpened => {
                if let Some(filtered) = self.menu.on_menu_opened(scene, menu) {
                    *menu = filtered;
                    outcome.menu_changed = true;
                }
            }
            HostEvent::MenuOptionClicked { click } => {
                if let ClickVerdict::Consume { npc_name } =
                    self.menu.on_option_clicked(scene, click)
                {
                    self.notifier.notify(Notification::attack_blocked(&npc_name));
                    outcome.click_consumed = true;
                }
            }
            HostEvent::GameStateChanged { state } => {
                if state.resets_session() {
                    self.correlator.on_session_reset();
                }
            }
            HostEvent::ChatMessage { kind, text } => {
                if let Some(reply) = handle_chat_line(&self.ledger, *kind, text) {
                    self.notifier
                        .notify(Notification::new(NotificationKind::CommandReply, reply));
                }
            }
            HostEvent::ConfigChanged { group, key, value } => {
                if group == CONFIG_GROUP {
                    outcome.config = Some(self.on_config_changed(key, value.as_deref()));
                }
            }
        }
        outcome
    }

    fn on_interacting_changed(
        &self,
        scene: &dyn SceneView,
        source: &budget_schema::Actor,
        target: Option<&budget_schema::Actor>,
    ) {
        let Some(npc) = self.correlator.on_interacting_changed(scene, source, target) else {
            return;
        };
        let Some(name) = npc.name() else {
            return;
        };
        if self.gate.decide(name).is_blocked() {
            info!(target: "fifty_fifty::correlator", npc = %name, "combat.started_maxed");
            self.notifier.notify(Notification::threshold_warning(name));
        }
    }

    fn after_kill(&self, kill: &KillAttribution) -> Option<MonsterPrompt> {
        let now = self.clock.now_ms();
        self.overlay.record_kill(&kill.name, now);
        if self.registry.is_defined(&kill.name) {
            return None;
        }
        info!(target: "fifty_fifty::discovery", npc = %kill.name, "monster.undefined");
        match self.discovery.on_undefined_kill(&kill.name, now) {
            DiscoveryOutcome::Prompt(prompt) => Some(prompt),
            DiscoveryOutcome::QueuedPending => {
                self.notifier.notify(Notification::pending_added(&kill.name));
                None
            }
            DiscoveryOutcome::AlreadyPending | DiscoveryOutcome::Suppressed => None,
        }
    }

    fn on_config_changed(&self, key: &str, value: Option<&str>) -> ConfigUpdate {
        let update = match self.config.write().apply_change(key, value) {
            Ok(update) => update,
            Err(err) => {
                warn!(target: "fifty_fifty::config", key, error = %err, "config.change_rejected");
                return ConfigUpdate::Ignored;
            }
        };
        let config = self.config.read().clone();
        match update {
            ConfigUpdate::Setting { key } => match key {
                HIDE_ATTACK_OPTION_KEY => self.menu.set_enabled(config.hide_attack_option()),
                USE_GLOBAL_THRESHOLDS_KEY => {
                    self.registry.set_use_catalog(config.use_global_thresholds())
                }
                DEFAULT_KILL_THRESHOLD_KEY => self
                    .registry
                    .set_default_threshold(config.default_kill_threshold()),
                BATCH_MODE_KEY => self.discovery.set_batch_mode(config.batch_mode_enabled()),
                _ => {}
            },
            ConfigUpdate::ResetKills => {
                self.reset_all_kills();
                self.clear_trigger(RESET_KILLS_KEY);
            }
            ConfigUpdate::ResetCustomMonsters => {
                self.reset_overrides();
                self.clear_trigger(RESET_CUSTOM_MONSTERS_KEY);
                self.notifier.notify(Notification::overrides_reset());
            }
            ConfigUpdate::Ignored => {}
        }
        update
    }

    fn clear_trigger(&self, key: &str) {
        if let Err(err) = self.store.set(CONFIG_GROUP, key, "false") {
            warn!(target: "fifty_fifty::config", key, error = %err, "config.trigger_clear_failed");
        }
    }

    pub fn config(&self) -> TrackerConfig {
        self.config.read().clone()
    }

    // Queries.

    pub fn kills(&self, name: &str) -> u32 {
        self.ledger.kills(name)
    }

    pub fn threshold(&self, name: &str) -> KillThreshold {
        self.registry.threshold(name)
    }

    pub fn is_exempt(&self, name: &str) -> bool {
        self.registry.is_exempt(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.registry.is_defined(name)
    }

    pub fn rarest_drop_label(&self, name: &str) -> String {
        self.registry.rarest_drop_label(name)
    }

    pub fn drop_rate(&self, name: &str) -> Option<DropRate> {
        self.registry.drop_rate(name)
    }

    pub fn profile(&self, name: &str) -> MonsterProfile {
        self.registry.profile(name)
    }

    pub fn progress(&self, name: &str) -> f32 {
        progress(self.ledger.kills(name), self.registry.threshold(name))
    }

    pub fn decide(&self, name: &str) -> GateDecision {
        self.gate.decide(name)
    }

    pub fn budget_status(&self, name: &str) -> BudgetStatus {
        self.gate.budget_status(name)
    }

    pub fn all_kill_counts(&self) -> BTreeMap<String, u32> {
        self.ledger.snapshot()
    }

    pub fn all_thresholds(&self) -> BTreeMap<String, KillThreshold> {
        self.registry.all_thresholds()
    }

    pub fn pending_monsters(&self) -> Vec<PendingMonster> {
        self.discovery.pending()
    }

    pub fn export_overrides(&self) -> String {
        self.registry.export_overrides()
    }

    /// The recent-kill card, if one should be on screen now.
    pub fn recent_kill(&self) -> Option<RecentKillView> {
        let config = self.config.read();
        if !config.show_recent_kill_overlay() {
            return None;
        }
        self.overlay
            .recent_kill(self.clock.now_ms(), config.recent_kill_display_ms())
    }

    pub fn highlights(&self, scene: &dyn SceneView) -> Vec<Highlight> {
        self.overlay.highlights(scene)
    }

    // Mutations.

    pub fn reset_all_kills(&self) {
        self.ledger.reset_all();
    }

    pub fn reset_overrides(&self) {
        self.registry.reset_overrides();
    }

    pub fn set_kills(&self, name: &str, kills: u32) -> String {
        apply_command(
            &self.ledger,
            &budget_schema::TrackerCommand::SetKills {
                name: name.to_string(),
                kills,
            },
        )
    }

    pub fn add_kills(&self, name: &str, kills: u32) -> u32 {
        self.ledger.add_kills(name, kills)
    }

    /// Confirmation from the add/edit dialog. A successful save also settles the
    /// name's pending entry, if any.
    pub fn upsert_override(
        &self,
        name: &str,
        rarest_drop: &str,
        rate: DropRate,
        exempt: bool,
    ) -> Result<UpsertOutcome, RegistryError> {
        let outcome = self.registry.upsert_override(name, rarest_drop, rate, exempt)?;
        Ok(self.after_save(name, outcome))
    }

    /// Budget-first edit from the dashboard.
    pub fn upsert_override_by_threshold(
        &self,
        name: &str,
        rarest_drop: &str,
        threshold: u32,
    ) -> Result<UpsertOutcome, RegistryError> {
        let outcome = self
            .registry
            .upsert_override_by_threshold(name, rarest_drop, threshold)?;
        Ok(self.after_save(name, outcome))
    }

    fn after_save(&self, name: &str, outcome: UpsertOutcome) -> UpsertOutcome {
        let name = name.trim();
        self.discovery.resolve_pending(name);
        self.notifier.notify(Notification::monster_saved(
            name,
            outcome == UpsertOutcome::Updated,
        ));
        outcome
    }

    /// Manual "add or edit monster" request.
    pub fn request_monster_prompt(&self, name: &str) -> Option<MonsterPrompt> {
        self.discovery.request_prompt(name, self.clock.now_ms())
    }

    pub fn resolve_pending(&self, name: &str) -> bool {
        self.discovery.resolve_pending(name)
    }

    pub fn skip_pending(&self, name: &str) -> bool {
        self.discovery.skip_pending(name)
    }

    pub fn clear_pending(&self) {
        self.discovery.clear_pending();
    }
}
