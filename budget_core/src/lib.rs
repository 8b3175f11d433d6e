//! Kill budget engine for the Fifty-Fifty tracker.
//!
//! Every monster gets a budget: the number of kills after which the player has a
//! better than even chance of having seen its rarest drop. Kills are attributed
//! to the local player, counted per name, and attack options on monsters whose
//! budget is spent are hidden at every point the host lets us touch a menu.
//! [`KillBudgetTracker`] wires the pieces together.

pub mod catalog;
pub mod clock;
mod commands;
pub mod config;
mod correlator;
mod discovery;
mod gate;
mod ledger;
mod menu_filter;
pub mod notify;
mod overlay;
mod registry;
mod scene;
pub mod store;
pub mod threshold;
mod tracker;

pub use catalog::{
    load_monster_catalog_from_env, CatalogEntry, CatalogError, MonsterCatalog, MonsterDefinition,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{apply_command, handle_chat_line};
pub use config::{load_tracker_config, ConfigUpdate, TrackerConfig, TrackerConfigError};
pub use correlator::{InteractionCorrelator, KillAttribution};
pub use discovery::{
    DiscoveryOutcome, DiscoverySettings, MonsterPrompt, NewMonsterDetector, PendingMonster,
    PENDING_MONSTERS_KEY,
};
pub use gate::{AttackGate, BudgetStatus, GateDecision};
pub use ledger::{KillLedger, KILLS_KEY};
pub use menu_filter::{ClickVerdict, MenuFilterPipeline};
pub use notify::{ChannelNotifier, LogNotifier, Notification, NotificationKind, Notifier};
pub use overlay::{Highlight, HighlightKind, OverlayModel, RecentKillView};
pub use registry::{
    DefinitionSource, MonsterProfile, MonsterRegistry, OverrideEntry, RegistryError,
    RegistrySettings, UpsertOutcome, CUSTOM_DROPS_KEY, CUSTOM_THRESHOLDS_KEY,
    EXEMPT_MONSTERS_KEY,
};
pub use scene::{resolve_by_target_text, resolve_name, resolve_npc, strip_tags, Scene, SceneView};
pub use store::{ConfigStore, JsonFileStore, MemoryStore, StoreError};
pub use threshold::{
    denominator_for, drop_rate_for, progress, threshold_for, DropRate, KillThreshold,
};
pub use tracker::{EventOutcome, KillBudgetTracker, TrackerServices};
