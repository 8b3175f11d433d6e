//! Data contracts for the Fifty-Fifty kill budget tracker.
//!
//! Everything the host hands to the tracker (visible NPCs, menu entries, host
//! events, typed chat commands) is described here so the engine in
//! `budget_core` and the inspector can share one vocabulary without pulling in
//! any engine logic.

pub mod command_text;
mod entity;
mod events;
mod menu;

pub use command_text::{
    parse_chat_command, parse_drop_denominator, CommandParseError, CommandVerb, TrackerCommand,
    COMMAND_PREFIX,
};
pub use entity::{Actor, GameState, NpcId, NpcView, PlayerId};
pub use events::{ChatKind, HostEvent};
pub use menu::{
    is_attack_option, is_substitute_option, MenuActionKind, MenuEntry, MenuOptionClicked,
    SUBSTITUTE_OPTIONS,
};

/// Config group every persisted key of the tracker lives under.
pub const CONFIG_GROUP: &str = "enemytracker";
