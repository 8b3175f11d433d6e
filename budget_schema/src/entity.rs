use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned index of a live NPC instance.
///
/// Indices are reused by the host once an instance despawns, so an id only
/// identifies an NPC for as long as that instance stays spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(pub u32);

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "npc#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Read-only view of one NPC instance currently visible to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcView {
    pub id: NpcId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dead: bool,
}

impl NpcView {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: NpcId(id),
            name: Some(name.into()),
            dead: false,
        }
    }

    pub fn unnamed(id: u32) -> Self {
        Self {
            id: NpcId(id),
            name: None,
            dead: false,
        }
    }

    pub fn killed(mut self) -> Self {
        self.dead = true;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Either side of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    Player { id: PlayerId },
    Npc { npc: NpcView },
}

impl Actor {
    pub fn player(id: u32) -> Self {
        Actor::Player { id: PlayerId(id) }
    }

    pub fn npc(npc: NpcView) -> Self {
        Actor::Npc { npc }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    LoginScreen,
    LoggingIn,
    Loading,
    LoggedIn,
    ConnectionLost,
    Hopping,
}

impl GameState {
    /// States after which previously seen NPC indices must not be trusted.
    ///
    /// A world hop hands out a fresh set of indices just like a logout does.
    pub fn resets_session(self) -> bool {
        matches!(self, GameState::LoginScreen | GameState::Hopping)
    }

    pub fn is_logged_in(self) -> bool {
        self == GameState::LoggedIn
    }
}
