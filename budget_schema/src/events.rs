use serde::{Deserialize, Serialize};

use crate::entity::{Actor, GameState, NpcView};
use crate::menu::{MenuEntry, MenuOptionClicked};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Public,
    Private,
    PrivateOut,
    Game,
    Other,
}

impl ChatKind {
    /// Channels the local player can type into.
    pub fn is_player_authored(self) -> bool {
        matches!(self, ChatKind::Public | ChatKind::Private | ChatKind::PrivateOut)
    }
}

/// Everything the host can tell the tracker about, in the order it happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    InteractingChanged {
        source: Actor,
        #[serde(default)]
        target: Option<Actor>,
    },
    NpcDespawned {
        npc: NpcView,
    },
    MenuEntryAdded {
        entry: MenuEntry,
    },
    ClientTick,
    MenuOpened,
    MenuOptionClicked {
        click: MenuOptionClicked,
    },
    GameStateChanged {
        state: GameState,
    },
    ChatMessage {
        kind: ChatKind,
        text: String,
    },
    ConfigChanged {
        group: String,
        key: String,
        #[serde(default)]
        value: Option<String>,
    },
}
