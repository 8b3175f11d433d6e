//! Attributes NPC deaths to the local player.
//!
//! Links are keyed by live instance id, not by name. The host reuses ids after a
//! despawn, so a link never outlives the instance it was made for.

use std::collections::HashMap;
use std::sync::Arc;

use budget_schema::{Actor, NpcId, NpcView, PlayerId};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::ledger::KillLedger;
use crate::scene::SceneView;

/// A kill credited to the local player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillAttribution {
    pub name: String,
    pub kills: u32,
}

pub struct InteractionCorrelator {
    links: Mutex<HashMap<NpcId, PlayerId>>,
    ledger: Arc<KillLedger>,
}

impl InteractionCorrelator {
    pub fn new(ledger: Arc<KillLedger>) -> Self {
        Self {
            links: Mutex::new(HashMap::new()),
            ledger,
        }
    }

    /// The local player started interacting with something.
    ///
    /// Returns the NPC now linked, or `None` when the event is not about the local
    /// player engaging an NPC while logged in.
    pub fn on_interacting_changed<'a>(
        &self,
        scene: &dyn SceneView,
        source: &Actor,
        target: Option<&'a Actor>,
    ) -> Option<&'a NpcView> {
        if !scene.game_state().is_logged_in() {
            return None;
        }
        let Actor::Player { id: player } = source else {
            return None;
        };
        if scene.local_player() != Some(*player) {
            return None;
        }
        let Some(Actor::Npc { npc }) = target else {
            return None;
        };
        self.links.lock().insert(npc.id, *player);
        debug!(
            target: "fifty_fifty::correlator",
            npc_id = %npc.id,
            npc = npc.name().unwrap_or_default(),
            "link.upserted"
        );
        Some(npc)
    }

    /// An instance left the scene. Credits a kill when it died while linked to the
    /// local player; the link is dropped either way.
    pub fn on_npc_despawned(
        &self,
        scene: &dyn SceneView,
        npc: &NpcView,
    ) -> Option<KillAttribution> {
        let linked = self.links.lock().remove(&npc.id);
        let local = scene.local_player()?;
        if linked != Some(local) || !npc.dead {
            return None;
        }
        let name = npc.name()?;
        let kills = self.ledger.increment(name);
        info!(target: "fifty_fifty::correlator", npc = %name, kills, "kill.attributed");
        Some(KillAttribution {
            name: name.to_string(),
            kills,
        })
    }

    /// Login screen or world hop: every previously seen id is stale.
    pub fn on_session_reset(&self) {
        let mut links = self.links.lock();
        if !links.is_empty() {
            debug!(target: "fifty_fifty::correlator", cleared = links.len(), "link.reset");
        }
        links.clear();
    }

    pub fn is_linked(&self, id: NpcId) -> bool {
        self.links.lock().contains_key(&id)
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().len()
    }
}
