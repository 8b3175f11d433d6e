//! Live view of what the client can currently see, and entity resolution over it.

use budget_schema::{GameState, NpcId, NpcView, PlayerId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query surface over currently visible entities, supplied by the host.
pub trait SceneView {
    fn npcs(&self) -> &[NpcView];
    fn local_player(&self) -> Option<PlayerId>;
    fn game_state(&self) -> GameState;
}

/// Owned snapshot of the visible world; what tests and the inspector replay feed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub npcs: Vec<NpcView>,
    pub local_player: Option<PlayerId>,
    pub game_state: GameState,
}

impl Scene {
    pub fn logged_in(local_player: u32) -> Self {
        Self {
            npcs: Vec::new(),
            local_player: Some(PlayerId(local_player)),
            game_state: GameState::LoggedIn,
        }
    }

    pub fn with_npc(mut self, npc: NpcView) -> Self {
        self.spawn(npc);
        self
    }

    /// Add or replace the instance with the same id.
    pub fn spawn(&mut self, npc: NpcView) {
        match self.npcs.iter_mut().find(|existing| existing.id == npc.id) {
            Some(existing) => *existing = npc,
            None => self.npcs.push(npc),
        }
    }

    pub fn despawn(&mut self, id: NpcId) -> Option<NpcView> {
        let index = self.npcs.iter().position(|npc| npc.id == id)?;
        Some(self.npcs.remove(index))
    }
}

impl SceneView for Scene {
    fn npcs(&self) -> &[NpcView] {
        &self.npcs
    }

    fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    fn game_state(&self) -> GameState {
        self.game_state
    }
}

/// Visible instance with this id.
pub fn resolve_npc<'a>(scene: &'a dyn SceneView, id: NpcId) -> Option<&'a NpcView> {
    let found = scene.npcs().iter().find(|npc| npc.id == id);
    if found.is_none() {
        debug!(target: "fifty_fifty::menu", npc_id = %id, "resolve.miss=id");
    }
    found
}

/// Name of the visible instance with this id, if it has one.
pub fn resolve_name(scene: &dyn SceneView, id: NpcId) -> Option<&str> {
    let name = resolve_npc(scene, id)?.name();
    if name.is_none() {
        debug!(target: "fifty_fifty::menu", npc_id = %id, "resolve.miss=unnamed");
    }
    name
}

/// Fallback lookup by the textual menu target, e.g. `<col=ffff00>Goblin<col=ff00>  (level-2)`.
///
/// The longest visible name contained in the target wins.
pub fn resolve_by_target_text<'a>(scene: &'a dyn SceneView, target: &str) -> Option<&'a str> {
    let plain = strip_tags(target);
    let found = scene
        .npcs()
        .iter()
        .filter_map(|npc| npc.name())
        .filter(|name| !name.is_empty() && plain.contains(name))
        .max_by_key(|name| name.len());
    if found.is_none() {
        debug!(target: "fifty_fifty::menu", target = %plain, "resolve.miss=target_text");
    }
    found
}

/// Remove `<...>` markup the host embeds in menu text.
pub fn strip_tags(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => plain.push(ch),
            _ => {}
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::logged_in(1)
            .with_npc(NpcView::new(10, "Goblin"))
            .with_npc(NpcView::new(11, "Hobgoblin"))
            .with_npc(NpcView::unnamed(12))
    }

    #[test]
    fn resolves_by_id() {
        let scene = scene();
        assert_eq!(resolve_name(&scene, NpcId(10)), Some("Goblin"));
        assert_eq!(resolve_name(&scene, NpcId(12)), None);
        assert_eq!(resolve_name(&scene, NpcId(99)), None);
    }

    #[test]
    fn target_text_ignores_markup() {
        let scene = scene();
        assert_eq!(
            resolve_by_target_text(&scene, "<col=ffff00>Goblin<col=ff00>  (level-2)"),
            Some("Goblin")
        );
        assert_eq!(
            resolve_by_target_text(&scene, "<col=ffff00>Hobgoblin<col=ff00>  (level-28)"),
            Some("Hobgoblin")
        );
        assert_eq!(resolve_by_target_text(&scene, "Cow"), None);
    }

    #[test]
    fn spawn_replaces_same_id() {
        let mut scene = scene();
        scene.spawn(NpcView::new(10, "Goblin").killed());
        assert_eq!(scene.npcs.len(), 3);
        assert!(resolve_npc(&scene, NpcId(10)).unwrap().dead);
        assert!(scene.despawn(NpcId(10)).is_some());
        assert!(scene.despawn(NpcId(10)).is_none());
    }
}
