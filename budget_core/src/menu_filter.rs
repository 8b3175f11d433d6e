//! Attack-option interception at the four points the host lets us touch a menu.
//!
//! Each hook is a thin adapter over [`AttackGate`]: it never compares kills itself,
//! only touches the list it was handed, and leaves an already filtered list alone.

use std::sync::atomic::{AtomicBool, Ordering};

use budget_schema::{is_substitute_option, MenuEntry, MenuOptionClicked};
use tracing::{debug, info};

use crate::gate::AttackGate;
use crate::scene::{resolve_by_target_text, resolve_name, resolve_npc, SceneView};

/// What the host should do with a committed click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickVerdict {
    Proceed,
    /// Swallow the click; the budget for `npc_name` is spent.
    Consume { npc_name: String },
}

impl ClickVerdict {
    pub fn is_consumed(&self) -> bool {
        matches!(self, ClickVerdict::Consume { .. })
    }
}

pub struct MenuFilterPipeline {
    gate: AttackGate,
    enabled: AtomicBool,
}

impl MenuFilterPipeline {
    pub fn new(gate: AttackGate, enabled: bool) -> Self {
        Self {
            gate,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn blocked_name<'s>(&self, scene: &'s dyn SceneView, entry: &MenuEntry) -> Option<&'s str> {
        if !entry.kind.targets_npc() || !entry.is_attack() {
            return None;
        }
        let name = resolve_name(scene, entry.npc_id())?;
        self.gate.decide(name).is_blocked().then_some(name)
    }

    /// An entry was appended to `menu`. Blanks every NPC attack entry on the
    /// same instance when its budget is spent. Returns how many were neutralized.
    pub fn on_entry_added(
        &self,
        scene: &dyn SceneView,
        added: &MenuEntry,
        menu: &mut [MenuEntry],
    ) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let Some(name) = self.blocked_name(scene, added) else {
            return 0;
        };
        let mut neutralized = 0;
        for entry in menu
            .iter_mut()
            .filter(|entry| {
                entry.identifier == added.identifier
                    && entry.kind.targets_npc()
                    && entry.is_attack()
            })
        {
            entry.neutralize();
            neutralized += 1;
        }
        if neutralized > 0 {
            debug!(target: "fifty_fifty::menu", npc = %name, neutralized, "menu.neutralized");
        }
        neutralized
    }

    /// Last look before the frame's menu is shown. Blocked attack entries
    /// take the verb of a non-combat sibling on the same instance, or are dropped.
    ///
    /// Returns the replacement list only when something changed.
    pub fn on_client_tick(
        &self,
        scene: &dyn SceneView,
        menu: &[MenuEntry],
    ) -> Option<Vec<MenuEntry>> {
        if !self.is_enabled() || !scene.game_state().is_logged_in() || menu.is_empty() {
            return None;
        }
        let mut changed = false;
        let mut filtered = Vec::with_capacity(menu.len());
        for entry in menu {
            let Some(name) = self.blocked_name(scene, entry) else {
                filtered.push(entry.clone());
                continue;
            };
            changed = true;
            let sibling = menu.iter().find(|candidate| {
                candidate.identifier == entry.identifier && is_substitute_option(&candidate.option)
            });
            match sibling {
                Some(sibling) => {
                    debug!(
                        target: "fifty_fifty::menu",
                        npc = %name,
                        substitute = %sibling.option,
                        "menu.substituted"
                    );
                    let mut replacement = entry.clone();
                    replacement.option = sibling.option.clone();
                    replacement.kind = sibling.kind;
                    filtered.push(replacement);
                }
                None => {
                    debug!(target: "fifty_fifty::menu", npc = %name, "menu.dropped");
                }
            }
        }
        changed.then_some(filtered)
    }

    /// A right-click menu is fully built. Blocked attack entries are removed.
    pub fn on_menu_opened(
        &self,
        scene: &dyn SceneView,
        menu: &[MenuEntry],
    ) -> Option<Vec<MenuEntry>> {
        if !self.is_enabled() {
            return None;
        }
        let filtered: Vec<MenuEntry> = menu
            .iter()
            .filter(|entry| self.blocked_name(scene, entry).is_none())
            .cloned()
            .collect();
        (filtered.len() != menu.len()).then_some(filtered)
    }

    /// A click was committed. Backstop for left-click attacks that never went through a menu.
    pub fn on_option_clicked(
        &self,
        scene: &dyn SceneView,
        click: &MenuOptionClicked,
    ) -> ClickVerdict {
        if !self.is_enabled()
            || !click.kind.targets_npc()
            || !budget_schema::is_attack_option(&click.option)
        {
            return ClickVerdict::Proceed;
        }
        let name = match resolve_npc(scene, click.npc_id()) {
            Some(npc) => npc.name(),
            None => resolve_by_target_text(scene, &click.target),
        };
        let Some(name) = name else {
            return ClickVerdict::Proceed;
        };
        if self.gate.decide(name).is_blocked() {
            info!(target: "fifty_fifty::menu", npc = %name, "click.consumed");
            ClickVerdict::Consume {
                npc_name: name.to_string(),
            }
        } else {
            ClickVerdict::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use budget_schema::{MenuActionKind, NpcView};

    use super::*;
    use crate::catalog::MonsterCatalog;
    use crate::ledger::KillLedger;
    use crate::registry::{MonsterRegistry, RegistrySettings};
    use crate::scene::Scene;
    use crate::store::MemoryStore;

    fn pipeline() -> (MenuFilterPipeline, Arc<KillLedger>) {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(
            MonsterCatalog::from_json_str(
                r#"{"monsters": [
                    {"name": "Goblin", "rarest_drop": "Grimy Dwarf Weed", "denominator": 2731},
                    {"name": "Man", "rarest_drop": "Fire talisman", "denominator": 2},
                    {"name": "Cow", "rarest_drop": "Cowhide", "exempt": true}
                ]}"#,
            )
            .unwrap(),
        );
        let registry = Arc::new(MonsterRegistry::load(
            catalog,
            store.clone(),
            RegistrySettings::default(),
        ));
        let ledger = Arc::new(KillLedger::load(store));
        let gate = AttackGate::new(registry, ledger.clone());
        (MenuFilterPipeline::new(gate, true), ledger)
    }

    fn scene() -> Scene {
        Scene::logged_in(1)
            .with_npc(NpcView::new(5, "Man"))
            .with_npc(NpcView::new(6, "Goblin"))
            .with_npc(NpcView::new(7, "Cow"))
            .with_npc(NpcView::unnamed(8))
    }

    fn menu() -> Vec<MenuEntry> {
        vec![
            MenuEntry::new("Cancel", "", 0, MenuActionKind::Cancel),
            MenuEntry::new("Walk here", "", 0, MenuActionKind::WalkHere),
            MenuEntry::new("Examine", "Man", 5, MenuActionKind::ExamineNpc),
            MenuEntry::new("Pickpocket", "Man", 5, MenuActionKind::NpcThirdOption),
            MenuEntry::new("Talk-to", "Man", 5, MenuActionKind::NpcFirstOption),
            MenuEntry::new("Attack", "Man", 5, MenuActionKind::NpcSecondOption),
            MenuEntry::new("Examine", "Goblin", 6, MenuActionKind::ExamineNpc),
            MenuEntry::new("Attack", "Goblin", 6, MenuActionKind::NpcSecondOption),
        ]
    }

    fn options(menu: &[MenuEntry]) -> Vec<&str> {
        menu.iter().map(|entry| entry.option.as_str()).collect()
    }

    #[test]
    fn allowed_menus_are_untouched() {
        let (pipeline, _) = pipeline();
        let scene = scene();
        let mut menu = menu();
        let added = menu[5].clone();
        assert_eq!(pipeline.on_entry_added(&scene, &added, &mut menu), 0);
        assert!(pipeline.on_client_tick(&scene, &menu).is_none());
        assert!(pipeline.on_menu_opened(&scene, &menu).is_none());
        let click = MenuOptionClicked::from(&menu[5]);
        assert_eq!(pipeline.on_option_clicked(&scene, &click), ClickVerdict::Proceed);
    }

    #[test]
    fn entry_added_blanks_attack_on_spent_instance() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 1);
        let scene = scene();
        let mut menu = menu();
        let added = menu[5].clone();
        assert_eq!(pipeline.on_entry_added(&scene, &added, &mut menu), 1);
        assert_eq!(menu[5].option, "");
        assert_eq!(menu[5].target, "");
        assert_eq!(menu[7].option, "Attack");
        // Non-attack entries never trigger the hook.
        let examine = menu[2].clone();
        assert_eq!(pipeline.on_entry_added(&scene, &examine, &mut menu), 0);
    }

    #[test]
    fn entry_added_leaves_player_attack_sharing_the_index() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 1);
        let scene = scene();
        let mut menu = vec![
            MenuEntry::new("Attack", "Zezima", 5, MenuActionKind::Other),
            MenuEntry::new("Attack", "Man", 5, MenuActionKind::NpcSecondOption),
        ];
        let added = menu[1].clone();
        assert_eq!(pipeline.on_entry_added(&scene, &added, &mut menu), 1);
        assert_eq!(options(&menu), ["Attack", ""]);
        assert_eq!(menu[0].target, "Zezima");
    }

    #[test]
    fn tick_substitutes_first_non_combat_sibling() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 3);
        let scene = scene();
        let filtered = pipeline.on_client_tick(&scene, &menu()).unwrap();
        assert_eq!(filtered.len(), 8);
        assert_eq!(filtered[5].option, "Examine");
        assert_eq!(filtered[5].kind, MenuActionKind::ExamineNpc);
        assert_eq!(filtered[5].identifier, 5);
    }

    #[test]
    fn tick_drops_entry_without_sibling() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Goblin", 1893);
        let scene = scene();
        let menu = vec![
            MenuEntry::new("Walk here", "", 0, MenuActionKind::WalkHere),
            MenuEntry::new("Attack", "Goblin", 6, MenuActionKind::NpcSecondOption),
        ];
        let filtered = pipeline.on_client_tick(&scene, &menu).unwrap();
        assert_eq!(options(&filtered), ["Walk here"]);
    }

    #[test]
    fn tick_only_runs_when_logged_in() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 3);
        let mut scene = scene();
        scene.game_state = budget_schema::GameState::Loading;
        assert!(pipeline.on_client_tick(&scene, &menu()).is_none());
    }

    #[test]
    fn menu_opened_removes_blocked_entries() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 3);
        ledger.set_exact("Cow", 3000);
        let scene = scene();
        let mut menu = menu();
        menu.push(MenuEntry::new("Attack", "Cow", 7, MenuActionKind::NpcSecondOption));
        menu.push(MenuEntry::new("Attack", "???", 8, MenuActionKind::NpcSecondOption));
        let filtered = pipeline.on_menu_opened(&scene, &menu).unwrap();
        assert_eq!(filtered.len(), menu.len() - 1);
        assert!(!filtered
            .iter()
            .any(|entry| entry.identifier == 5 && entry.option == "Attack"));
    }

    #[test]
    fn spells_count_as_attacks() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 3);
        let scene = scene();
        let menu = vec![MenuEntry::new(
            "Cast",
            "Wind Strike -> Man",
            5,
            MenuActionKind::WidgetTargetOnNpc,
        )];
        assert_eq!(pipeline.on_menu_opened(&scene, &menu), Some(Vec::new()));
    }

    #[test]
    fn hooks_are_idempotent() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 3);
        ledger.set_exact("Goblin", 2000);
        let scene = scene();

        let mut menu = menu();
        let added = menu[7].clone();
        pipeline.on_entry_added(&scene, &added, &mut menu);
        let after_a = menu.clone();
        pipeline.on_entry_added(&scene, &added, &mut menu);
        assert_eq!(menu, after_a);

        let after_b = pipeline.on_client_tick(&scene, &menu).unwrap_or(menu);
        assert!(pipeline.on_client_tick(&scene, &after_b).is_none());
        assert!(pipeline.on_menu_opened(&scene, &after_b).is_none());

        let only_c = pipeline.on_menu_opened(&scene, &after_b).unwrap_or(after_b.clone());
        assert_eq!(only_c, after_b);
    }

    #[test]
    fn click_on_spent_instance_is_consumed() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Goblin", 1893);
        let scene = scene();
        let click = MenuOptionClicked::from(&MenuEntry::new(
            "Attack",
            "<col=ffff00>Goblin<col=ff00>  (level-2)",
            6,
            MenuActionKind::NpcSecondOption,
        ));
        assert_eq!(
            pipeline.on_option_clicked(&scene, &click),
            ClickVerdict::Consume {
                npc_name: "Goblin".into()
            }
        );
    }

    #[test]
    fn click_falls_back_to_target_text() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Goblin", 1893);
        let scene = scene();
        let click = MenuOptionClicked::from(&MenuEntry::new(
            "Attack",
            "<col=ffff00>Goblin<col=ff00>  (level-2)",
            404,
            MenuActionKind::NpcFirstOption,
        ));
        assert!(pipeline.on_option_clicked(&scene, &click).is_consumed());

        let unknown = MenuOptionClicked::from(&MenuEntry::new(
            "Attack",
            "Imp",
            404,
            MenuActionKind::NpcFirstOption,
        ));
        assert_eq!(pipeline.on_option_clicked(&scene, &unknown), ClickVerdict::Proceed);
    }

    #[test]
    fn disabled_pipeline_never_interferes() {
        let (pipeline, ledger) = pipeline();
        ledger.set_exact("Man", 3);
        pipeline.set_enabled(false);
        let scene = scene();
        let mut menu = menu();
        let added = menu[5].clone();
        assert_eq!(pipeline.on_entry_added(&scene, &added, &mut menu), 0);
        assert!(pipeline.on_client_tick(&scene, &menu).is_none());
        assert!(pipeline.on_menu_opened(&scene, &menu).is_none());
        let click = MenuOptionClicked::from(&menu[5]);
        assert_eq!(pipeline.on_option_clicked(&scene, &click), ClickVerdict::Proceed);
    }
}
