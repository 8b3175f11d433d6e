use serde::{Deserialize, Serialize};

use crate::entity::NpcId;

/// Verbs a blocked attack entry may borrow from a sibling entry on the same NPC.
pub const SUBSTITUTE_OPTIONS: [&str; 3] = ["Talk-to", "Examine", "Pickpocket"];

/// Host action category attached to a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuActionKind {
    NpcFirstOption,
    NpcSecondOption,
    NpcThirdOption,
    NpcFourthOption,
    NpcFifthOption,
    /// A selected spell or item used on an NPC.
    WidgetTargetOnNpc,
    ExamineNpc,
    WalkHere,
    Cancel,
    Other,
}

impl MenuActionKind {
    /// Whether the entry's identifier refers to an NPC index.
    pub fn targets_npc(self) -> bool {
        matches!(
            self,
            MenuActionKind::NpcFirstOption
                | MenuActionKind::NpcSecondOption
                | MenuActionKind::NpcThirdOption
                | MenuActionKind::NpcFourthOption
                | MenuActionKind::NpcFifthOption
                | MenuActionKind::WidgetTargetOnNpc
                | MenuActionKind::ExamineNpc
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub option: String,
    pub target: String,
    pub identifier: u32,
    pub kind: MenuActionKind,
}

impl MenuEntry {
    pub fn new(
        option: impl Into<String>,
        target: impl Into<String>,
        identifier: u32,
        kind: MenuActionKind,
    ) -> Self {
        Self {
            option: option.into(),
            target: target.into(),
            identifier,
            kind,
        }
    }

    pub fn npc_id(&self) -> NpcId {
        NpcId(self.identifier)
    }

    pub fn is_attack(&self) -> bool {
        is_attack_option(&self.option)
    }

    /// Blank the entry so the host renders it as an inert line.
    pub fn neutralize(&mut self) {
        self.option.clear();
        self.target.clear();
    }
}

/// The player committing to a menu entry, possibly via left-click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOptionClicked {
    pub option: String,
    pub target: String,
    pub identifier: u32,
    pub kind: MenuActionKind,
}

impl MenuOptionClicked {
    pub fn npc_id(&self) -> NpcId {
        NpcId(self.identifier)
    }
}

impl From<&MenuEntry> for MenuOptionClicked {
    fn from(entry: &MenuEntry) -> Self {
        Self {
            option: entry.option.clone(),
            target: entry.target.clone(),
            identifier: entry.identifier,
            kind: entry.kind,
        }
    }
}

/// `attack`, `fight`, or any verb starting with `cast`, ignoring case.
pub fn is_attack_option(option: &str) -> bool {
    let lowered = option.to_ascii_lowercase();
    lowered == "attack" || lowered == "fight" || lowered.starts_with("cast")
}

pub fn is_substitute_option(option: &str) -> bool {
    SUBSTITUTE_OPTIONS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(option))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_class_verbs() {
        assert!(is_attack_option("Attack"));
        assert!(is_attack_option("FIGHT"));
        assert!(is_attack_option("Cast"));
        assert!(is_attack_option("cast-wind-strike"));
        assert!(!is_attack_option("Talk-to"));
        assert!(!is_attack_option(""));
        assert!(!is_attack_option("Attack-style"));
    }

    #[test]
    fn neutralized_entry_is_no_longer_an_attack() {
        let mut entry = MenuEntry::new("Attack", "Goblin", 3, MenuActionKind::NpcSecondOption);
        entry.neutralize();
        assert!(entry.option.is_empty());
        assert!(entry.target.is_empty());
        assert!(!entry.is_attack());
    }

    #[test]
    fn walk_here_does_not_target_npcs() {
        assert!(!MenuActionKind::WalkHere.targets_npc());
        assert!(MenuActionKind::WidgetTargetOnNpc.targets_npc());
    }
}
