//! Read-models for the on-screen overlays: the recent-kill card and the
//! per-NPC progress outlines.

use std::sync::Arc;

use budget_schema::NpcId;
use parking_lot::Mutex;
use serde::Serialize;

use crate::gate::{AttackGate, BudgetStatus};
use crate::ledger::KillLedger;
use crate::registry::MonsterRegistry;
use crate::scene::SceneView;
use crate::threshold::{progress, KillThreshold};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentKillView {
    pub name: String,
    pub kills: u32,
    pub threshold: KillThreshold,
    pub progress: f32,
    pub exempt: bool,
    pub reached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    InProgress,
    Maxed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub npc_id: NpcId,
    pub name: String,
    pub kind: HighlightKind,
    pub progress: f32,
}

pub struct OverlayModel {
    registry: Arc<MonsterRegistry>,
    ledger: Arc<KillLedger>,
    gate: AttackGate,
    last_kill: Mutex<Option<(String, u64)>>,
}

impl OverlayModel {
    pub fn new(registry: Arc<MonsterRegistry>, ledger: Arc<KillLedger>, gate: AttackGate) -> Self {
        Self {
            registry,
            ledger,
            gate,
            last_kill: Mutex::new(None),
        }
    }

    pub fn record_kill(&self, name: &str, now_ms: u64) {
        *self.last_kill.lock() = Some((name.to_string(), now_ms));
    }

    /// The last attributed kill, while it is younger than `window_ms`.
    pub fn recent_kill(&self, now_ms: u64, window_ms: u64) -> Option<RecentKillView> {
        let mut last_kill = self.last_kill.lock();
        let at = last_kill.as_ref()?.1;
        if now_ms.saturating_sub(at) > window_ms {
            *last_kill = None;
            return None;
        }
        let name = last_kill.as_ref()?.0.clone();
        let kills = self.ledger.kills(&name);
        let threshold = self.registry.threshold(&name);
        Some(RecentKillView {
            name,
            kills,
            threshold,
            progress: progress(kills, threshold),
            exempt: threshold.is_infinite(),
            reached: threshold.is_reached(kills),
        })
    }

    /// Visible named NPCs with at least one recorded kill and a finite budget.
    pub fn highlights(&self, scene: &dyn SceneView) -> Vec<Highlight> {
        if !scene.game_state().is_logged_in() {
            return Vec::new();
        }
        scene
            .npcs()
            .iter()
            .filter_map(|npc| {
                let name = npc.name()?;
                let (kind, kills, threshold) = match self.gate.budget_status(name) {
                    BudgetStatus::Remaining { kills: 0, .. } => return None,
                    BudgetStatus::Remaining { kills, remaining } => {
                        (HighlightKind::InProgress, kills, kills + remaining)
                    }
                    BudgetStatus::Reached { kills, threshold } => {
                        (HighlightKind::Maxed, kills, threshold)
                    }
                    BudgetStatus::Untracked | BudgetStatus::Exempt => return None,
                };
                Some(Highlight {
                    npc_id: npc.id,
                    name: name.to_string(),
                    kind,
                    progress: progress(kills, KillThreshold::Finite(threshold)),
                })
            })
            .collect()
    }
}
