//! Scripted host sessions.
//!
//! A script is a JSON document listing scene edits and host events in order. The
//! replay keeps its own scene and menu so events see the world the way the host
//! would present it.

use std::{fs, path::Path, sync::Arc};

use budget_core::{
    ChannelNotifier, Clock, ConfigStore, EventOutcome, KillBudgetTracker, ManualClock,
    MonsterCatalog, Notification, Scene, TrackerConfig, TrackerServices,
};
use budget_schema::{HostEvent, MenuEntry, NpcId, NpcView};
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_local_player")]
    pub local_player: u32,
    #[serde(default)]
    pub start_ms: u64,
    pub steps: Vec<ReplayStep>,
}

fn default_local_player() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    Spawn { npc: NpcView },
    Remove { id: NpcId },
    Advance { ms: u64 },
    ClearMenu,
    Event { event: HostEvent },
}

impl ReplayScript {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read replay script {}", path.display()))?;
        serde_json::from_str(&contents)
            .wrap_err_with(|| format!("invalid replay script {}", path.display()))
    }
}

/// One line of replay output.
#[derive(Debug)]
pub struct ReplayLine {
    pub step: usize,
    pub at_ms: u64,
    pub summary: String,
}

pub struct ReplayReport {
    pub lines: Vec<ReplayLine>,
    pub notifications: Vec<Notification>,
    pub tracker: KillBudgetTracker,
}

pub fn run_replay(
    script: &ReplayScript,
    store: Arc<dyn ConfigStore>,
    catalog: Arc<MonsterCatalog>,
    config: TrackerConfig,
) -> ReplayReport {
    let clock = Arc::new(ManualClock::starting_at(script.start_ms));
    let (notifier, messages) = ChannelNotifier::new();
    let tracker = KillBudgetTracker::new(
        store,
        catalog,
        config,
        TrackerServices {
            notifier: Arc::new(notifier),
            clock: clock.clone(),
        },
    );

    let mut scene = Scene::logged_in(script.local_player);
    let mut menu: Vec<MenuEntry> = Vec::new();
    let mut lines = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        match step {
            ReplayStep::Spawn { npc } => scene.spawn(npc.clone()),
            ReplayStep::Remove { id } => {
                scene.despawn(*id);
            }
            ReplayStep::Advance { ms } => clock.advance(*ms),
            ReplayStep::ClearMenu => menu.clear(),
            ReplayStep::Event { event } => {
                match event {
                    HostEvent::GameStateChanged { state } => scene.game_state = *state,
                    HostEvent::MenuEntryAdded { entry } => menu.push(entry.clone()),
                    _ => {}
                }
                let outcome = tracker.handle(event, &scene, &mut menu);
                if let HostEvent::NpcDespawned { npc } = event {
                    scene.despawn(npc.id);
                }
                if let Some(summary) = describe(&outcome, &menu) {
                    lines.push(ReplayLine {
                        step: index,
                        at_ms: clock.now_ms(),
                        summary,
                    });
                }
            }
        }
    }

    ReplayReport {
        lines,
        notifications: messages.try_iter().collect(),
        tracker,
    }
}

fn describe(outcome: &EventOutcome, menu: &[MenuEntry]) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(kill) = &outcome.kill {
        parts.push(format!("kill {} -> {}", kill.name, kill.kills));
    }
    if let Some(prompt) = &outcome.prompt {
        let mode = if prompt.existing { "edit" } else { "add" };
        parts.push(format!("prompt {mode} {}", prompt.name));
    }
    if outcome.menu_changed {
        let options: Vec<&str> = menu.iter().map(|entry| entry.option.as_str()).collect();
        parts.push(format!("menu [{}]", options.join(", ")));
    }
    if outcome.click_consumed {
        parts.push("click consumed".to_string());
    }
    if let Some(update) = outcome.config {
        parts.push(format!("config {update:?}"));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

#[cfg(test)]
mod tests {
    use budget_core::MemoryStore;

    use super::*;

    const SESSION: &str = include_str!("../scripts/chicken_session.json");

    #[test]
    fn chicken_session_replays() {
        let script: ReplayScript = serde_json::from_str(SESSION).unwrap();
        let catalog = Arc::new(
            MonsterCatalog::from_json_str(
                r#"{"monsters": [{"name": "Chicken", "rarest_drop": "Feather (15)", "denominator": 5}]}"#,
            )
            .unwrap(),
        );
        let report = run_replay(
            &script,
            Arc::new(MemoryStore::new()),
            catalog,
            TrackerConfig::default(),
        );

        let summaries: Vec<&str> = report.lines.iter().map(|l| l.summary.as_str()).collect();
        assert_eq!(
            summaries,
            [
                "kill Chicken -> 4",
                "menu [Examine, ]",
                "click consumed",
            ]
        );
        let texts: Vec<&str> = report.notifications.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "Set Chicken kills to 3",
                "You've already reached the kill threshold for Chicken.",
                "Set Chicken kills to 0",
            ]
        );
        assert_eq!(report.tracker.kills("Chicken"), 0);
    }
}
