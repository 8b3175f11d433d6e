//! `!ff` chat commands against the kill ledger.

use budget_schema::{parse_chat_command, ChatKind, TrackerCommand};
use tracing::debug;

use crate::ledger::KillLedger;

/// Run a parsed command and return the reply shown to the player.
pub fn apply_command(ledger: &KillLedger, command: &TrackerCommand) -> String {
    match command {
        TrackerCommand::SetKills { name, kills } => {
            ledger.set_exact(name, *kills);
            format!("Set {name} kills to {kills}")
        }
        TrackerCommand::AddKills { name, kills } => {
            let total = ledger.add_kills(name, *kills);
            format!("Added {kills} kills to {name} (total: {total})")
        }
        TrackerCommand::Help => TrackerCommand::help_text().to_string(),
    }
}

/// Handle a chat line. `None` when the line is not a command for us; a rejected
/// command replies with its usage text and changes nothing.
pub fn handle_chat_line(ledger: &KillLedger, kind: ChatKind, text: &str) -> Option<String> {
    if !kind.is_player_authored() {
        return None;
    }
    match parse_chat_command(text) {
        Ok(Some(command)) => Some(apply_command(ledger, &command)),
        Ok(None) => None,
        Err(err) => {
            debug!(target: "fifty_fifty::ledger", error = %err, "command.rejected");
            Some(err.usage().to_string())
        }
    }
}
