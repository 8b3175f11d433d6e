//! The single place kill-budget policy lives.
//!
//! Every interception point asks [`AttackGate::decide`]; none of them compares
//! kills against thresholds on its own.

use std::sync::Arc;

use crate::ledger::KillLedger;
use crate::registry::MonsterRegistry;
use crate::threshold::KillThreshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Block,
}

impl GateDecision {
    pub fn is_blocked(self) -> bool {
        self == GateDecision::Block
    }
}

/// Where a name stands against its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Not in the catalog and no override.
    Untracked,
    Exempt,
    Remaining { kills: u32, remaining: u32 },
    Reached { kills: u32, threshold: u32 },
}

impl BudgetStatus {
    pub fn decision(self) -> GateDecision {
        match self {
            BudgetStatus::Reached { .. } => GateDecision::Block,
            _ => GateDecision::Allow,
        }
    }
}

#[derive(Clone)]
pub struct AttackGate {
    registry: Arc<MonsterRegistry>,
    ledger: Arc<KillLedger>,
}

impl AttackGate {
    pub fn new(registry: Arc<MonsterRegistry>, ledger: Arc<KillLedger>) -> Self {
        Self { registry, ledger }
    }

    pub fn budget_status(&self, name: &str) -> BudgetStatus {
        if !self.registry.is_defined(name) {
            return BudgetStatus::Untracked;
        }
        let kills = self.ledger.kills(name);
        match self.registry.threshold(name) {
            KillThreshold::Infinite => BudgetStatus::Exempt,
            KillThreshold::Finite(threshold) if kills >= threshold => {
                BudgetStatus::Reached { kills, threshold }
            }
            KillThreshold::Finite(threshold) => BudgetStatus::Remaining {
                kills,
                remaining: threshold - kills,
            },
        }
    }

    pub fn decide(&self, name: &str) -> GateDecision {
        self.budget_status(name).decision()
    }

    /// Gate an entity that may have no resolvable name; unnamed targets always pass.
    pub fn decide_for(&self, name: Option<&str>) -> GateDecision {
        match name {
            Some(name) => self.decide(name),
            None => GateDecision::Allow,
        }
    }
}
