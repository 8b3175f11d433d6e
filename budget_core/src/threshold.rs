//! Conversion between a rarest-drop probability and a kill budget.
//!
//! The budget for a drop with per-kill chance `p` is the smallest kill count
//! `n` for which `1 - (1 - p)^n >= 0.5`, i.e. `ceil(ln 0.5 / ln(1 - p))`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Persisted encoding of [`KillThreshold::Infinite`] (`i32::MAX`).
pub const INFINITE_THRESHOLD_RAW: i64 = i32::MAX as i64;

/// Largest finite budget; anything above is clamped here.
const MAX_FINITE_THRESHOLD: u32 = (i32::MAX - 1) as u32;

// Absorbs rounding in ln/exp so exact-integer budgets do not ceil up by one.
const CEIL_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropRate {
    /// Never budget-limited.
    Exempt,
    /// Per-kill probability of the rarest drop.
    Chance(f64),
}

impl DropRate {
    /// `1/denominator`, or `None` when the denominator is zero.
    pub fn from_denominator(denominator: u32) -> Option<Self> {
        (denominator > 0).then(|| DropRate::Chance(1.0 / f64::from(denominator)))
    }

    pub fn probability(self) -> Option<f64> {
        match self {
            DropRate::Exempt => None,
            DropRate::Chance(p) => Some(p),
        }
    }

    /// Nearest `x` in "1/x" form, for display.
    pub fn denominator(self) -> Option<u32> {
        match self {
            DropRate::Chance(p) if p > 0.0 && p <= 1.0 => {
                Some((1.0 / p).round().min(f64::from(u32::MAX)) as u32)
            }
            _ => None,
        }
    }

    pub fn is_exempt(self) -> bool {
        threshold_for(self) == KillThreshold::Infinite
    }
}

impl fmt::Display for DropRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.denominator()) {
            (DropRate::Exempt, _) => f.write_str("exempt"),
            (DropRate::Chance(_), Some(denominator)) => write!(f, "1/{denominator}"),
            (DropRate::Chance(p), None) => write!(f, "{p}"),
        }
    }
}

/// Kill budget for one monster type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum KillThreshold {
    Finite(u32),
    /// Never reached; attacks are never blocked.
    Infinite,
}

impl KillThreshold {
    pub fn is_infinite(self) -> bool {
        self == KillThreshold::Infinite
    }

    pub fn is_reached(self, kills: u32) -> bool {
        match self {
            KillThreshold::Finite(limit) => kills >= limit,
            KillThreshold::Infinite => false,
        }
    }
}

impl fmt::Display for KillThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KillThreshold::Finite(limit) => write!(f, "{limit}"),
            KillThreshold::Infinite => f.write_str("\u{221e}"),
        }
    }
}

impl From<KillThreshold> for i64 {
    fn from(threshold: KillThreshold) -> Self {
        match threshold {
            KillThreshold::Finite(limit) => i64::from(limit),
            KillThreshold::Infinite => INFINITE_THRESHOLD_RAW,
        }
    }
}

impl TryFrom<i64> for KillThreshold {
    type Error = InvalidThreshold;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw >= INFINITE_THRESHOLD_RAW {
            Ok(KillThreshold::Infinite)
        } else if raw <= 0 {
            Err(InvalidThreshold(raw))
        } else {
            Ok(KillThreshold::Finite(raw as u32))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidThreshold(pub i64);

impl fmt::Display for InvalidThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kill threshold must be positive, got {}", self.0)
    }
}

impl std::error::Error for InvalidThreshold {}

/// Kill budget for a drop rate.
///
/// `Exempt`, `p >= 1`, `p <= 0` and NaN all map to [`KillThreshold::Infinite`].
pub fn threshold_for(rate: DropRate) -> KillThreshold {
    let p = match rate {
        DropRate::Exempt => return KillThreshold::Infinite,
        DropRate::Chance(p) => p,
    };
    if !(p > 0.0 && p < 1.0) {
        return KillThreshold::Infinite;
    }

    let raw = 0.5f64.ln() / (-p).ln_1p();
    let kills = (raw - raw * CEIL_TOLERANCE).ceil();
    if kills >= f64::from(MAX_FINITE_THRESHOLD) {
        return KillThreshold::Finite(MAX_FINITE_THRESHOLD);
    }
    KillThreshold::Finite((kills as u32).max(1))
}

/// Inverse of [`threshold_for`]: the drop rate whose budget is exactly `threshold`.
///
/// `Finite(0)` is not a valid budget and must be rejected before calling this.
pub fn drop_rate_for(threshold: KillThreshold) -> DropRate {
    match threshold {
        KillThreshold::Infinite => DropRate::Exempt,
        KillThreshold::Finite(limit) => {
            DropRate::Chance(-(0.5f64.ln() / f64::from(limit)).exp_m1())
        }
    }
}

/// Largest `x` such that a 1/x drop has exactly this budget.
pub fn denominator_for(threshold: KillThreshold) -> Option<u32> {
    let p = drop_rate_for(threshold).probability()?;
    let denominator = (1.0 / p + 1e-9).floor();
    Some(denominator.min(f64::from(u32::MAX)) as u32)
}

/// Fraction of the budget used, clamped to `[0, 1]`; always 0 for infinite budgets.
pub fn progress(kills: u32, threshold: KillThreshold) -> f32 {
    match threshold {
        KillThreshold::Finite(limit) if limit > 0 => (kills as f32 / limit as f32).min(1.0),
        _ => 0.0,
    }
}
