//! Lending policy: debt thresholds and the daily late fee
//!
//! The thresholds (warn at 400, refuse at 500) and the fee rate (10 per day)
//! are business parameters, not structural constraints. They are carried as
//! configuration with the historical defaults preserved; only the engine
//! consults them, and only at issue and return time.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn default_warn_threshold() -> u64 {
    400
}

fn default_debt_limit() -> u64 {
    500
}

fn default_daily_fee() -> u64 {
    10
}

/// Configurable lending policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingPolicy {
    /// Debt at or above this is flagged "approaching limit"
    #[serde(default = "default_warn_threshold")]
    pub debt_warn_threshold: u64,
    /// Debt at or above this makes a member ineligible to borrow
    #[serde(default = "default_debt_limit")]
    pub debt_limit: u64,
    /// Late fee per whole elapsed day, in whole currency units
    #[serde(default = "default_daily_fee")]
    pub daily_fee: u64,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            debt_warn_threshold: default_warn_threshold(),
            debt_limit: default_debt_limit(),
            daily_fee: default_daily_fee(),
        }
    }
}

impl LendingPolicy {
    /// Check the thresholds are coherent
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the warn threshold exceeds the limit.
    pub fn validate(&self) -> Result<()> {
        if self.debt_warn_threshold > self.debt_limit {
            return Err(Error::InvalidConfig(format!(
                "debt_warn_threshold ({}) must not exceed debt_limit ({})",
                self.debt_warn_threshold, self.debt_limit
            )));
        }
        Ok(())
    }

    /// Assess a member's borrowing eligibility from their outstanding debt
    pub fn assess(&self, outstanding_debt: u64) -> Eligibility {
        if outstanding_debt >= self.debt_limit {
            Eligibility::Ineligible
        } else if outstanding_debt >= self.debt_warn_threshold {
            Eligibility::ApproachingLimit
        } else {
            Eligibility::Eligible
        }
    }

    /// Fee for a loan held over the given number of whole days
    pub fn fee_for_days(&self, days: u64) -> u64 {
        days.saturating_mul(self.daily_fee)
    }
}

/// Borrowing eligibility derived from outstanding debt
///
/// Advisory except at issue time: `Ineligible` makes the engine reject an
/// issue, `ApproachingLimit` only flags the member for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Debt below the warn threshold
    Eligible,
    /// Debt between the warn threshold and the limit; still eligible
    ApproachingLimit,
    /// Debt at or over the limit; issue must be refused
    Ineligible,
}

impl Eligibility {
    /// Whether an issue is permitted at this level
    pub fn can_borrow(&self) -> bool {
        !matches!(self, Eligibility::Ineligible)
    }
}
