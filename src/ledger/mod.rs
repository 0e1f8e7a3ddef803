//! Rider ledger.
//!
//! Cash-on-delivery means the rider walks away with the order total. The
//! rider keeps the delivery fee and owes the platform the rest. Debt only
//! grows through a delivery settlement and only shrinks through an admin
//! settle, which clears it entirely.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{SettlementRecord, User};
use crate::error::{LedgerError, RestrictionReason};

/// Debt above which a rider may not accept new jobs.
pub const DEFAULT_DEBT_LIMIT: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    pub debt_limit: Decimal,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            debt_limit: DEFAULT_DEBT_LIMIT,
        }
    }
}

impl LedgerPolicy {
    /// Why `rider` may not take new jobs, if anything.
    pub fn restriction(&self, rider: &User) -> Option<RestrictionReason> {
        if rider.is_suspended {
            return Some(RestrictionReason::Suspended);
        }
        if rider.amount_owed > self.debt_limit {
            return Some(RestrictionReason::DebtLimitExceeded {
                owed: rider.amount_owed,
                limit: self.debt_limit,
            });
        }
        None
    }

    pub fn is_restricted(&self, rider: &User) -> bool {
        self.restriction(rider).is_some()
    }

    pub fn wallet(&self, rider: &User) -> RiderWallet {
        RiderWallet {
            rider_id: rider.id.clone(),
            amount_owed: rider.amount_owed,
            debt_limit: self.debt_limit,
            is_suspended: rider.is_suspended,
            restriction: self.restriction(rider),
        }
    }
}

/// What a rider's wallet screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct RiderWallet {
    pub rider_id: String,
    pub amount_owed: Decimal,
    pub debt_limit: Decimal,
    pub is_suspended: bool,
    pub restriction: Option<RestrictionReason>,
}

/// Mutations of a rider's ledger.
#[derive(Debug, Clone)]
pub enum LedgerAction {
    /// Book a delivery's platform share against the rider.
    Charge(SettlementRecord),
    /// Clear all debt and lift any suspension.
    Settle,
    SetSuspended(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOutcome {
    Charged { amount_owed: Decimal },
    Settled { cleared: Decimal },
    SuspensionChanged { is_suspended: bool },
}

pub fn apply(rider: &mut User, action: LedgerAction) -> Result<LedgerOutcome, LedgerError> {
    if !rider.is_rider() {
        return Err(LedgerError::NotARider(rider.id.clone()));
    }
    match action {
        LedgerAction::Charge(record) => charge(rider, &record),
        LedgerAction::Settle => Ok(settle_debt(rider)),
        LedgerAction::SetSuspended(is_suspended) => {
            rider.is_suspended = is_suspended;
            Ok(LedgerOutcome::SuspensionChanged { is_suspended })
        }
    }
}

fn charge(rider: &mut User, record: &SettlementRecord) -> Result<LedgerOutcome, LedgerError> {
    if record.rider_id != rider.id {
        return Err(LedgerError::WrongRider {
            expected: record.rider_id.clone(),
            actual: rider.id.clone(),
        });
    }
    rider.amount_owed += record.amount.max(Decimal::ZERO);
    Ok(LedgerOutcome::Charged {
        amount_owed: rider.amount_owed,
    })
}

/// Resets debt to zero and lifts suspension, whatever the prior state.
pub fn settle_debt(rider: &mut User) -> LedgerOutcome {
    let cleared = rider.amount_owed;
    rider.amount_owed = Decimal::ZERO;
    rider.is_suspended = false;
    LedgerOutcome::Settled { cleared }
}
