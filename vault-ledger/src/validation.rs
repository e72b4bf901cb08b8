//! Precondition guards for ledger operations
//!
//! Each operation runs a fixed chain of guards before touching state:
//!
//! - Deposit: non-zero → within bank cap
//! - Withdraw: non-zero → within withdraw cap → covered by balance
//!
//! The first failing guard wins.

use crate::{
    types::{Amount, Limits, Totals, Vault},
    Error, Result,
};

/// Amount must be positive
pub fn ensure_non_zero(amount: Amount) -> Result<()> {
    if amount == 0 {
        return Err(Error::ZeroAmount);
    }
    Ok(())
}

/// Aggregate funds after crediting `amount` must stay within the bank cap
///
/// Returns the new aggregate total. Overflow is reported as the cap being
/// exceeded at `Amount::MAX`.
pub fn ensure_within_bank_cap(limits: &Limits, totals: &Totals, amount: Amount) -> Result<Amount> {
    match totals.total_funds.checked_add(amount) {
        Some(total) if total <= limits.bank_cap => Ok(total),
        attempted => Err(Error::BankCapExceeded {
            attempted_total: attempted.unwrap_or(Amount::MAX),
            cap: limits.bank_cap,
        }),
    }
}

/// A single withdrawal may not exceed the withdraw cap
pub fn ensure_within_withdraw_cap(limits: &Limits, amount: Amount) -> Result<()> {
    if amount > limits.withdraw_cap {
        return Err(Error::WithdrawOverCap {
            requested: amount,
            cap: limits.withdraw_cap,
        });
    }
    Ok(())
}

/// Balance must cover the withdrawal
pub fn ensure_covered(vault: &Vault, amount: Amount) -> Result<()> {
    if amount > vault.balance {
        return Err(Error::InsufficientBalance {
            available: vault.balance,
            requested: amount,
        });
    }
    Ok(())
}

/// Run the deposit guard chain
pub fn check_deposit(limits: &Limits, totals: &Totals, amount: Amount) -> Result<Amount> {
    ensure_non_zero(amount)?;
    ensure_within_bank_cap(limits, totals, amount)
}

/// Run the withdraw guard chain
pub fn check_withdraw(limits: &Limits, vault: &Vault, amount: Amount) -> Result<()> {
    ensure_non_zero(amount)?;
    ensure_within_withdraw_cap(limits, amount)?;
    ensure_covered(vault, amount)
}
