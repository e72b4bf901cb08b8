//! In-memory ledger state
//!
//! `LedgerState` is owned by exactly one writer (the ledger actor). It knows
//! nothing about transfers or notifications: it applies checked transitions
//! and hands back enough of the prior state to undo a withdrawal.

use crate::{
    types::{AccountId, Amount, Limits, Totals, Vault},
    validation, Error, Result,
};
use std::collections::HashMap;

/// Account map plus running totals under fixed limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    limits: Limits,
    vaults: HashMap<AccountId, Vault>,
    totals: Totals,
}

/// A withdrawal whose effects are applied but not yet committed
///
/// Passing it to [`LedgerState::rollback`] restores the account and totals
/// exactly as they were before the debit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a staged withdrawal must be committed or rolled back"]
pub struct StagedWithdrawal {
    account: AccountId,
    amount: Amount,
    vault_before: Vault,
    totals_before: Totals,
    new_balance: Amount,
}

impl StagedWithdrawal {
    /// Account being debited
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Amount debited
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Balance after the debit
    pub fn new_balance(&self) -> Amount {
        self.new_balance
    }
}

impl LedgerState {
    /// Create an empty ledger under `limits`
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            vaults: HashMap::new(),
            totals: Totals::default(),
        }
    }

    /// Policy limits
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Running totals
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Account record, zeroed if never touched
    pub fn vault(&self, account: &AccountId) -> Vault {
        self.vaults.get(account).copied().unwrap_or_default()
    }

    /// Number of accounts that have been touched
    pub fn account_count(&self) -> usize {
        self.vaults.len()
    }

    /// Credit `amount` to `account`
    ///
    /// Shared by explicit deposits and bare value transfers. Returns the new
    /// balance. Nothing is written unless every guard passes.
    pub fn credit(&mut self, account: &AccountId, amount: Amount) -> Result<Amount> {
        let new_total = validation::check_deposit(&self.limits, &self.totals, amount)?;

        let vault = self.vaults.entry(account.clone()).or_default();
        // total_funds bounds every balance, so this cannot overflow
        vault.balance += amount;
        vault.deposit_count += 1;
        let new_balance = vault.balance;

        self.totals.total_funds = new_total;
        self.totals.total_deposits += 1;

        Ok(new_balance)
    }

    /// Check and apply the effects of a withdrawal
    ///
    /// The debit is visible immediately; the caller must either
    /// [`commit`](Self::commit) or [`rollback`](Self::rollback) it once the
    /// outbound transfer settles.
    pub fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<StagedWithdrawal> {
        let vault_before = self.vault(account);
        validation::check_withdraw(&self.limits, &vault_before, amount)?;

        let totals_before = self.totals;
        let vault = self.vaults.entry(account.clone()).or_default();
        vault.balance -= amount;
        vault.withdraw_count += 1;
        let new_balance = vault.balance;

        self.totals.total_funds -= amount;
        self.totals.total_withdrawals += 1;

        Ok(StagedWithdrawal {
            account: account.clone(),
            amount,
            vault_before,
            totals_before,
            new_balance,
        })
    }

    /// Keep a staged withdrawal
    pub fn commit(&mut self, staged: StagedWithdrawal) -> Amount {
        staged.new_balance
    }

    /// Undo a staged withdrawal
    pub fn rollback(&mut self, staged: StagedWithdrawal) {
        self.vaults.insert(staged.account, staged.vault_before);
        self.totals = staged.totals_before;
    }

    /// Recompute aggregate funds and compare with the running totals
    pub fn audit(&self) -> Result<()> {
        let sum = self
            .vaults
            .values()
            .try_fold(0 as Amount, |acc, vault| acc.checked_add(vault.balance))
            .ok_or_else(|| Error::InvariantViolation("sum of balances overflows".to_string()))?;

        if sum != self.totals.total_funds {
            return Err(Error::InvariantViolation(format!(
                "total_funds {} != sum of balances {}",
                self.totals.total_funds, sum
            )));
        }

        if self.totals.total_funds > self.limits.bank_cap {
            return Err(Error::InvariantViolation(format!(
                "total_funds {} exceeds bank cap {}",
                self.totals.total_funds, self.limits.bank_cap
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn test_credit_updates_vault_and_totals() {
        let mut state = LedgerState::new(Limits::new(10, 5));

        assert_eq!(state.credit(&alice(), 8).unwrap(), 8);

        let vault = state.vault(&alice());
        assert_eq!(vault.balance, 8);
        assert_eq!(vault.deposit_count, 1);
        assert_eq!(state.totals().total_funds, 8);
        assert_eq!(state.totals().total_deposits, 1);
        state.audit().unwrap();
    }

    #[test]
    fn test_rejected_credit_leaves_state_untouched() {
        let mut state = LedgerState::new(Limits::new(10, 5));
        state.credit(&alice(), 8).unwrap();
        let before = state.clone();

        assert!(state.credit(&AccountId::new("bob"), 0).is_err());
        assert!(state.credit(&AccountId::new("bob"), 3).is_err());

        assert_eq!(state, before);
        // Rejected deposits never create the account
        assert_eq!(state.account_count(), 1);
    }

    #[test]
    fn test_debit_then_rollback_restores_state() {
        let mut state = LedgerState::new(Limits::new(10, 5));
        state.credit(&alice(), 8).unwrap();
        let before = state.clone();

        let staged = state.debit(&alice(), 5).unwrap();
        assert_eq!(staged.new_balance(), 3);
        assert_eq!(state.vault(&alice()).balance, 3);
        assert_eq!(state.totals().total_withdrawals, 1);

        state.rollback(staged);
        assert_eq!(state, before);
    }

    #[test]
    fn test_debit_commit() {
        let mut state = LedgerState::new(Limits::new(10, 5));
        state.credit(&alice(), 8).unwrap();

        let staged = state.debit(&alice(), 5).unwrap();
        assert_eq!(state.commit(staged), 3);

        let vault = state.vault(&alice());
        assert_eq!(vault.balance, 3);
        assert_eq!(vault.withdraw_count, 1);
        assert_eq!(state.totals().total_funds, 3);
        state.audit().unwrap();
    }

    #[test]
    fn test_debit_unknown_account_does_not_create_it() {
        let mut state = LedgerState::new(Limits::new(10, 5));

        assert!(matches!(
            state.debit(&alice(), 1),
            Err(Error::InsufficientBalance {
                available: 0,
                requested: 1
            })
        ));
        assert_eq!(state.account_count(), 0);
    }
}
