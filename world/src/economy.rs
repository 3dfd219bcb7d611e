//! Coin balance bookkeeping.

use tower_defense_core::Rejection;

/// Session-scoped coin balance. Every credit and debit flows through here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EconomyLedger {
    balance: u32,
    earned: u32,
}

impl EconomyLedger {
    /// Opens a ledger with the provided starting balance.
    #[must_use]
    pub const fn new(balance: u32) -> Self {
        Self { balance, earned: 0 }
    }

    /// Coins currently available.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.balance
    }

    /// Coins earned from kills and wave bonuses this session.
    #[must_use]
    pub const fn earned(&self) -> u32 {
        self.earned
    }

    /// Fails with `InsufficientFunds` unless `amount` can be debited.
    pub fn ensure_affordable(&self, amount: u32) -> Result<(), Rejection> {
        if amount > self.balance {
            return Err(Rejection::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Removes coins; the balance never goes negative.
    pub fn debit(&mut self, amount: u32) -> Result<(), Rejection> {
        self.ensure_affordable(amount)?;
        self.balance -= amount;
        Ok(())
    }

    /// Adds coins without counting them as earnings, as refunds do.
    pub fn credit(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Adds coins earned through play, such as kill rewards and wave bonuses.
    pub fn credit_earning(&mut self, amount: u32) {
        self.credit(amount);
        self.earned = self.earned.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_of_exact_balance_leaves_zero() {
        let mut ledger = EconomyLedger::new(50);
        assert_eq!(ledger.debit(50), Ok(()));
        assert_eq!(ledger.balance(), 0);
    }

    #[test]
    fn overdraft_is_refused_without_mutation() {
        let mut ledger = EconomyLedger::new(49);
        assert_eq!(
            ledger.debit(50),
            Err(Rejection::InsufficientFunds {
                required: 50,
                available: 49
            })
        );
        assert_eq!(ledger.balance(), 49);
    }

    #[test]
    fn only_earnings_count_towards_earned() {
        let mut ledger = EconomyLedger::new(0);
        ledger.credit(25);
        ledger.credit_earning(10);
        assert_eq!(ledger.balance(), 35);
        assert_eq!(ledger.earned(), 10);
    }
}
