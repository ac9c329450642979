//! Single-currency sun ledger.

/// Spendable sun counter.
///
/// [`SunLedger::debit`] is the only gate for affordability and
/// [`SunLedger::can_afford`] performs the identical comparison without
/// mutating, so placement checks and UI checks never diverge. Every
/// successful change is recorded and later drained by the simulation loop
/// into change notifications.
#[derive(Clone, Debug, Default)]
pub struct SunLedger {
    amount: u32,
    changes: Vec<u32>,
}

impl SunLedger {
    /// Creates a ledger holding the starting amount.
    #[must_use]
    pub fn new(amount: u32) -> Self {
        Self {
            amount,
            changes: Vec::new(),
        }
    }

    /// Current amount.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    /// Reports whether `cost` could be debited right now.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.amount >= cost
    }

    /// Adds sun unconditionally. Crediting zero changes nothing.
    pub fn credit(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.amount = self.amount.saturating_add(amount);
        self.changes.push(self.amount);
    }

    /// Removes `cost` if the ledger holds at least that much.
    ///
    /// A rejected debit leaves the amount untouched and records no change.
    pub fn debit(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.amount -= cost;
        self.changes.push(self.amount);
        true
    }

    /// Drains the amounts recorded after each successful change, oldest first.
    pub fn drain_changes(&mut self) -> impl Iterator<Item = u32> + '_ {
        self.changes.drain(..)
    }

    /// Replaces the amount, as when a session restarts.
    pub fn reset(&mut self, amount: u32) {
        self.amount = amount;
        self.changes.clear();
        self.changes.push(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debits_and_credits_follow_the_opening_scenario() {
        let mut ledger = SunLedger::new(150);

        assert!(ledger.debit(100));
        assert_eq!(ledger.amount(), 50);
        assert!(!ledger.debit(100));
        assert_eq!(ledger.amount(), 50);
        ledger.credit(50);
        assert_eq!(ledger.amount(), 100);
    }

    #[test]
    fn running_total_never_goes_negative() {
        let mut ledger = SunLedger::new(120);
        let costs = [50, 75, 25, 100, 0, 45, 1, 200];

        for cost in costs {
            let before = ledger.amount();
            let affordable = ledger.can_afford(cost);
            let debited = ledger.debit(cost);
            assert_eq!(affordable, debited);
            if debited {
                assert_eq!(ledger.amount(), before - cost);
            } else {
                assert_eq!(ledger.amount(), before);
            }
        }
    }

    #[test]
    fn only_successful_changes_are_recorded() {
        let mut ledger = SunLedger::new(50);
        assert!(!ledger.debit(75));
        ledger.credit(0);
        assert!(ledger.drain_changes().next().is_none());

        ledger.credit(25);
        assert!(ledger.debit(75));
        assert_eq!(ledger.drain_changes().collect::<Vec<_>>(), vec![75, 0]);
        assert!(ledger.drain_changes().next().is_none());
    }
}
