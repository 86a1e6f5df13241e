use std::fmt;

#[derive(Debug)]
pub enum LedgerError {
    Overdrawn,
    Frozen,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

pub struct Ledger {
    balance: i64,
    frozen: bool,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger { balance: 0, frozen: false }
    }

    pub fn credit(&mut self, amount: u32) {
        assert!(amount > 0, "credit must be positive");
        self.balance += amount as i64;
    }

    pub fn debit(&mut self, amount: u32) -> Result<i64, LedgerError> {
        if self.frozen {
            return Err(LedgerError::Frozen);
        }
        if amount as i64 > self.balance {
            return Err(LedgerError::Overdrawn);
        }
        self.balance -= amount as i64;
        Ok(self.balance)
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }
}

pub fn clamp_percent(value: i16) -> i16 {
    if value < 0 {
        return 0;
    }
    if value > 100 {
        return 100;
    }
    value
}
