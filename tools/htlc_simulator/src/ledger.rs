//! Token movements in and out of custody.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Address, LedgerError};

/// The two transfers the protocol needs. Implementations must leave their
/// balances untouched when they return an error.
pub trait TokenLedger {
    fn pull(&mut self, asset: Address, from: Address, amount: u64) -> Result<(), LedgerError>;
    fn push(&mut self, asset: Address, to: Address, amount: u64) -> Result<(), LedgerError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<Address, BTreeMap<Address, u64>>,
    custody: BTreeMap<Address, u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, asset: Address, to: Address, amount: u64) -> Result<u64, LedgerError> {
        let balance = self.balances.entry(asset).or_default().entry(to).or_default();
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(*balance)
    }

    pub fn balance_of(&self, asset: Address, holder: Address) -> u64 {
        self.balances
            .get(&asset)
            .and_then(|holders| holders.get(&holder))
            .copied()
            .unwrap_or(0)
    }

    pub fn custody_of(&self, asset: Address) -> u64 {
        self.custody.get(&asset).copied().unwrap_or(0)
    }
}

impl TokenLedger for InMemoryLedger {
    fn pull(&mut self, asset: Address, from: Address, amount: u64) -> Result<(), LedgerError> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let held = self.custody_of(asset);
        let new_held = held.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.balances
            .entry(asset)
            .or_default()
            .insert(from, available - amount);
        self.custody.insert(asset, new_held);
        Ok(())
    }

    fn push(&mut self, asset: Address, to: Address, amount: u64) -> Result<(), LedgerError> {
        let held = self.custody_of(asset);
        if held < amount {
            return Err(LedgerError::InsufficientCustody {
                needed: amount,
                held,
            });
        }
        let current = self.balance_of(asset, to);
        let new_balance = current.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.custody.insert(asset, held - amount);
        self.balances
            .entry(asset)
            .or_default()
            .insert(to, new_balance);
        Ok(())
    }
}
