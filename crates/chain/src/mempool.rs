//! Transaction pool for transactions not yet in a block.
//!
//! The pool keeps submission order and never drops anything on its own:
//! [`TransactionPool::drain`] is the only way out.

use ledger_core::Transaction;

/// Transactions waiting for the next mined block.
#[derive(Debug, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transaction at the end.
    pub fn add(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Take every pending transaction, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Snapshot of the pending transactions.
    pub fn pending(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Get the number of pending transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
