//! Ledger transactions.
//!
//! Transactions are recorded, not settled: there are no balances, nonces or
//! fees, and any well-formed transaction is accepted into the pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender used for the reward a miner pays itself.
pub const REWARD_SENDER: &str = "0";

/// Amount of the mining reward.
pub const MINING_REWARD: i64 = 1;

/// A transfer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender identity.
    pub sender: String,
    /// Recipient identity.
    pub recipient: String,
    /// Transferred amount.
    pub amount: i64,
    /// When the node accepted the transaction.
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction stamped with the current time.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: i64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp: Utc::now(),
        }
    }

    /// The reward transaction a miner adds to its own block.
    pub fn reward(miner: impl Into<String>) -> Self {
        Self::new(REWARD_SENDER, miner, MINING_REWARD)
    }

    /// Check if this is a mining reward.
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
