use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 流水标识 (按原始加载顺序的位置)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub usize);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 银行流水输入行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub description: String,
    pub amount: BigDecimal,
    #[serde(default)]
    pub transaction_type: String,
}

impl TransactionRecord {
    pub fn new(description: impl Into<String>, amount: BigDecimal, transaction_type: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount,
            transaction_type: transaction_type.into(),
        }
    }
}

/// 银行流水 (加载后不可变，消费状态由 TransactionPool 维护)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: BigDecimal,
    pub transaction_type: String,
}
