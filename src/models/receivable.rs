use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// 应收记录 (Borrowing Base 中的一行)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receivable {
    pub counterparty: String,
    pub net_billed: BigDecimal,
}

impl Receivable {
    pub fn new(counterparty: impl Into<String>, net_billed: BigDecimal) -> Self {
        Self {
            counterparty: counterparty.into(),
            net_billed,
        }
    }

    /// 上游过滤条件: net_billed > 0
    pub fn is_billable(&self) -> bool {
        self.net_billed > BigDecimal::zero()
    }
}
