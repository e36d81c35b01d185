use super::{Receivable, Transaction, TransactionId};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NO_MATCH: &str = "No Match";

/// 匹配类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    Exact,
    Fuzzy,
    MultiTransaction,
    Unmatched,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::Exact => "Exact",
            MatchKind::Fuzzy => "Fuzzy",
            MatchKind::MultiTransaction => "MultiTransaction",
            MatchKind::Unmatched => "Unmatched",
        };
        f.write_str(s)
    }
}

/// 单条应收记录的匹配结果 (AR Rec)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub counterparty: String,
    pub net_billed: BigDecimal,
    pub matched_amount: Option<BigDecimal>,
    pub matched_transactions: Vec<Transaction>,
    pub match_kind: MatchKind,
    pub description: String,
    pub diagnostic: Option<String>,
}

impl MatchResult {
    pub fn single(receivable: &Receivable, transaction: Transaction, kind: MatchKind) -> Self {
        Self {
            counterparty: receivable.counterparty.clone(),
            net_billed: receivable.net_billed.clone(),
            matched_amount: Some(transaction.amount.clone()),
            description: transaction.description.clone(),
            matched_transactions: vec![transaction],
            match_kind: kind,
            diagnostic: None,
        }
    }

    pub fn multiple(receivable: &Receivable, transactions: Vec<Transaction>) -> Self {
        let total = transactions
            .iter()
            .fold(BigDecimal::zero(), |acc, t| acc + &t.amount);
        let amounts: Vec<String> = transactions.iter().map(|t| t.amount.to_string()).collect();
        Self {
            counterparty: receivable.counterparty.clone(),
            net_billed: receivable.net_billed.clone(),
            matched_amount: Some(total),
            description: format!("Multiple Transactions: ({})", amounts.join(", ")),
            matched_transactions: transactions,
            match_kind: MatchKind::MultiTransaction,
            diagnostic: None,
        }
    }

    pub fn unmatched(receivable: &Receivable, diagnostic: Option<String>) -> Self {
        Self {
            counterparty: receivable.counterparty.clone(),
            net_billed: receivable.net_billed.clone(),
            matched_amount: None,
            matched_transactions: Vec::new(),
            match_kind: MatchKind::Unmatched,
            description: NO_MATCH.to_string(),
            diagnostic,
        }
    }

    /// 名称+金额单笔命中
    pub fn is_perfect_match(&self) -> bool {
        matches!(self.match_kind, MatchKind::Exact | MatchKind::Fuzzy)
    }

    pub fn transaction_ids(&self) -> Vec<TransactionId> {
        self.matched_transactions.iter().map(|t| t.id).collect()
    }
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub exact: usize,
    pub fuzzy: usize,
    pub multi: usize,
    pub unmatched: usize,
    pub exhausted: usize,
    pub transactions_consumed: usize,
    pub total_matched_amount: BigDecimal,
}

impl RunStats {
    pub fn record(&mut self, result: &MatchResult) {
        self.total += 1;
        match result.match_kind {
            MatchKind::Exact => self.exact += 1,
            MatchKind::Fuzzy => self.fuzzy += 1,
            MatchKind::MultiTransaction => self.multi += 1,
            MatchKind::Unmatched => self.unmatched += 1,
        }
        if result.match_kind == MatchKind::Unmatched && result.diagnostic.is_some() {
            self.exhausted += 1;
        }
        self.transactions_consumed += result.matched_transactions.len();
        if let Some(amount) = &result.matched_amount {
            self.total_matched_amount += amount;
        }
    }

    pub fn matched(&self) -> usize {
        self.total - self.unmatched
    }
}

/// 一次对账运行的完整输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub results: Vec<MatchResult>,
    pub stats: RunStats,
    pub run_at: DateTime<Utc>,
}
