use crate::error::{RecError, RecResult};
use crate::models::{Transaction, TransactionId, TransactionRecord};
use bigdecimal::BigDecimal;
use indexmap::IndexSet;
use std::collections::{BTreeSet, HashSet};

/// 流水视图: 按原始位置升序的流水标识
pub type PoolView = Vec<TransactionId>;

/// 流水池 - 按位置寻址的流水数组 + 消费标记
///
/// 过滤只返回视图，从不删除流水；消费标记只能由 false 变为 true。
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
    /// 大写描述，过滤时复用
    normalized: Vec<String>,
    consumed: Vec<bool>,
    /// 消费日志 (按消费顺序)
    consumption_log: IndexSet<TransactionId>,
}

impl TransactionPool {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        let mut transactions = Vec::with_capacity(records.len());
        let mut normalized = Vec::with_capacity(records.len());

        for (idx, record) in records.into_iter().enumerate() {
            normalized.push(record.description.to_uppercase());
            transactions.push(Transaction {
                id: TransactionId(idx),
                description: record.description,
                amount: record.amount,
                transaction_type: record.transaction_type,
            });
        }

        let consumed = vec![false; transactions.len()];
        Self {
            transactions,
            normalized,
            consumed,
            consumption_log: IndexSet::new(),
        }
    }

    /// 所有未消费的流水
    pub fn unconsumed(&self) -> PoolView {
        (0..self.transactions.len())
            .filter(|&idx| !self.consumed[idx])
            .map(TransactionId)
            .collect()
    }

    /// 描述中包含任一别名 (大小写无关子串) 的未消费流水
    pub fn filter_by_alias(&self, view: &[TransactionId], aliases: &BTreeSet<String>) -> PoolView {
        let needles: Vec<String> = aliases.iter().map(|a| a.to_uppercase()).collect();
        self.filter_view(view, |desc| needles.iter().any(|n| desc.contains(n.as_str())))
    }

    /// 描述与任一名称完全一致 (大小写无关) 的未消费流水
    pub fn filter_by_description<'a, I>(&self, view: &[TransactionId], descriptions: I) -> PoolView
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: HashSet<String> = descriptions.into_iter().map(str::to_uppercase).collect();
        self.filter_view(view, |desc| wanted.contains(desc))
    }

    fn filter_view<F>(&self, view: &[TransactionId], predicate: F) -> PoolView
    where
        F: Fn(&str) -> bool,
    {
        view.iter()
            .copied()
            .filter(|id| self.is_live(*id) && predicate(&self.normalized[id.0]))
            .collect()
    }

    /// 未消费流水的去重描述 (大写，字典序)
    pub fn distinct_descriptions(&self, view: &[TransactionId]) -> BTreeSet<&str> {
        view.iter()
            .filter(|id| self.is_live(**id))
            .map(|id| self.normalized[id.0].as_str())
            .collect()
    }

    /// 标记消费; 先整体校验再统一写入
    pub fn mark_consumed(&mut self, ids: &[TransactionId]) -> RecResult<()> {
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            if id.0 >= self.transactions.len() {
                return Err(RecError::UnknownTransaction { id });
            }
            if self.consumed[id.0] || !seen.insert(id) {
                return Err(RecError::AlreadyConsumed { id });
            }
        }

        for &id in ids {
            self.consumed[id.0] = true;
            self.consumption_log.insert(id);
        }
        Ok(())
    }

    /// 将全部流水标记为已消费
    pub fn consume_all(&mut self) -> RecResult<()> {
        let remaining = self.unconsumed();
        self.mark_consumed(&remaining)
    }

    /// 视图中流水的金额 (与视图顺序一致)
    pub fn amounts(&self, view: &[TransactionId]) -> Vec<BigDecimal> {
        view.iter()
            .filter_map(|id| self.get(*id))
            .map(|t| t.amount.clone())
            .collect()
    }

    /// 视图中流水的快照
    pub fn snapshot(&self, view: &[TransactionId]) -> Vec<Transaction> {
        view.iter().filter_map(|id| self.get(*id)).cloned().collect()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(id.0)
    }

    pub fn is_consumed(&self, id: TransactionId) -> bool {
        self.consumed.get(id.0).copied().unwrap_or(false)
    }

    fn is_live(&self, id: TransactionId) -> bool {
        id.0 < self.transactions.len() && !self.consumed[id.0]
    }

    pub fn consumption_log(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.consumption_log.iter().copied()
    }

    pub fn consumed_count(&self) -> usize {
        self.consumption_log.len()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pool() -> TransactionPool {
        let rec = |d: &str, a: &str| TransactionRecord::new(d, BigDecimal::from_str(a).unwrap(), "ACH");
        TransactionPool::new(vec![
            rec("Acme Corp Payment", "100.00"),
            rec("WIDGETCO INV 42", "999.99"),
            rec("ACME CORP PAYMENT", "50.00"),
        ])
    }

    fn aliases(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alias_filter_is_case_insensitive_and_positional() {
        let pool = pool();
        let view = pool.filter_by_alias(&pool.unconsumed(), &aliases(&["acme corp"]));
        assert_eq!(view, vec![TransactionId(0), TransactionId(2)]);
    }

    #[test]
    fn filtering_skips_consumed_and_never_mutates() {
        let mut pool = pool();
        let full = pool.unconsumed();
        pool.mark_consumed(&[TransactionId(0)]).unwrap();

        // 旧视图仍包含已消费流水，过滤结果需将其排除
        let view = pool.filter_by_alias(&full, &aliases(&["ACME"]));
        assert_eq!(view, vec![TransactionId(2)]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.unconsumed(), vec![TransactionId(1), TransactionId(2)]);
    }

    #[test]
    fn description_filter_requires_whole_description() {
        let pool = pool();
        let view = pool.filter_by_description(&pool.unconsumed(), ["widgetco inv 42", "ACME"]);
        assert_eq!(view, vec![TransactionId(1)]);
    }

    #[test]
    fn double_consumption_fails_without_partial_writes() {
        let mut pool = pool();
        pool.mark_consumed(&[TransactionId(1)]).unwrap();

        let err = pool.mark_consumed(&[TransactionId(0), TransactionId(1)]).unwrap_err();
        assert!(matches!(err, RecError::AlreadyConsumed { id } if id == TransactionId(1)));
        assert!(!pool.is_consumed(TransactionId(0)));

        let err = pool.mark_consumed(&[TransactionId(2), TransactionId(2)]).unwrap_err();
        assert!(matches!(err, RecError::AlreadyConsumed { .. }));
        assert!(!pool.is_consumed(TransactionId(2)));

        let err = pool.mark_consumed(&[TransactionId(9)]).unwrap_err();
        assert!(matches!(err, RecError::UnknownTransaction { .. }));
    }

    #[test]
    fn consumption_log_keeps_order() {
        let mut pool = pool();
        pool.mark_consumed(&[TransactionId(2)]).unwrap();
        pool.mark_consumed(&[TransactionId(0)]).unwrap();
        assert_eq!(pool.consumption_log().collect::<Vec<_>>(), vec![TransactionId(2), TransactionId(0)]);
        assert_eq!(pool.consumed_count(), 2);
    }
}
