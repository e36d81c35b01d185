use super::name_resolver::{fuzzy_best, NameResolver};
use super::pool::{PoolView, TransactionPool};
use super::subset_sum::SubsetSumMatcher;
use crate::config::MatchingConfig;
use crate::error::{RecError, RecResult};
use crate::models::{MatchKind, MatchResult, Receivable, ReconciliationReport, RunStats, TransactionId};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 名称过滤方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// 流水描述包含别名即为候选
    #[default]
    Substring,
    /// 流水描述须与别名完全一致，失败后启用模糊名称匹配
    ExactDescription,
}

/// 对账引擎
///
/// 按输入顺序逐条处理应收记录，先到先得，不回溯:
/// 名称过滤 -> 单笔精确金额 -> (模糊名称 + 精确金额) -> 多笔子集和 -> 未匹配
pub struct ReconciliationEngine {
    resolver: NameResolver,
    pool: TransactionPool,
    matcher: SubsetSumMatcher,
    tolerance: BigDecimal,
    fuzzy_threshold: f64,
    filter_mode: FilterMode,
}

impl ReconciliationEngine {
    pub fn new(resolver: NameResolver, pool: TransactionPool, config: &MatchingConfig) -> RecResult<Self> {
        config.validate()?;
        let tolerance = config.require_tolerance()?.clone();
        Ok(Self {
            resolver,
            pool,
            matcher: SubsetSumMatcher::new(config.limits),
            tolerance,
            fuzzy_threshold: config.fuzzy_threshold,
            filter_mode: config.filter_mode,
        })
    }

    /// 批量对账入口，每条应收记录对应一条结果，顺序不变
    pub fn reconcile(&mut self, receivables: &[Receivable]) -> RecResult<ReconciliationReport> {
        let total = receivables.len();
        let mut results = Vec::with_capacity(total);
        let mut stats = RunStats::default();

        tracing::info!(
            "开始对账: {} 条应收, {} 笔流水 (未消费 {})",
            total,
            self.pool.len(),
            self.pool.len() - self.pool.consumed_count()
        );

        for (idx, receivable) in receivables.iter().enumerate() {
            let result = self.match_receivable(receivable)?;
            stats.record(&result);
            results.push(result);

            let current_idx = idx + 1;
            if current_idx % 100 == 0 || current_idx == 1 {
                tracing::info!(
                    "对账进度: {}/{}, 已匹配: {}, 已用流水: {}",
                    current_idx,
                    total,
                    stats.matched(),
                    self.pool.consumed_count()
                );
            }
        }

        tracing::info!(
            "对账完成: 总计 {}, Exact {}, Fuzzy {}, Multi {}, Unmatched {} (搜索超限 {}), 匹配金额 {}",
            stats.total,
            stats.exact,
            stats.fuzzy,
            stats.multi,
            stats.unmatched,
            stats.exhausted,
            stats.total_matched_amount
        );

        Ok(ReconciliationReport {
            results,
            stats,
            run_at: Utc::now(),
        })
    }

    /// 单条应收记录匹配; 只有消费不变式被破坏时返回错误
    pub fn match_receivable(&mut self, receivable: &Receivable) -> RecResult<MatchResult> {
        tracing::debug!(
            "Checking Counterparty: {} | Net Billed: {}",
            receivable.counterparty,
            receivable.net_billed
        );

        // 1. 名称过滤
        let aliases = self.resolver.resolve(&receivable.counterparty);
        let live = self.pool.unconsumed();
        let mut candidates = match self.filter_mode {
            FilterMode::Substring => self.pool.filter_by_alias(&live, &aliases),
            FilterMode::ExactDescription => {
                self.pool.filter_by_description(&live, aliases.iter().map(String::as_str))
            }
        };

        if candidates.is_empty() && self.filter_mode == FilterMode::Substring {
            tracing::debug!("No transactions found for: {}", receivable.counterparty);
            return Ok(MatchResult::unmatched(receivable, None));
        }

        // 2. 单笔精确金额
        if let Some(id) = self.first_exact(&candidates, &receivable.net_billed) {
            return self.consume_single(receivable, id, MatchKind::Exact);
        }

        // 3. 模糊名称 + 精确金额
        if self.filter_mode == FilterMode::ExactDescription {
            let fuzzy_view = self.fuzzy_candidates(&aliases, &live);
            if let Some(id) = self.first_exact(&fuzzy_view, &receivable.net_billed) {
                return self.consume_single(receivable, id, MatchKind::Fuzzy);
            }

            candidates.extend(fuzzy_view);
            candidates.sort_unstable();
            candidates.dedup();

            if candidates.is_empty() {
                tracing::debug!("No transactions found for: {}", receivable.counterparty);
                return Ok(MatchResult::unmatched(receivable, None));
            }
        }

        // 4. 多笔子集和
        let amounts = self.pool.amounts(&candidates);
        match self.matcher.find(&amounts, &receivable.net_billed, &self.tolerance) {
            Ok(Some(combo)) => {
                let ids: Vec<TransactionId> = combo.positions.iter().map(|&p| candidates[p]).collect();
                self.pool.mark_consumed(&ids)?;
                let result = MatchResult::multiple(receivable, self.pool.snapshot(&ids));
                tracing::debug!("Summed transaction match: {}", result.description);
                Ok(result)
            }
            Ok(None) => Ok(MatchResult::unmatched(receivable, None)),
            Err(e @ RecError::SearchExhausted { .. }) => {
                tracing::warn!(
                    "Counterparty {} ({} candidates): {}",
                    receivable.counterparty,
                    candidates.len(),
                    e
                );
                Ok(MatchResult::unmatched(receivable, Some(e.to_string())))
            }
            Err(e) => Err(e),
        }
    }

    fn first_exact(&self, view: &[TransactionId], amount: &BigDecimal) -> Option<TransactionId> {
        view.iter()
            .copied()
            .find(|id| self.pool.get(*id).map_or(false, |t| &t.amount == amount))
    }

    /// 按别名字典序逐个做模糊匹配，取第一个命中描述下的全部未消费流水
    ///
    /// 与别名完全相同的描述已在名称过滤阶段处理，这里只看其余描述。
    fn fuzzy_candidates(&self, aliases: &BTreeSet<String>, live: &[TransactionId]) -> PoolView {
        let mut descriptions = self.pool.distinct_descriptions(live);
        descriptions.retain(|d| !aliases.contains(*d));
        for alias in aliases {
            if let Some(best) = fuzzy_best(alias, descriptions.iter().copied(), self.fuzzy_threshold) {
                return self.pool.filter_by_description(live, [best]);
            }
        }
        Vec::new()
    }

    fn consume_single(
        &mut self,
        receivable: &Receivable,
        id: TransactionId,
        kind: MatchKind,
    ) -> RecResult<MatchResult> {
        self.pool.mark_consumed(&[id])?;
        let transaction = self
            .pool
            .get(id)
            .cloned()
            .ok_or(RecError::UnknownTransaction { id })?;
        Ok(MatchResult::single(receivable, transaction, kind))
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn into_pool(self) -> TransactionPool {
        self.pool
    }
}
