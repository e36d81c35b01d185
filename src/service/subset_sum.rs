use crate::error::{RecError, RecResult};
use bigdecimal::{BigDecimal, Zero};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// 子集和搜索上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// 候选数量超过该值时直接放弃搜索
    pub max_candidates: usize,
    /// 最大组合大小; None 表示不限制
    pub max_combination_size: Option<usize>,
    /// 最多检查的组合数
    pub max_combinations: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_candidates: 24,
            max_combination_size: None,
            max_combinations: 2_000_000,
        }
    }
}

/// 命中的组合 (位置升序)
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub positions: Vec<usize>,
    pub amounts: Vec<BigDecimal>,
    pub total: BigDecimal,
}

/// 子集和匹配器
///
/// 按组合大小 r = 1, 2, ... 递增枚举，同一大小内按位置字典序枚举，
/// 返回第一个满足 |sum - target| <= tolerance 的组合。
/// 该"先少后多、先前后后"的取舍规则是固定策略，替换实现时需保持一致。
#[derive(Debug, Clone, Default)]
pub struct SubsetSumMatcher {
    limits: SearchLimits,
}

impl SubsetSumMatcher {
    pub fn new(limits: SearchLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// 无命中返回 `Ok(None)`; 触达上限返回 `SearchExhausted`
    pub fn find(
        &self,
        amounts: &[BigDecimal],
        target: &BigDecimal,
        tolerance: &BigDecimal,
    ) -> RecResult<Option<Combination>> {
        let n = amounts.len();
        if n == 0 {
            return Ok(None);
        }

        if n > self.limits.max_candidates {
            return Err(RecError::SearchExhausted {
                examined: 0,
                reason: format!(
                    "{} candidates exceed max_candidates {}",
                    n, self.limits.max_candidates
                ),
            });
        }

        let max_size = self.limits.max_combination_size.map_or(n, |cap| cap.min(n));
        let mut examined: u64 = 0;

        for r in 1..=max_size {
            for positions in (0..n).combinations(r) {
                if examined >= self.limits.max_combinations {
                    return Err(RecError::SearchExhausted {
                        examined,
                        reason: format!(
                            "reached max_combinations {} at size {}",
                            self.limits.max_combinations, r
                        ),
                    });
                }
                examined += 1;

                let total = positions
                    .iter()
                    .fold(BigDecimal::zero(), |acc, &p| acc + &amounts[p]);
                if (&total - target).abs() <= *tolerance {
                    tracing::debug!(
                        "subset-sum hit at size {} after {} combinations: {:?}",
                        r, examined, positions
                    );
                    let picked = positions.iter().map(|&p| amounts[p].clone()).collect();
                    return Ok(Some(Combination {
                        positions,
                        amounts: picked,
                        total,
                    }));
                }
            }
        }

        if max_size < n {
            return Err(RecError::SearchExhausted {
                examined,
                reason: format!("combination size capped at {} of {} candidates", max_size, n),
            });
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn decs(list: &[&str]) -> Vec<BigDecimal> {
        list.iter().map(|s| dec(s)).collect()
    }

    #[test]
    fn prefers_smaller_combinations() {
        let m = SubsetSumMatcher::default();
        // 100 + 50 与单笔 150 都满足，单笔优先
        let hit = m
            .find(&decs(&["100", "50", "150"]), &dec("150"), &dec("0"))
            .unwrap()
            .unwrap();
        assert_eq!(hit.positions, vec![2]);
    }

    #[test]
    fn same_size_picks_earliest_positions() {
        let m = SubsetSumMatcher::default();
        let hit = m
            .find(&decs(&["10", "20", "30", "40"]), &dec("50"), &dec("0"))
            .unwrap()
            .unwrap();
        assert_eq!(hit.positions, vec![0, 3]);
        assert_eq!(hit.amounts, decs(&["10", "40"]));
        assert_eq!(hit.total, dec("50"));
    }

    #[test]
    fn tolerance_is_inclusive() {
        let m = SubsetSumMatcher::default();
        let hit = m.find(&decs(&["99.00"]), &dec("100.00"), &dec("1.0")).unwrap();
        assert!(hit.is_some());
        let miss = m.find(&decs(&["98.99"]), &dec("100.00"), &dec("1.0")).unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn empty_input_is_not_exhaustion() {
        let m = SubsetSumMatcher::default();
        assert_eq!(m.find(&[], &dec("1"), &dec("0")).unwrap(), None);
    }

    #[test]
    fn candidate_cap_aborts_before_searching() {
        let m = SubsetSumMatcher::new(SearchLimits {
            max_candidates: 2,
            ..SearchLimits::default()
        });
        let err = m.find(&decs(&["1", "2", "3"]), &dec("1"), &dec("0")).unwrap_err();
        assert!(matches!(err, RecError::SearchExhausted { examined: 0, .. }));
    }

    #[test]
    fn combination_budget_reports_exhaustion() {
        let m = SubsetSumMatcher::new(SearchLimits {
            max_combinations: 3,
            ..SearchLimits::default()
        });
        let err = m.find(&decs(&["1", "2", "4"]), &dec("7"), &dec("0")).unwrap_err();
        assert!(matches!(err, RecError::SearchExhausted { examined: 3, .. }));
    }

    #[test]
    fn size_cap_reports_exhaustion_only_when_sizes_were_skipped() {
        let capped = SubsetSumMatcher::new(SearchLimits {
            max_combination_size: Some(2),
            ..SearchLimits::default()
        });
        let err = capped.find(&decs(&["1", "2", "4"]), &dec("7"), &dec("0")).unwrap_err();
        assert!(matches!(err, RecError::SearchExhausted { .. }));

        let uncapped = SubsetSumMatcher::default();
        assert_eq!(uncapped.find(&decs(&["1", "2", "4"]), &dec("100"), &dec("0")).unwrap(), None);
    }
}
