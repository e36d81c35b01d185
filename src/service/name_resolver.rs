use crate::error::{RecError, RecResult};
use crate::models::AliasDictionary;
use std::collections::{BTreeSet, HashMap};

/// 模糊匹配默认阈值
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 85.0;

/// 对手方名称解析: 字典映射优先，缺失时回退为大写的对手方名称
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    aliases: HashMap<String, BTreeSet<String>>,
}

impl NameResolver {
    /// 构建时统一归一化单别名/多别名两种字典值
    pub fn from_dictionary(dictionary: &AliasDictionary) -> RecResult<Self> {
        let mut aliases = HashMap::with_capacity(dictionary.len());
        for (counterparty, value) in dictionary.iter() {
            let set = value.normalize();
            if set.is_empty() {
                return Err(RecError::AmbiguousAliasForm {
                    counterparty: counterparty.clone(),
                    reason: "no usable alias after normalization".to_string(),
                });
            }
            aliases.insert(counterparty.clone(), set);
        }

        tracing::debug!("NameResolver built with {} dictionary entries", aliases.len());
        Ok(Self { aliases })
    }

    /// 返回别名集合，永不为空
    pub fn resolve(&self, counterparty: &str) -> BTreeSet<String> {
        let key = counterparty.trim();
        match self.aliases.get(key) {
            Some(set) => set.clone(),
            None => BTreeSet::from([key.to_uppercase()]),
        }
    }

    pub fn contains(&self, counterparty: &str) -> bool {
        self.aliases.contains_key(counterparty.trim())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// 在候选集合中找与 query 最相似的一项
///
/// 得分低于 `threshold` 时返回 `None`，等于阈值视为命中。
/// 同分时取字典序最小的候选，结果与候选的迭代顺序无关。
pub fn fuzzy_best<'a, I>(query: &str, candidates: I, threshold: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;

    for candidate in candidates {
        let score = token_sort_ratio(query, candidate);
        let is_better = match best {
            None => true,
            Some((best_candidate, best_score)) => {
                score > best_score || (score == best_score && candidate < best_candidate)
            }
        };
        if is_better {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) if score >= threshold => {
            tracing::debug!("fuzzy match '{}' -> '{}' (score {:.2})", query, candidate, score);
            Some(candidate)
        }
        Some((candidate, score)) => {
            tracing::debug!(
                "fuzzy match '{}' rejected, best '{}' scored {:.2} < {:.2}",
                query, candidate, score, threshold
            );
            None
        }
        None => None,
    }
}

/// 词序无关、大小写无关的相似度 [0, 100]
///
/// 两边先转大写、按空白切词、排序后以单个空格拼接，
/// 再计算归一化 Indel 相似度 `200 * LCS / (len_a + len_b)`。
/// 任一边为空 (包括两边都为空) 时得分为 0: 这是固定策略，
/// 空白名称不应命中任何描述；rapidfuzz 对 ("", "") 的处理与此不同。
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let lcs = lcs_len(&a, &b);
    200.0 * lcs as f64 / (a.len() + b.len()) as f64
}

fn sorted_tokens(s: &str) -> String {
    let upper = s.to_uppercase();
    let mut tokens: Vec<&str> = upper.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AliasValue;

    fn resolver() -> NameResolver {
        let mut dict = AliasDictionary::new();
        dict.insert("ACME", AliasValue::Single("Acme Corp".into()));
        dict.insert("WIDGETCO", AliasValue::Multi(vec!["widgetco".into(), "WIDGET CO".into()]));
        NameResolver::from_dictionary(&dict).unwrap()
    }

    #[test]
    fn resolves_dictionary_aliases() {
        let r = resolver();
        assert_eq!(r.resolve("ACME"), BTreeSet::from(["ACME CORP".to_string()]));
        assert_eq!(
            r.resolve("WIDGETCO"),
            BTreeSet::from(["WIDGET CO".to_string(), "WIDGETCO".to_string()])
        );
    }

    #[test]
    fn unknown_counterparty_falls_back_to_uppercased_name() {
        let r = resolver();
        assert_eq!(r.resolve("Ghost llc"), BTreeSet::from(["GHOST LLC".to_string()]));
        assert!(!r.contains("Ghost llc"));
    }

    #[test]
    fn blank_dictionary_value_is_ambiguous() {
        let mut dict = AliasDictionary::new();
        dict.insert("ACME", AliasValue::Multi(vec!["  ".into()]));
        let err = NameResolver::from_dictionary(&dict).unwrap_err();
        assert!(matches!(err, RecError::AmbiguousAliasForm { .. }));
    }

    #[test]
    fn token_sort_ratio_ignores_order_and_case() {
        assert_eq!(token_sort_ratio("acme corp", "CORP ACME"), 100.0);
        assert_eq!(token_sort_ratio("ABCD", "ABCE"), 75.0);
        assert_eq!(token_sort_ratio("", "ACME"), 0.0);
        assert_eq!(token_sort_ratio("  ", ""), 0.0);
        assert_eq!(token_sort_ratio("ABC", "XYZ"), 0.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let candidates = ["ABCE"];
        assert_eq!(fuzzy_best("ABCD", candidates, 75.0), Some("ABCE"));
        assert_eq!(fuzzy_best("ABCD", candidates, 76.0), None);
    }

    #[test]
    fn ties_pick_lexicographically_first() {
        // 三个候选得分相同
        let candidates = ["ACME X", "ACME B", "ACME Z"];
        assert_eq!(fuzzy_best("ACME A", candidates, 0.0), Some("ACME B"));
    }

    #[test]
    fn empty_candidates_yield_none() {
        assert_eq!(fuzzy_best("ACME", std::iter::empty(), 0.0), None);
    }
}
