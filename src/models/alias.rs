use crate::error::{RecError, RecResult};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// 字典值: 单个别名或别名列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasValue {
    Single(String),
    Multi(Vec<String>),
}

impl AliasValue {
    /// 从 JSON 值解析，非字符串/字符串数组一律视为歧义
    pub fn from_json(counterparty: &str, value: &Value) -> RecResult<Self> {
        let ambiguous = |reason: &str| RecError::AmbiguousAliasForm {
            counterparty: counterparty.to_string(),
            reason: reason.to_string(),
        };

        match value {
            Value::String(s) => Ok(AliasValue::Single(s.clone())),
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(ambiguous("empty alias list"));
                }
                let aliases = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(ambiguous(&format!("list element is not a string: {}", other))),
                    })
                    .collect::<RecResult<Vec<_>>>()?;
                Ok(AliasValue::Multi(aliases))
            }
            Value::Null => Err(ambiguous("null alias")),
            other => Err(ambiguous(&format!("expected a string or a list of strings, got {}", other))),
        }
    }

    /// 归一化为大写、去空白、去重的别名集合 (可能为空，由调用方判定)
    pub fn normalize(&self) -> BTreeSet<String> {
        let raw: Vec<&str> = match self {
            AliasValue::Single(s) => vec![s.as_str()],
            AliasValue::Multi(list) => list.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// 对手方 -> 银行流水名称 字典
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasDictionary {
    entries: BTreeMap<String, AliasValue>,
}

impl AliasDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, counterparty: impl Into<String>, value: AliasValue) {
        let key: String = counterparty.into();
        self.entries.insert(key.trim().to_string(), value);
    }

    /// 追加一个别名; 同一对手方出现多次时升级为 Multi
    pub fn push_alias(&mut self, counterparty: &str, alias: impl Into<String>) {
        let alias = alias.into();
        let key = counterparty.trim().to_string();
        match self.entries.remove(&key) {
            None => {
                self.entries.insert(key, AliasValue::Single(alias));
            }
            Some(AliasValue::Single(first)) => {
                self.entries.insert(key, AliasValue::Multi(vec![first, alias]));
            }
            Some(AliasValue::Multi(mut list)) => {
                list.push(alias);
                self.entries.insert(key, AliasValue::Multi(list));
            }
        }
    }

    /// 从 JSON 对象构建
    pub fn from_json_map(map: &serde_json::Map<String, Value>) -> RecResult<Self> {
        let mut dict = Self::new();
        for (counterparty, value) in map {
            dict.insert(counterparty.as_str(), AliasValue::from_json(counterparty, value)?);
        }
        Ok(dict)
    }

    pub fn get(&self, counterparty: &str) -> Option<&AliasValue> {
        self.entries.get(counterparty.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AliasValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
