use crate::models::TransactionId;

/// 对账流程错误
#[derive(Debug, thiserror::Error)]
pub enum RecError {
    /// 输入缺少必填字段或字段类型错误，在匹配开始前终止
    #[error("Invalid input schema in {source_name} (line {line}): {reason}")]
    InvalidInputSchema {
        source_name: String,
        line: u64,
        reason: String,
    },

    /// 字典值既不是单个别名也不是别名列表
    #[error("Ambiguous alias form for counterparty '{counterparty}': {reason}")]
    AmbiguousAliasForm { counterparty: String, reason: String },

    /// 同一笔流水被重复消费 (引擎缺陷)
    #[error("Transaction {id} already consumed")]
    AlreadyConsumed { id: TransactionId },

    #[error("Transaction {id} does not exist in the pool")]
    UnknownTransaction { id: TransactionId },

    /// 子集和搜索触达上限；单条应收记录降级为 Unmatched，不终止运行
    #[error("Subset-sum search exhausted after {examined} combinations: {reason}")]
    SearchExhausted { examined: u64, reason: String },

    #[error("Tolerance is not configured (set matching.tolerance or pass it with the request)")]
    MissingTolerance,

    /// 匹配参数越界 (负容差、阈值不在 0..=100)
    #[error("Invalid matching config: {0}")]
    InvalidMatchingConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RecError {
    pub fn invalid_input(source_name: impl Into<String>, line: u64, reason: impl Into<String>) -> Self {
        RecError::InvalidInputSchema {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }

    /// 是否由输入数据引起 (HTTP 层映射为 400)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RecError::InvalidInputSchema { .. }
                | RecError::AmbiguousAliasForm { .. }
                | RecError::MissingTolerance
                | RecError::InvalidMatchingConfig(_)
        )
    }
}

pub type RecResult<T> = Result<T, RecError>;
