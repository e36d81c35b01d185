use crate::error::{RecError, RecResult};
use crate::service::{FilterMode, SearchLimits, DEFAULT_FUZZY_THRESHOLD};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 环境变量前缀，如 BBREC__MATCHING__TOLERANCE=1.0
const ENV_PREFIX: &str = "BBREC";
const CONFIG_FILE: &str = "bbrec";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub matching: MatchingConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 匹配参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// 金额容差，没有默认值，必须显式配置
    pub tolerance: Option<BigDecimal>,
    pub fuzzy_threshold: f64,
    pub filter_mode: FilterMode,
    pub limits: SearchLimits,
}

/// 批量对账的输入输出文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub bank_path: PathBuf,
    pub receivables_path: PathBuf,
    pub dictionary_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            matching: MatchingConfig::default(),
            input: InputConfig {
                bank_path: PathBuf::from("data/Bank.csv"),
                receivables_path: PathBuf::from("data/Borrowing Base.csv"),
                dictionary_path: PathBuf::from("data/dictionary.csv"),
                output_path: PathBuf::from("data/Result.csv"),
            },
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            filter_mode: FilterMode::default(),
            limits: SearchLimits::default(),
        }
    }
}

impl MatchingConfig {
    pub fn with_tolerance(tolerance: BigDecimal) -> Self {
        Self {
            tolerance: Some(tolerance),
            ..Self::default()
        }
    }

    /// 容差必须已配置且不小于 0
    pub fn require_tolerance(&self) -> RecResult<&BigDecimal> {
        let tolerance = self.tolerance.as_ref().ok_or(RecError::MissingTolerance)?;
        if *tolerance < BigDecimal::zero() {
            return Err(RecError::InvalidMatchingConfig(format!(
                "tolerance must not be negative, got {}",
                tolerance
            )));
        }
        Ok(tolerance)
    }

    /// 校验全部匹配参数
    pub fn validate(&self) -> RecResult<()> {
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(RecError::InvalidMatchingConfig(format!(
                "fuzzy_threshold must be within 0..=100, got {}",
                self.fuzzy_threshold
            )));
        }
        self.require_tolerance().map(|_| ())
    }
}

/// 配置文件/环境变量的原始形态 (容差以字符串读入，避免浮点)
#[derive(Debug, Deserialize)]
struct RawConfig {
    server: ServerConfig,
    matching: RawMatching,
    input: InputConfig,
}

#[derive(Debug, Deserialize)]
struct RawMatching {
    tolerance: Option<String>,
    fuzzy_threshold: f64,
    filter_mode: FilterMode,
    #[serde(default)]
    limits: SearchLimits,
}

impl AppConfig {
    /// 从可选的 bbrec.{toml,json,...} 与环境变量加载配置
    pub fn from_env() -> RecResult<Self> {
        Self::build(config::File::with_name(CONFIG_FILE).required(false))
    }

    /// 从指定文件加载配置，环境变量仍可覆盖
    pub fn from_file(path: &Path) -> RecResult<Self> {
        Self::build(config::File::from(path))
    }

    fn build(file: config::File<config::FileSourceFile, config::FileFormat>) -> RecResult<Self> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host.clone())?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("matching.fuzzy_threshold", defaults.matching.fuzzy_threshold)?
            .set_default("matching.filter_mode", "substring")?
            .set_default("input.bank_path", path_str(&defaults.input.bank_path))?
            .set_default("input.receivables_path", path_str(&defaults.input.receivables_path))?
            .set_default("input.dictionary_path", path_str(&defaults.input.dictionary_path))?
            .set_default("input.output_path", path_str(&defaults.input.output_path))?
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let raw: RawConfig = settings.try_deserialize()?;
        let tolerance = match raw.matching.tolerance.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(BigDecimal::from_str(s).map_err(|e| {
                config::ConfigError::Message(format!("matching.tolerance '{}' is not a decimal: {}", s, e))
            })?),
        };

        Ok(Self {
            server: raw.server,
            matching: MatchingConfig {
                tolerance,
                fuzzy_threshold: raw.matching.fuzzy_threshold,
                filter_mode: raw.matching.filter_mode,
                limits: raw.matching.limits,
            },
            input: raw.input,
        })
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
