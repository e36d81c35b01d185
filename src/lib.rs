pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod service;

pub use config::{AppConfig, MatchingConfig};
pub use error::{RecError, RecResult};
pub use service::{NameResolver, ReconciliationEngine, SubsetSumMatcher, TransactionPool};
