pub mod engine;
pub mod name_resolver;
pub mod pool;
pub mod subset_sum;

pub use engine::{FilterMode, ReconciliationEngine};
pub use name_resolver::{fuzzy_best, token_sort_ratio, NameResolver, DEFAULT_FUZZY_THRESHOLD};
pub use pool::{PoolView, TransactionPool};
pub use subset_sum::{Combination, SearchLimits, SubsetSumMatcher};
