pub mod alias;
pub mod receivable;
pub mod result;
pub mod transaction;

pub use alias::{AliasDictionary, AliasValue};
pub use receivable::Receivable;
pub use result::{MatchKind, MatchResult, ReconciliationReport, RunStats, NO_MATCH};
pub use transaction::{Transaction, TransactionId, TransactionRecord};
