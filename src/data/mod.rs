pub mod export;
pub mod loader;

pub use export::{export_to_csv, write_results};
pub use loader::{load_dictionary, load_receivables, load_transactions, parse_decimal};
