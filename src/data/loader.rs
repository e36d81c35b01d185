use crate::error::{RecError, RecResult};
use crate::models::{AliasDictionary, Receivable, TransactionRecord};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

pub const BANK_COLUMNS: [&str; 3] = ["DESCRIPTION", "AMOUNT", "TRAN TYPE"];
pub const RECEIVABLE_COLUMNS: [&str; 2] = ["Counterparty", "Net Billed"];
pub const DICTIONARY_COLUMNS: [&str; 2] = ["Counterparty", "Bank Statement Name"];

#[derive(Debug, Deserialize)]
struct BankRow {
    #[serde(rename = "DESCRIPTION")]
    description: Option<String>,
    #[serde(rename = "AMOUNT")]
    amount: Option<String>,
    #[serde(rename = "TRAN TYPE")]
    tran_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReceivableRow {
    #[serde(rename = "Counterparty")]
    counterparty: Option<String>,
    #[serde(rename = "Net Billed")]
    net_billed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DictionaryRow {
    #[serde(rename = "Counterparty")]
    counterparty: Option<String>,
    #[serde(rename = "Bank Statement Name")]
    statement_name: Option<String>,
}

/// 读取银行流水 CSV (DESCRIPTION, AMOUNT, TRAN TYPE)
pub fn load_transactions(path: &Path) -> RecResult<Vec<TransactionRecord>> {
    let source = path.display().to_string();
    let mut reader = open(path, &BANK_COLUMNS)?;

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<BankRow>().enumerate() {
        let line = data_line(idx);
        let row = row.map_err(|e| RecError::invalid_input(&source, line, e.to_string()))?;
        let description = required(&source, line, "DESCRIPTION", row.description)?;
        let amount = parse_amount(&source, line, "AMOUNT", row.amount)?;
        records.push(TransactionRecord::new(description, amount, row.tran_type.unwrap_or_default()));
    }

    tracing::info!("Bank file loaded: {} ({} transactions)", source, records.len());
    Ok(records)
}

/// 读取应收 CSV (Counterparty, Net Billed)，只保留 net_billed > 0 的记录
pub fn load_receivables(path: &Path) -> RecResult<Vec<Receivable>> {
    let source = path.display().to_string();
    let mut reader = open(path, &RECEIVABLE_COLUMNS)?;

    let mut receivables = Vec::new();
    let mut skipped = 0usize;
    for (idx, row) in reader.deserialize::<ReceivableRow>().enumerate() {
        let line = data_line(idx);
        let row = row.map_err(|e| RecError::invalid_input(&source, line, e.to_string()))?;
        let counterparty = required(&source, line, "Counterparty", row.counterparty)?;
        let net_billed = parse_amount(&source, line, "Net Billed", row.net_billed)?;

        let receivable = Receivable::new(counterparty, net_billed);
        if receivable.is_billable() {
            receivables.push(receivable);
        } else {
            skipped += 1;
        }
    }

    tracing::info!(
        "Borrowing Base file loaded: {} ({} receivables, {} non-positive skipped)",
        source,
        receivables.len(),
        skipped
    );
    Ok(receivables)
}

/// 读取字典 CSV (Counterparty, Bank Statement Name)
///
/// 名称为空的行被丢弃；同一对手方的多行合并为别名列表。
pub fn load_dictionary(path: &Path) -> RecResult<AliasDictionary> {
    let source = path.display().to_string();
    let mut reader = open(path, &DICTIONARY_COLUMNS)?;

    let mut dictionary = AliasDictionary::new();
    for (idx, row) in reader.deserialize::<DictionaryRow>().enumerate() {
        let line = data_line(idx);
        let row = row.map_err(|e| RecError::invalid_input(&source, line, e.to_string()))?;
        let counterparty = required(&source, line, "Counterparty", row.counterparty)?;
        match row.statement_name.filter(|s| !s.trim().is_empty()) {
            Some(name) => dictionary.push_alias(&counterparty, name),
            None => tracing::debug!("{} line {}: blank statement name for {}", source, line, counterparty),
        }
    }

    tracing::info!("Dictionary file loaded: {} ({} counterparties)", source, dictionary.len());
    Ok(dictionary)
}

fn open(path: &Path, columns: &[&str]) -> RecResult<csv::Reader<File>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    for column in columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(RecError::invalid_input(
                path.display().to_string(),
                1,
                format!("missing column '{}'", column),
            ));
        }
    }
    Ok(reader)
}

/// 表头占第 1 行
fn data_line(idx: usize) -> u64 {
    idx as u64 + 2
}

fn required(source: &str, line: u64, field: &str, value: Option<String>) -> RecResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RecError::invalid_input(source, line, format!("'{}' is empty", field))),
    }
}

fn parse_amount(source: &str, line: u64, field: &str, value: Option<String>) -> RecResult<BigDecimal> {
    let raw = required(source, line, field, value)?;
    parse_decimal(&raw).ok_or_else(|| {
        RecError::invalid_input(source, line, format!("'{}' is not a decimal: {}", field, raw))
    })
}

/// 解析金额，支持千分位、货币符号以及会计格式的括号负数
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();

    let negative = s.starts_with('(') && s.ends_with(')');
    if negative {
        s = s[1..s.len() - 1].to_string();
    }

    let value = BigDecimal::from_str(s.trim()).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AliasValue;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_accounting_amounts() {
        assert_eq!(parse_decimal("1,234.50"), Some(dec("1234.50")));
        assert_eq!(parse_decimal(" $99.99 "), Some(dec("99.99")));
        assert_eq!(parse_decimal("(100.00)"), Some(dec("-100.00")));
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn loads_bank_transactions_in_order() {
        let file = csv_file(
            "DESCRIPTION,AMOUNT,TRAN TYPE,BALANCE\n\
             ACME CORP PAYMENT,100.00,ACH,1\n\
             \"WIDGETCO, INV 42\",\"1,999.99\",,2\n",
        );
        let records = load_transactions(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "ACME CORP PAYMENT");
        assert_eq!(records[0].transaction_type, "ACH");
        assert_eq!(records[1].amount, dec("1999.99"));
        assert_eq!(records[1].transaction_type, "");
    }

    #[test]
    fn missing_column_is_schema_error() {
        let file = csv_file("DESCRIPTION,AMOUNT\nACME,1.00\n");
        let err = load_transactions(file.path()).unwrap_err();
        match err {
            RecError::InvalidInputSchema { line, reason, .. } => {
                assert_eq!(line, 1);
                assert!(reason.contains("TRAN TYPE"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_amount_reports_line() {
        let file = csv_file("DESCRIPTION,AMOUNT,TRAN TYPE\nA,1.00,ACH\nB,n/a,ACH\n");
        let err = load_transactions(file.path()).unwrap_err();
        assert!(matches!(err, RecError::InvalidInputSchema { line: 3, .. }));
    }

    #[test]
    fn receivables_drop_non_positive_rows() {
        let file = csv_file("Counterparty,Net Billed\nACME,150.00\nREFUND CO,-20.00\nZERO LLC,0\n");
        let receivables = load_receivables(file.path()).unwrap();
        assert_eq!(receivables, vec![Receivable::new("ACME", dec("150.00"))]);
    }

    #[test]
    fn dictionary_groups_and_skips_blanks() {
        let file = csv_file(
            "Counterparty,Bank Statement Name\n\
             ACME,ACME CORP\n\
             ACME,ACME HOLDINGS\n\
             WIDGETCO,\n\
             GLOBEX,Globex Inc\n",
        );
        let dictionary = load_dictionary(file.path()).unwrap();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(
            dictionary.get("ACME"),
            Some(&AliasValue::Multi(vec!["ACME CORP".into(), "ACME HOLDINGS".into()]))
        );
        assert_eq!(dictionary.get("GLOBEX"), Some(&AliasValue::Single("Globex Inc".into())));
        assert!(dictionary.get("WIDGETCO").is_none());
    }
}
