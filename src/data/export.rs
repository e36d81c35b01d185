use crate::error::RecResult;
use crate::models::MatchResult;
use bigdecimal::BigDecimal;
use std::io::Write;
use std::path::Path;

pub const RESULT_COLUMNS: [&str; 8] = [
    "Counterparty",
    "Net Billed",
    "Statement Amount",
    "Description",
    "Match Kind",
    "Perfect Match",
    "Transaction Ids",
    "Diagnostic",
];

/// 将 Option<BigDecimal> 转换为 CSV 字符串
fn option_to_csv(val: &Option<BigDecimal>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// 导出对账结果 (AR Rec) 到 CSV 文件
pub fn export_to_csv(results: &[MatchResult], output_path: &Path) -> RecResult<()> {
    let file = std::fs::File::create(output_path)?;
    write_results(results, file)?;
    tracing::info!("Reconciliation results saved to {} ({} rows)", output_path.display(), results.len());
    Ok(())
}

/// 写出带表头的结果 CSV
pub fn write_results<W: Write>(results: &[MatchResult], sink: W) -> RecResult<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(RESULT_COLUMNS)?;

    for result in results {
        let ids: Vec<String> = result
            .matched_transactions
            .iter()
            .map(|t| t.id.0.to_string())
            .collect();

        writer.write_record([
            result.counterparty.clone(),
            result.net_billed.to_string(),
            option_to_csv(&result.matched_amount),
            result.description.clone(),
            result.match_kind.to_string(),
            result.is_perfect_match().to_string(),
            ids.join(";"),
            result.diagnostic.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchKind, Receivable, Transaction, TransactionId};
    use std::str::FromStr;

    #[test]
    fn writes_header_and_one_row_per_result() {
        let receivable = Receivable::new("ACME", BigDecimal::from_str("150.00").unwrap());
        let transactions = vec![
            Transaction {
                id: TransactionId(0),
                description: "ACME CORP PAYMENT".into(),
                amount: BigDecimal::from_str("100.00").unwrap(),
                transaction_type: "ACH".into(),
            },
            Transaction {
                id: TransactionId(3),
                description: "ACME CORP PAYMENT".into(),
                amount: BigDecimal::from_str("50.00").unwrap(),
                transaction_type: "ACH".into(),
            },
        ];
        let results = vec![
            MatchResult::multiple(&receivable, transactions),
            MatchResult::unmatched(&Receivable::new("GHOST LLC", BigDecimal::from(500)), None),
        ];
        assert_eq!(results[0].match_kind, MatchKind::MultiTransaction);

        let mut buf = Vec::new();
        write_results(&results, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Counterparty,Net Billed,Statement Amount,Description,Match Kind,Perfect Match,Transaction Ids,Diagnostic"
        );
        assert_eq!(
            lines[1],
            "ACME,150.00,150.00,\"Multiple Transactions: (100.00, 50.00)\",MultiTransaction,false,0;3,"
        );
        assert_eq!(lines[2], "GHOST LLC,500,,No Match,Unmatched,false,,");
    }
}
