use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::structs::transaction::Transaction;

/// A recoverable condition noted while parsing or reconciling.
///
/// Warnings never stop a parse; they are the audit trail a driver needs to
/// decide between strict and permissive acceptance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A token carried unusable coordinates and was dropped.
    TokenDropped { page: usize, text: String },
    /// A page required a column header and none was found in time.
    HeaderMissing { page: usize },
    /// A line looked date-led but no configured format matched.
    UnparseableDate { line_index: usize, text: String },
    /// A date was inferred across a year boundary or outside the period.
    CrossYearDate { line_index: usize, date: NaiveDate },
    /// A printed type code was not in the profile's code tables.
    UnknownTypeCode { line_index: usize, code: String },
    /// A transaction's printed balance disagrees with its amounts.
    ReconcileMismatch {
        transaction_index: usize,
        expected_delta: Decimal,
        computed_delta: Decimal,
    },
    /// Money-in and money-out were exchanged to restore balance agreement.
    DirectionSwapped { transaction_index: usize },
    /// A period's printed balances were internally inconsistent and were
    /// recomputed from the running balance.
    CascadeRecalculated { period_index: usize },
    /// A period could not be reconciled even after swap and cascade.
    PeriodUnreconciled { period_index: usize },
    /// A started transaction fragment was discarded at a state reset.
    IncompleteDiscarded { line_index: usize, description: String },
    /// A printed period total disagrees with the summed transactions.
    PeriodTotalMismatch {
        period_index: usize,
        printed: Decimal,
        computed: Decimal,
    },
    /// The printed closing balance disagrees with the reconciled ledger;
    /// the ledger value wins.
    ClosingBalanceOverridden { printed: Decimal, derived: Decimal },
}

/// One statement period: the window between a brought-forward marker and
/// the next carried-forward marker (or end of stream).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    /// Printed brought-forward balance opening the period
    pub opening_balance: Option<Decimal>,
    /// Closing balance: printed carried-forward when present, otherwise
    /// the last reconciled transaction balance
    pub closing_balance: Option<Decimal>,
    /// Printed "total money in" summary for the period, when captured
    pub printed_total_in: Option<Decimal>,
    /// Printed "total money out" summary for the period, when captured
    pub printed_total_out: Option<Decimal>,
    /// Index of the period's first transaction in the statement ledger
    pub first_transaction: usize,
    /// Number of transactions in the period, synthetic markers included
    pub transaction_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reconciled: bool,
    pub cascade_recalculated: bool,
}

impl Period {
    /// New period opening at `first_transaction` in the ledger.
    pub fn starting_at(first_transaction: usize) -> Self {
        Period {
            opening_balance: None,
            closing_balance: None,
            printed_total_in: None,
            printed_total_out: None,
            first_transaction,
            transaction_count: 0,
            start_date: None,
            end_date: None,
            reconciled: true,
            cascade_recalculated: false,
        }
    }

    /// Range of ledger indices covered by this period.
    pub fn transaction_range(&self) -> std::ops::Range<usize> {
        self.first_transaction..self.first_transaction + self.transaction_count
    }
}

/// The engine's output for one statement parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementResult {
    pub transactions: Vec<Transaction>,
    pub periods: Vec<Period>,
    /// First period's brought-forward balance
    pub opening_balance: Option<Decimal>,
    /// Last emitted transaction's balance, post-reconciliation
    pub closing_balance: Option<Decimal>,
    pub warnings: Vec<Warning>,
    /// Statement-level confidence aggregate, 0..=100
    pub confidence_overall: u8,
    /// True when the parse stopped early (cancellation, stream failure)
    pub partial: bool,
    /// False only when strict mode was requested and a period failed to
    /// reconcile
    pub success: bool,
}

impl StatementResult {
    pub fn empty() -> Self {
        StatementResult {
            transactions: Vec::new(),
            periods: Vec::new(),
            opening_balance: None,
            closing_balance: None,
            warnings: Vec::new(),
            confidence_overall: 0,
            partial: false,
            success: true,
        }
    }

    /// Ledger transactions only, synthetic markers excluded.
    pub fn ledger_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| !t.is_synthetic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_period_transaction_range() {
        let mut period = Period::starting_at(3);
        period.transaction_count = 4;
        assert_eq!(period.transaction_range(), 3..7);
    }

    #[test]
    fn test_empty_result_is_successful() {
        let result = StatementResult::empty();
        assert!(result.success);
        assert!(!result.partial);
        assert!(result.transactions.is_empty());
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = Warning::ReconcileMismatch {
            transaction_index: 2,
            expected_delta: dec!(-45.67),
            computed_delta: dec!(45.67),
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"kind\":\"reconcile_mismatch\""));
        assert!(json.contains("\"transaction_index\":2"));
    }
}
