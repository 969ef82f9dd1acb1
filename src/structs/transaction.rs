use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of an emitted ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    CardPayment,
    DirectDebit,
    StandingOrder,
    Transfer,
    Fee,
    Interest,
    Atm,
    Credit,
    BroughtForward,
    CarriedForward,
    PeriodBreak,
    Other,
}

impl TransactionType {
    /// Synthetic rows mark statement structure (period boundaries, opening
    /// and closing balances) and are never ledger movements themselves.
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            TransactionType::BroughtForward
                | TransactionType::CarriedForward
                | TransactionType::PeriodBreak
        )
    }
}

/// A validated statement transaction.
///
/// Exactly one of `money_in` / `money_out` is non-zero for normal rows;
/// synthetic brought-forward and period-break markers carry zero for both.
/// `balance` is present only where the PDF printed one (or where a cascade
/// recalculation rewrote it). Amounts hold two fractional digits and are
/// never rounded off page values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Transaction date; absent only on synthetic markers whose source
    /// line printed no date
    pub date: Option<NaiveDate>,
    pub description: String,
    pub money_in: Decimal,
    pub money_out: Decimal,
    pub balance: Option<Decimal>,
    /// Bank-printed type code (e.g. `DD`, `FPI`), when the layout has one
    pub type_code: Option<String>,
    pub transaction_type: TransactionType,
    /// Per-transaction confidence, 0..=100
    pub confidence: u8,
    pub source_page: usize,
    pub source_line_index: usize,
}

impl Transaction {
    /// Net movement of this row: `money_in - money_out`.
    pub fn delta(&self) -> Decimal {
        self.money_in - self.money_out
    }

    /// True for structural marker rows (brought/carried forward, period
    /// breaks).
    pub fn is_synthetic(&self) -> bool {
        self.transaction_type.is_synthetic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 8, 8),
            description: "Merchant X".to_string(),
            money_in: Decimal::ZERO,
            money_out: dec!(30.00),
            balance: Some(dec!(10.39)),
            type_code: None,
            transaction_type: TransactionType::CardPayment,
            confidence: 100,
            source_page: 0,
            source_line_index: 4,
        }
    }

    #[test]
    fn test_delta_is_signed() {
        let tx = sample();
        assert_eq!(tx.delta(), dec!(-30.00));
    }

    #[test]
    fn test_synthetic_types() {
        assert!(TransactionType::PeriodBreak.is_synthetic());
        assert!(TransactionType::BroughtForward.is_synthetic());
        assert!(TransactionType::CarriedForward.is_synthetic());
        assert!(!TransactionType::CardPayment.is_synthetic());
        assert!(!TransactionType::Other.is_synthetic());
    }
}
