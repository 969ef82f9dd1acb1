use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::structs::transaction::{Transaction, TransactionType};

/// An in-flight transaction being assembled by the state machine.
///
/// Serves as the temporary holder for fields gathered across several lines
/// (split dates, continuation descriptions, amounts on their own rows)
/// before the row is validated and emitted.
#[derive(Debug, Clone, Default)]
pub struct PartialTransaction {
    pub date: Option<NaiveDate>,
    /// Set while a split-year date is waiting for its final digit; the
    /// date is not considered formed until this clears.
    pub date_pending_year: bool,
    pub description_lines: Vec<String>,
    pub money_in: Option<Decimal>,
    pub money_out: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub type_code: Option<String>,
    pub source_page: usize,
    pub source_line_index: usize,
}

impl PartialTransaction {
    /// Begin a transaction anchored at the line that produced its date.
    pub fn started_at(page: usize, line_index: usize) -> Self {
        PartialTransaction {
            source_page: page,
            source_line_index: line_index,
            ..Default::default()
        }
    }

    /// True once any field has been captured.
    pub fn is_started(&self) -> bool {
        self.date.is_some()
            || self.date_pending_year
            || !self.description_lines.is_empty()
            || self.has_directional()
            || self.balance.is_some()
    }

    /// True when the date exists and is not waiting on a year digit.
    pub fn date_formed(&self) -> bool {
        self.date.is_some() && !self.date_pending_year
    }

    /// True when a money-in or money-out amount has been captured.
    pub fn has_directional(&self) -> bool {
        self.money_in.is_some() || self.money_out.is_some()
    }

    /// Append a description fragment, ignoring blanks.
    pub fn push_description(&mut self, fragment: &str) {
        let trimmed = fragment.trim();
        if !trimmed.is_empty() {
            self.description_lines.push(trimmed.to_string());
        }
    }

    /// Completion predicate: emit as soon as this returns true.
    ///
    /// A transaction is complete when its date is fully formed and either
    /// (a) it holds a balance plus one directional amount, (b) it holds a
    /// balance alone and the profile says brought-forward and fee rows may
    /// omit the directional amount, or (c) it holds a directional amount
    /// and the layout has no balance column to wait for.
    pub fn is_complete(&self, balance_column_expected: bool, allow_missing_balance: bool) -> bool {
        if !self.date_formed() {
            return false;
        }
        if self.balance.is_some() {
            return self.has_directional() || allow_missing_balance;
        }
        self.has_directional() && !balance_column_expected
    }

    /// True when a boundary flush (new date, period break, end of stream)
    /// should emit this row rather than discard it.
    pub fn is_emittable(&self, allow_missing_balance: bool) -> bool {
        self.date_formed()
            && (self.has_directional() || (self.balance.is_some() && allow_missing_balance))
    }

    /// Convert into an emitted transaction. Confidence is scored later,
    /// once reconciliation has settled the balances.
    pub fn into_transaction(self, transaction_type: TransactionType) -> Transaction {
        Transaction {
            date: self.date,
            description: self.description_lines.join(" ").trim().to_string(),
            money_in: self.money_in.unwrap_or(Decimal::ZERO),
            money_out: self.money_out.unwrap_or(Decimal::ZERO),
            balance: self.balance,
            type_code: self.type_code,
            transaction_type,
            confidence: 0,
            source_page: self.source_page,
            source_line_index: self.source_line_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_not_complete_without_formed_date() {
        let mut tx = PartialTransaction::default();
        tx.money_out = Some(dec!(30.00));
        tx.balance = Some(dec!(10.39));
        assert!(!tx.is_complete(true, false));

        tx.date = NaiveDate::from_ymd_opt(2024, 8, 8);
        tx.date_pending_year = true;
        assert!(!tx.is_complete(true, false));

        tx.date_pending_year = false;
        assert!(tx.is_complete(true, false));
    }

    #[test]
    fn test_complete_on_directional_when_no_balance_column() {
        let mut tx = PartialTransaction::default();
        tx.date = NaiveDate::from_ymd_opt(2024, 8, 8);
        tx.money_in = Some(dec!(50.00));
        assert!(!tx.is_complete(true, false));
        assert!(tx.is_complete(false, false));
    }

    #[test]
    fn test_balance_only_row_needs_profile_flag() {
        let mut tx = PartialTransaction::default();
        tx.date = NaiveDate::from_ymd_opt(2024, 8, 8);
        tx.balance = Some(dec!(120.00));
        assert!(!tx.is_complete(true, false));
        assert!(tx.is_complete(true, true));
    }

    #[test]
    fn test_emittable_allows_missing_balance_at_flush() {
        let mut tx = PartialTransaction::default();
        tx.date = NaiveDate::from_ymd_opt(2024, 8, 8);
        tx.money_out = Some(dec!(5.00));
        assert!(tx.is_emittable(false));

        let mut balance_only = PartialTransaction::default();
        balance_only.date = NaiveDate::from_ymd_opt(2024, 8, 8);
        balance_only.balance = Some(dec!(99.00));
        assert!(!balance_only.is_emittable(false));
        assert!(balance_only.is_emittable(true));
    }

    #[test]
    fn test_into_transaction_joins_description() {
        let mut tx = PartialTransaction::started_at(1, 7);
        tx.date = NaiveDate::from_ymd_opt(2024, 8, 8);
        tx.push_description("Kashia*Nyasa KEN");
        tx.push_description("Amount: USD -38.04. Conversion");
        tx.push_description("rate: 1.268.");
        tx.money_out = Some(dec!(30.00));
        tx.balance = Some(dec!(10.39));

        let emitted = tx.into_transaction(TransactionType::CardPayment);
        assert_eq!(
            emitted.description,
            "Kashia*Nyasa KEN Amount: USD -38.04. Conversion rate: 1.268."
        );
        assert_eq!(emitted.money_in, Decimal::ZERO);
        assert_eq!(emitted.source_page, 1);
        assert_eq!(emitted.source_line_index, 7);
    }
}
