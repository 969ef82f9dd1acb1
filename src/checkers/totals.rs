use rust_decimal::Decimal;

use crate::structs::{StatementResult, Warning};

/// Printed period totals are honored to within 50p; they are summaries
/// and some banks round them independently.
fn totals_tolerance() -> Decimal {
    Decimal::new(50, 2)
}

/// Closing balances must agree to the penny.
fn closing_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Soft period-level assertions, run after reconciliation.
///
/// Printed "total money in/out" rows and carried-forward balances are
/// compared against the reconciled ledger. The ledger always wins; any
/// disagreement is recorded as a warning, never an error.
pub fn check_period_totals(result: &mut StatementResult) {
    for index in 0..result.periods.len() {
        let range = result.periods[index].transaction_range();
        let mut sum_in = Decimal::ZERO;
        let mut sum_out = Decimal::ZERO;
        let mut last_balance: Option<Decimal> = None;

        for tx in &result.transactions[range] {
            if tx.is_synthetic() {
                continue;
            }
            sum_in += tx.money_in;
            sum_out += tx.money_out;
            if let Some(balance) = tx.balance {
                last_balance = Some(balance);
            }
        }

        if let Some(printed) = result.periods[index].printed_total_in {
            if (printed - sum_in).abs() > totals_tolerance() {
                result.warnings.push(Warning::PeriodTotalMismatch {
                    period_index: index,
                    printed,
                    computed: sum_in,
                });
            }
        }
        if let Some(printed) = result.periods[index].printed_total_out {
            if (printed - sum_out).abs() > totals_tolerance() {
                result.warnings.push(Warning::PeriodTotalMismatch {
                    period_index: index,
                    printed,
                    computed: sum_out,
                });
            }
        }

        match (result.periods[index].closing_balance, last_balance) {
            (Some(printed), Some(derived)) => {
                if (printed - derived).abs() > closing_tolerance() {
                    result.warnings.push(Warning::ClosingBalanceOverridden {
                        printed,
                        derived,
                    });
                    result.periods[index].closing_balance = Some(derived);
                }
            }
            (None, Some(derived)) => {
                result.periods[index].closing_balance = Some(derived);
            }
            _ => {}
        }
    }
}
