use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::structs::{StatementResult, Warning};

/// Reconciliation tolerance: one penny.
fn epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Combine a running balance with a movement. Banker's rounding applies
/// only here, never to values read off the page.
fn combine(balance: Decimal, delta: Decimal) -> Decimal {
    (balance + delta).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Run the per-period reconciliation pass over an assembled result.
///
/// Each period is independent: the pass walks its transactions in
/// emission order, checks every printed balance against the running
/// balance, applies direction swaps where they strictly improve
/// agreement, and engages at most one cascade recalculation when the
/// period's printed balances are internally inconsistent. Rewrites happen
/// before the result is returned to the caller, never after.
pub fn reconcile_statement(result: &mut StatementResult) {
    for index in 0..result.periods.len() {
        reconcile_period(result, index);
    }
}

fn reconcile_period(result: &mut StatementResult, period_index: usize) {
    let range = result.periods[period_index].transaction_range();
    let mut prev = result.periods[period_index].opening_balance;
    let mut cascade = result.periods[period_index].cascade_recalculated;
    let mut clean = true;
    let mut seen_ledger = false;
    let mut warnings = Vec::new();

    for i in range {
        if result.transactions[i].is_synthetic() {
            // Markers re-anchor the running balance
            if let Some(balance) = result.transactions[i].balance {
                prev = Some(balance);
            }
            continue;
        }

        let printed = result.transactions[i].balance;
        let mut delta = result.transactions[i].delta();

        let Some(p) = prev else {
            // No anchor yet: the first balanced row starts the chain
            if let Some(balance) = printed {
                prev = Some(balance);
            }
            seen_ledger = true;
            continue;
        };

        match printed {
            None => {
                let running = combine(p, delta);
                if cascade {
                    result.transactions[i].balance = Some(running);
                }
                prev = Some(running);
                seen_ledger = true;
            }
            Some(_) if cascade => {
                // Printed balances are untrusted for the rest of the
                // period; recompute from the running balance.
                let running = combine(p, delta);
                result.transactions[i].balance = Some(running);
                prev = Some(running);
                seen_ledger = true;
            }
            Some(b) => {
                let expected = b - p;
                if (expected - delta).abs() <= epsilon() {
                    prev = Some(b);
                    seen_ledger = true;
                    continue;
                }

                // Direction swap, accepted only when the error strictly
                // improves
                let err = (expected - delta).abs();
                let err_swapped = (expected + delta).abs();
                if err_swapped < err {
                    let tx = &mut result.transactions[i];
                    std::mem::swap(&mut tx.money_in, &mut tx.money_out);
                    delta = -delta;
                    debug!("direction swap on transaction {}", i);
                    warnings.push(Warning::DirectionSwapped {
                        transaction_index: i,
                    });
                    if (expected - delta).abs() <= epsilon() {
                        prev = Some(b);
                        seen_ledger = true;
                        continue;
                    }
                }

                // A first row repeating the brought-forward balance while
                // carrying a movement: the balance column lags one row, so
                // rewrite and recompute the rest of the period.
                if !seen_ledger && (b - p).abs() <= epsilon() && delta != Decimal::ZERO {
                    let running = combine(p, delta);
                    result.transactions[i].balance = Some(running);
                    cascade = true;
                    result.periods[period_index].cascade_recalculated = true;
                    debug!("cascade recalculation engaged in period {}", period_index);
                    warnings.push(Warning::CascadeRecalculated { period_index });
                    prev = Some(running);
                    seen_ledger = true;
                    continue;
                }

                warnings.push(Warning::ReconcileMismatch {
                    transaction_index: i,
                    expected_delta: expected,
                    computed_delta: delta,
                });
                clean = false;
                prev = Some(b);
                seen_ledger = true;
            }
        }
    }

    if !clean && result.periods[period_index].reconciled {
        result.periods[period_index].reconciled = false;
        warnings.push(Warning::PeriodUnreconciled { period_index });
    }
    result.warnings.extend(warnings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{Period, Transaction, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn marker(balance: Decimal, t: TransactionType) -> Transaction {
        Transaction {
            date: None,
            description: "Balance brought forward".to_string(),
            money_in: Decimal::ZERO,
            money_out: Decimal::ZERO,
            balance: Some(balance),
            type_code: None,
            transaction_type: t,
            confidence: 0,
            source_page: 0,
            source_line_index: 0,
        }
    }

    fn row(money_in: Decimal, money_out: Decimal, balance: Option<Decimal>) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 8, 8),
            description: "Row".to_string(),
            money_in,
            money_out,
            balance,
            type_code: None,
            transaction_type: TransactionType::Other,
            confidence: 0,
            source_page: 0,
            source_line_index: 1,
        }
    }

    fn result_with(transactions: Vec<Transaction>, opening: Option<Decimal>) -> StatementResult {
        let mut result = StatementResult::empty();
        let mut period = Period::starting_at(0);
        period.transaction_count = transactions.len();
        period.opening_balance = opening;
        result.periods.push(period);
        result.opening_balance = opening;
        result.transactions = transactions;
        result
    }

    #[test]
    fn test_consistent_period_passes_untouched() {
        let mut result = result_with(
            vec![
                marker(dec!(1000.00), TransactionType::BroughtForward),
                row(Decimal::ZERO, dec!(50.00), Some(dec!(950.00))),
                row(dec!(100.00), Decimal::ZERO, Some(dec!(1050.00))),
            ],
            Some(dec!(1000.00)),
        );
        reconcile_statement(&mut result);
        assert!(result.warnings.is_empty());
        assert!(result.periods[0].reconciled);
        assert!(!result.periods[0].cascade_recalculated);
    }

    #[test]
    fn test_direction_swap_applied() {
        // Printed as money in, but the balance fell: swap restores
        // agreement.
        let mut result = result_with(
            vec![
                marker(dec!(1000.00), TransactionType::BroughtForward),
                row(dec!(45.67), Decimal::ZERO, Some(dec!(954.33))),
            ],
            Some(dec!(1000.00)),
        );
        reconcile_statement(&mut result);

        let tx = &result.transactions[1];
        assert_eq!(tx.money_out, dec!(45.67));
        assert_eq!(tx.money_in, Decimal::ZERO);
        assert_eq!(
            result.warnings,
            vec![Warning::DirectionSwapped {
                transaction_index: 1
            }]
        );
        assert!(result.periods[0].reconciled);
    }

    #[test]
    fn test_cascade_recalculation() {
        // First row after the marker repeats the brought-forward balance;
        // the whole period recomputes from the running balance.
        let mut result = result_with(
            vec![
                marker(dec!(1000.00), TransactionType::BroughtForward),
                row(Decimal::ZERO, dec!(100.00), Some(dec!(1000.00))),
                row(Decimal::ZERO, dec!(50.00), Some(dec!(900.00))),
                row(dec!(25.00), Decimal::ZERO, None),
            ],
            Some(dec!(1000.00)),
        );
        reconcile_statement(&mut result);

        assert_eq!(result.transactions[1].balance, Some(dec!(900.00)));
        assert_eq!(result.transactions[2].balance, Some(dec!(850.00)));
        assert_eq!(result.transactions[3].balance, Some(dec!(875.00)));
        assert!(result.periods[0].cascade_recalculated);
        assert!(result.periods[0].reconciled);
        assert!(result
            .warnings
            .contains(&Warning::CascadeRecalculated { period_index: 0 }));
    }

    #[test]
    fn test_unresolvable_mismatch_warns_and_continues() {
        let mut result = result_with(
            vec![
                marker(dec!(1000.00), TransactionType::BroughtForward),
                row(Decimal::ZERO, dec!(10.00), Some(dec!(700.00))),
                row(Decimal::ZERO, dec!(5.00), Some(dec!(695.00))),
            ],
            Some(dec!(1000.00)),
        );
        reconcile_statement(&mut result);

        // The mismatch is recorded and parsing continues with the printed
        // balance, so the following row reconciles.
        assert!(result.warnings.iter().any(|w| matches!(
            w,
            Warning::ReconcileMismatch {
                transaction_index: 1,
                ..
            }
        )));
        assert!(result
            .warnings
            .contains(&Warning::PeriodUnreconciled { period_index: 0 }));
        assert!(!result.periods[0].reconciled);
        assert_eq!(result.transactions[1].balance, Some(dec!(700.00)));
    }

    #[test]
    fn test_periods_reconcile_independently() {
        let mut result = StatementResult::empty();
        result.transactions = vec![
            marker(dec!(100.00), TransactionType::BroughtForward),
            row(Decimal::ZERO, dec!(999.00), Some(dec!(0.42))), // broken
            marker(dec!(0.42), TransactionType::PeriodBreak),
            row(dec!(10.00), Decimal::ZERO, Some(dec!(10.42))), // fine
        ];
        let mut first = Period::starting_at(0);
        first.transaction_count = 2;
        first.opening_balance = Some(dec!(100.00));
        let mut second = Period::starting_at(2);
        second.transaction_count = 2;
        second.opening_balance = Some(dec!(0.42));
        result.periods = vec![first, second];

        reconcile_statement(&mut result);
        assert!(!result.periods[0].reconciled);
        assert!(result.periods[1].reconciled);
    }

    #[test]
    fn test_reconcile_is_a_fixed_point() {
        let mut result = result_with(
            vec![
                marker(dec!(1000.00), TransactionType::BroughtForward),
                row(dec!(45.67), Decimal::ZERO, Some(dec!(954.33))), // swaps
                row(Decimal::ZERO, dec!(54.33), Some(dec!(900.00))),
            ],
            Some(dec!(1000.00)),
        );
        reconcile_statement(&mut result);
        let after_first = result.clone();

        reconcile_statement(&mut result);
        // No further swaps, no new warnings, no balance changes
        assert_eq!(result.transactions, after_first.transactions);
        assert_eq!(result.warnings, after_first.warnings);
        assert_eq!(result.periods, after_first.periods);
    }

    #[test]
    fn test_missing_anchor_uses_first_balanced_row() {
        let mut result = result_with(
            vec![
                row(Decimal::ZERO, dec!(5.00), Some(dec!(95.00))),
                row(Decimal::ZERO, dec!(10.00), Some(dec!(85.00))),
            ],
            None,
        );
        result.periods[0].transaction_count = 2;
        reconcile_statement(&mut result);
        assert!(result.warnings.is_empty());
        assert!(result.periods[0].reconciled);
    }
}
