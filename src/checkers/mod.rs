use crate::structs::StatementResult;

pub mod confidence;
pub mod totals;

pub use confidence::score_statement;
pub use totals::check_period_totals;

/// Apply all post-reconciliation checks to an assembled result.
pub fn check_statement(result: &mut StatementResult) {
    check_period_totals(result);
    score_statement(result);
}
