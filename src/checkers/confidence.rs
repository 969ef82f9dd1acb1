use crate::structs::{StatementResult, Transaction};

/// Score one transaction on the 0..=100 scale.
///
/// Deductions: missing date -30, missing description -20, no directional
/// amount -25, missing balance -10. Bonuses: a fully populated row +5, a
/// description of plausible length +5. Synthetic markers are exempt from
/// the amount deduction since they never carry movements.
pub fn score_transaction(tx: &Transaction) -> u8 {
    let mut score: i32 = 100;

    let has_directional = !tx.money_in.is_zero() || !tx.money_out.is_zero();

    if tx.date.is_none() {
        score -= 30;
    }
    if tx.description.trim().is_empty() {
        score -= 20;
    }
    if !tx.is_synthetic() && !has_directional {
        score -= 25;
    }
    if tx.balance.is_none() {
        score -= 10;
    }

    let full_row = tx.date.is_some()
        && !tx.description.trim().is_empty()
        && has_directional
        && tx.balance.is_some();
    if full_row {
        score += 5;
    }
    if (10..=200).contains(&tx.description.len()) {
        score += 5;
    }

    score.clamp(0, 100) as u8
}

/// Score every transaction and derive the statement-level aggregate.
///
/// The aggregate is the mean over ledger transactions (synthetic markers
/// excluded); each period that failed to reconcile lowers it by 15.
pub fn score_statement(result: &mut StatementResult) {
    for tx in &mut result.transactions {
        tx.confidence = score_transaction(tx);
    }

    let ledger: Vec<i32> = result
        .ledger_transactions()
        .map(|t| t.confidence as i32)
        .collect();

    let mut overall: i32 = if ledger.is_empty() {
        // Marker-only statements carry no usable ledger
        if result.transactions.is_empty() { 0 } else { 50 }
    } else {
        (ledger.iter().sum::<i32>() + (ledger.len() as i32 / 2)) / ledger.len() as i32
    };

    let unreconciled = result.periods.iter().filter(|p| !p.reconciled).count() as i32;
    overall -= unreconciled * 15;

    result.confidence_overall = overall.clamp(0, 100) as u8;
}
