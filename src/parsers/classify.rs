use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::configs::{BankProfile, ClassificationStrategy, ColumnRole};
use crate::parsers::amounts::AmountHit;
use crate::parsers::columns::ColumnModel;
use crate::structs::{Line, Warning};

/// Candidate type codes are short upper-case tokens ("DD", "FPO", "CHG").
static CODE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2,4}$").unwrap());

/// Classification of one row's amounts.
///
/// At most one of `money_in` / `money_out` is set unless the profile
/// explicitly permits dual amounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedRow {
    pub money_in: Option<Decimal>,
    pub money_out: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub type_code: Option<String>,
}

/// Per-line context the strategies need beyond the amounts themselves.
pub struct RowContext<'a> {
    pub line: &'a Line,
    /// Accumulated description plus this line's text, for keyword scans
    pub keyword_text: &'a str,
    /// The previous line was a description with no amounts
    pub prior_line_bare_description: bool,
    /// The in-flight transaction already holds its directional amount and
    /// is waiting only for a balance
    pub needs_balance_only: bool,
}

/// Assign the line's amounts to money-in / money-out / balance using the
/// profile's strategy.
pub fn classify_row(
    profile: &BankProfile,
    columns: &ColumnModel,
    amounts: &[AmountHit],
    ctx: &RowContext<'_>,
    warnings: &mut Vec<Warning>,
) -> ClassifiedRow {
    let row = match profile.classification_strategy {
        ClassificationStrategy::ColumnPosition => by_position(profile, columns, amounts, ctx),
        ClassificationStrategy::TypeCode => by_type_code(profile, columns, amounts, ctx, warnings),
        ClassificationStrategy::Keyword => by_keyword(profile, columns, amounts, ctx),
        ClassificationStrategy::Hybrid => by_hybrid(profile, columns, amounts, ctx),
    };
    enforce_single_direction(row, profile)
}

/// Geometry: each amount goes to the column its right edge falls in,
/// boundaries inclusive on the left column.
fn by_position(
    profile: &BankProfile,
    columns: &ColumnModel,
    amounts: &[AmountHit],
    ctx: &RowContext<'_>,
) -> ClassifiedRow {
    let mut row = ClassifiedRow::default();
    let lone = amounts.len() == 1;

    for (i, hit) in amounts.iter().enumerate() {
        let mut role = columns.classify_x(hit.right_edge);
        if role == ColumnRole::Balance
            && lone
            && !ctx.prior_line_bare_description
            && !ctx.needs_balance_only
        {
            // A lone amount in the balance region without a supporting
            // bare-description line or an amount-complete transaction
            // reads as a directional amount on the money-in side.
            role = ColumnRole::MoneyIn;
        }
        assign(&mut row, role, hit, i == amounts.len() - 1);
    }
    row
}

/// A printed type code decides the direction; geometry still finds the
/// balance and is the fallback for unknown codes.
fn by_type_code(
    profile: &BankProfile,
    columns: &ColumnModel,
    amounts: &[AmountHit],
    ctx: &RowContext<'_>,
    warnings: &mut Vec<Warning>,
) -> ClassifiedRow {
    let mut row = by_position(profile, columns, amounts, ctx);

    let (code, direction) = find_type_code(ctx.line, profile);
    if let Some(code) = code {
        match direction {
            Some(is_in) => {
                // Re-aim the directional amount the geometry picked
                if let Some(value) = row.money_in.take().or_else(|| row.money_out.take()) {
                    if is_in {
                        row.money_in = Some(value);
                    } else {
                        row.money_out = Some(value);
                    }
                }
            }
            None => {
                debug!("unknown type code '{}' on line {}", code, ctx.line.index);
                warnings.push(Warning::UnknownTypeCode {
                    line_index: ctx.line.index,
                    code: code.clone(),
                });
            }
        }
        row.type_code = Some(code);
    }
    row
}

/// Directional keywords in the description decide; default is money out.
fn by_keyword(
    profile: &BankProfile,
    columns: &ColumnModel,
    amounts: &[AmountHit],
    ctx: &RowContext<'_>,
) -> ClassifiedRow {
    let mut row = ClassifiedRow::default();
    if amounts.is_empty() {
        return row;
    }

    // Pick the balance amount first: the rightmost of several, or a lone
    // amount the transaction is already waiting on.
    let (directional, balance) = if amounts.len() >= 2 {
        (Some(&amounts[0]), Some(&amounts[amounts.len() - 1]))
    } else if ctx.needs_balance_only
        || (ctx.prior_line_bare_description
            && columns.expects_balance()
            && columns.classify_x(amounts[0].right_edge) == ColumnRole::Balance)
    {
        (None, Some(&amounts[0]))
    } else {
        (Some(&amounts[0]), None)
    };

    if amounts.len() > 2 {
        debug!(
            "line {}: {} amounts, middle values ignored by keyword strategy",
            ctx.line.index,
            amounts.len()
        );
    }

    if let Some(hit) = balance {
        row.balance = Some(hit.value);
    }
    if let Some(hit) = directional {
        if hit.value.is_sign_negative() {
            row.money_out = Some(-hit.value);
        } else if keyword_direction_is_in(profile, ctx.keyword_text) {
            row.money_in = Some(hit.value);
        } else {
            row.money_out = Some(hit.value);
        }
    }
    row
}

/// Geometry when the row is unambiguous (several distinct right edges),
/// keywords when a single amount stands alone.
fn by_hybrid(
    profile: &BankProfile,
    columns: &ColumnModel,
    amounts: &[AmountHit],
    ctx: &RowContext<'_>,
) -> ClassifiedRow {
    if amounts.len() >= 2 && distinct_right_edges(amounts, profile.x_tolerance) {
        by_position(profile, columns, amounts, ctx)
    } else {
        by_keyword(profile, columns, amounts, ctx)
    }
}

fn distinct_right_edges(amounts: &[AmountHit], x_tolerance: f32) -> bool {
    for pair in amounts.windows(2) {
        if (pair[1].right_edge - pair[0].right_edge).abs() <= x_tolerance {
            return false;
        }
    }
    true
}

/// True when a money-in keyword matches and no money-out keyword does.
fn keyword_direction_is_in(profile: &BankProfile, text: &str) -> bool {
    let lower = text.to_lowercase();
    let hit_out = profile
        .money_out_keywords
        .iter()
        .any(|k| lower.contains(&k.to_lowercase()));
    if hit_out {
        return false;
    }
    profile
        .money_in_keywords
        .iter()
        .any(|k| lower.contains(&k.to_lowercase()))
}

/// Find a printed type code on the line.
///
/// Returns the code text and its direction when it is in the profile's
/// tables; a code-shaped token inside the type-code column with no table
/// entry comes back with no direction so the caller can warn and fall
/// back to geometry.
fn find_type_code(line: &Line, profile: &BankProfile) -> (Option<String>, Option<bool>) {
    for run in &line.runs {
        let token = line.text[run.start..run.end].trim_matches(|c: char| !c.is_alphanumeric());
        if token.is_empty() {
            continue;
        }
        if profile.is_money_in_code(token) {
            return (Some(token.to_string()), Some(true));
        }
        if profile.is_money_out_code(token) {
            return (Some(token.to_string()), Some(false));
        }
        // Unknown-code detection only inside the declared code column,
        // otherwise merchant fragments ("KEN") would trip it.
        if let Some(threshold) = profile.type_code_position_threshold {
            if run.x2 <= threshold && CODE_SHAPE.is_match(token) {
                return (Some(token.to_string()), None);
            }
        }
    }
    (None, None)
}

fn assign(row: &mut ClassifiedRow, role: ColumnRole, hit: &AmountHit, is_last: bool) {
    match role {
        ColumnRole::MoneyOut => {
            if row.money_out.is_none() {
                row.money_out = Some(hit.value.abs());
            } else if row.balance.is_none() && is_last {
                row.balance = Some(hit.value);
            }
        }
        ColumnRole::MoneyIn => {
            if hit.value.is_sign_negative() {
                // A negative amount is an outflow wherever it prints
                if row.money_out.is_none() {
                    row.money_out = Some(-hit.value);
                }
            } else if row.money_in.is_none() {
                row.money_in = Some(hit.value);
            } else if row.balance.is_none() && is_last {
                row.balance = Some(hit.value);
            }
        }
        ColumnRole::Balance => {
            // Rightmost balance-region amount wins
            row.balance = Some(hit.value);
        }
    }
}

/// Drop a second directional amount unless the profile permits dual
/// amounts. Money out wins ties: the out column is the more specific
/// assignment and negative signs force it.
fn enforce_single_direction(mut row: ClassifiedRow, profile: &BankProfile) -> ClassifiedRow {
    if !profile.allow_dual_amounts && row.money_in.is_some() && row.money_out.is_some() {
        debug!("dual directional amounts on one row; keeping money_out");
        row.money_in = None;
    }
    row
}
