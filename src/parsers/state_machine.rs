use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::configs::BankProfile;
use crate::parsers::amounts::{AmountExtractor, AmountHit};
use crate::parsers::classify::{classify_row, RowContext};
use crate::parsers::columns::ColumnModel;
use crate::parsers::dates::{DateEngine, DateMatch};
use crate::parsers::skip::{self, SummaryKind};
use crate::structs::{Line, PartialTransaction, Period, Transaction, TransactionType, Warning};

/// Distinguishes carried-forward markers from brought-forward ones within
/// the profile's period boundary pattern.
static CARRIED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcarried\b|\bc/f\b").unwrap());

/// What the state machine did with one line. The driver loop acts only on
/// `Requeued`; the rest is signal for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// The line completed a transaction which was emitted immediately
    Emitted,
    /// The line's content was absorbed into in-flight state
    Buffered,
    /// Noise, headers, and other non-transactional lines
    Skipped,
    /// A brought/carried-forward marker was handled
    PeriodBreak,
    /// A leading fragment was consumed; the remainder must be offered
    /// again as its own line
    Requeued(Line),
}

/// Drives the per-line event loop that turns reconstructed lines into
/// transactions.
///
/// Event priority per line: period boundary, printed-metadata capture,
/// noise filtering, column header, new date, year-digit completion, FX
/// meta, amounts, continuation. Completed transactions are emitted
/// immediately rather than waiting for the next date line.
pub struct StatementStateMachine<'p> {
    profile: &'p BankProfile,
    dates: DateEngine,
    amounts: AmountExtractor,
    columns: ColumnModel,

    current: PartialTransaction,
    /// Narrative line(s) seen after an emitted transaction and before the
    /// next date; they belong to the next transaction.
    carry_over_desc: Option<String>,
    fx_block_active: bool,
    prior_line_bare_description: bool,

    current_page: usize,
    lines_seen_on_page: usize,
    header_seen_on_page: bool,
    header_warned_on_page: bool,

    /// True between a carried-forward marker and the start of the next
    /// period.
    period_closed: bool,
    boundary_seen: bool,

    pub transactions: Vec<Transaction>,
    pub periods: Vec<Period>,
    pub warnings: Vec<Warning>,
    pub opening_balance: Option<Decimal>,
}

impl<'p> StatementStateMachine<'p> {
    pub fn new(profile: &'p BankProfile) -> Self {
        StatementStateMachine {
            profile,
            dates: DateEngine::new(&profile.date_formats),
            amounts: AmountExtractor::new(profile),
            columns: ColumnModel::from_thresholds(&profile.default_column_thresholds),
            current: PartialTransaction::default(),
            carry_over_desc: None,
            fx_block_active: false,
            prior_line_bare_description: false,
            current_page: 0,
            lines_seen_on_page: 0,
            header_seen_on_page: false,
            header_warned_on_page: false,
            period_closed: false,
            boundary_seen: false,
            transactions: Vec::new(),
            periods: vec![Period::starting_at(0)],
            warnings: Vec::new(),
            opening_balance: None,
        }
    }

    /// Process one line. The caller owns the queue and must push a
    /// `Requeued` remainder back to the front.
    pub fn step(&mut self, line: &Line) -> LineOutcome {
        self.track_page(line);
        let text = line.text.trim();

        // Period boundaries and printed metadata are read before the skip
        // filter so summary rows still contribute even when skipped.
        if self.profile.period_boundary_pattern.is_match(text) {
            return self.handle_period_boundary(line);
        }
        self.dates.try_capture_period(&line.text);
        if let Some(kind) = skip::summary_kind(text) {
            self.capture_summary(line, kind);
        }

        if skip::is_noise(line, self.profile) {
            return LineOutcome::Skipped;
        }

        if self.columns.try_update_from_header(line, &self.profile.columns) {
            self.header_seen_on_page = true;
            self.prior_line_bare_description = false;
            return LineOutcome::Skipped;
        }

        // A full date always wins, even over a pending year digit
        match self.dates.match_date(&line.text) {
            DateMatch::Full {
                date,
                end,
                cross_year,
            } => return self.handle_new_date(line, date, end, cross_year),
            DateMatch::Partial { .. } => return self.handle_partial_date(line),
            DateMatch::None => {
                if crate::parsers::dates::looks_date_led(&line.text) {
                    // Date-shaped but unparseable: warn and treat the line
                    // as a non-date
                    self.warnings.push(Warning::UnparseableDate {
                        line_index: line.index,
                        text: compact_whitespace(&line.text),
                    });
                }
            }
        }

        if self.current.date_pending_year {
            if let Some((date, consumed)) = self.dates.complete_year(&line.text) {
                return self.handle_year_completion(line, date, consumed);
            }
        }

        if self.amounts.is_fx_meta(&line.text) {
            return self.handle_fx_meta(line);
        }

        let hits = self.amounts.extract(line);
        if !hits.is_empty() {
            return self.handle_amounts(line, &hits);
        }

        self.handle_continuation(line)
    }

    /// Flush remaining state at end of stream.
    pub fn finish(&mut self) {
        self.flush_current();
        self.dates.abandon_partial();
        if let Some(dropped) = self.carry_over_desc.take() {
            debug!("dropping unattached carry-over description '{}'", dropped);
        }
    }

    fn track_page(&mut self, line: &Line) {
        if line.page != self.current_page {
            self.current_page = line.page;
            self.lines_seen_on_page = 0;
            self.header_seen_on_page = false;
            self.header_warned_on_page = false;
        }
        self.lines_seen_on_page += 1;

        if self.profile.require_header_per_page
            && !self.header_seen_on_page
            && !self.header_warned_on_page
            && self.lines_seen_on_page >= self.profile.header_scan_lines
        {
            debug!("no column header within {} lines of page {}", self.profile.header_scan_lines, line.page);
            self.warnings.push(Warning::HeaderMissing { page: line.page });
            self.header_warned_on_page = true;
        }
    }

    fn capture_summary(&mut self, line: &Line, kind: SummaryKind) {
        let printed = self.amounts.extract(line).last().map(|h| h.value);
        let Some(value) = printed else { return };
        if let Some(period) = self.periods.last_mut() {
            match kind {
                SummaryKind::TotalIn => {
                    if period.printed_total_in.is_none() {
                        period.printed_total_in = Some(value);
                    }
                }
                SummaryKind::TotalOut => {
                    if period.printed_total_out.is_none() {
                        period.printed_total_out = Some(value);
                    }
                }
            }
        }
    }

    fn handle_period_boundary(&mut self, line: &Line) -> LineOutcome {
        // The marker line may carry its own date
        let marker_date = match self.dates.match_date(&line.text) {
            DateMatch::Full { date, .. } => Some(date),
            _ => self.dates.current_date(),
        };
        self.flush_current();
        self.carry_over_desc = None;
        self.prior_line_bare_description = false;

        let printed = self.amounts.extract(line).last().map(|h| h.value);
        let description = compact_whitespace(&line.text);

        if CARRIED_MARKER.is_match(&line.text) {
            self.emit_synthetic(line, TransactionType::CarriedForward, marker_date, printed, description);
            if let Some(period) = self.periods.last_mut() {
                if period.closing_balance.is_none() {
                    period.closing_balance = printed;
                }
            }
            self.period_closed = true;
        } else {
            let opens_statement = self.transactions.is_empty();
            if opens_statement {
                self.emit_synthetic(line, TransactionType::BroughtForward, marker_date, printed, description);
                if let Some(period) = self.periods.first_mut() {
                    period.opening_balance = printed;
                }
            } else {
                self.start_new_period();
                self.emit_synthetic(line, TransactionType::PeriodBreak, marker_date, printed, description);
                if let Some(period) = self.periods.last_mut() {
                    period.opening_balance = printed;
                }
            }
            if !self.boundary_seen {
                self.opening_balance = printed;
            }
        }
        self.boundary_seen = true;
        self.dates.reset();
        self.fx_block_active = false;
        LineOutcome::PeriodBreak
    }

    fn handle_new_date(
        &mut self,
        line: &Line,
        date: chrono::NaiveDate,
        end: usize,
        cross_year: bool,
    ) -> LineOutcome {
        self.flush_current();
        if cross_year {
            self.warnings.push(Warning::CrossYearDate {
                line_index: line.index,
                date,
            });
        }
        self.current = PartialTransaction::started_at(line.page, line.index);
        self.current.date = Some(date);
        self.attach_carry_over();
        self.prior_line_bare_description = false;

        let rest = line.slice_from(end);
        if rest.is_blank() {
            LineOutcome::Buffered
        } else {
            LineOutcome::Requeued(rest)
        }
    }

    fn handle_partial_date(&mut self, line: &Line) -> LineOutcome {
        self.flush_current();
        self.current = PartialTransaction::started_at(line.page, line.index);
        self.current.date_pending_year = true;
        self.prior_line_bare_description = false;
        // Carry-over attaches only once the date is fully formed
        LineOutcome::Buffered
    }

    fn handle_year_completion(
        &mut self,
        line: &Line,
        date: chrono::NaiveDate,
        consumed: usize,
    ) -> LineOutcome {
        self.current.date = Some(date);
        self.current.date_pending_year = false;
        self.attach_carry_over();

        let rest = line.slice_from(consumed);
        if rest.is_blank() {
            LineOutcome::Buffered
        } else {
            // Trailing text is re-queued for reclassification
            LineOutcome::Requeued(rest)
        }
    }

    fn handle_fx_meta(&mut self, line: &Line) -> LineOutcome {
        self.fx_block_active = true;
        let text = compact_whitespace(&line.text);
        if self.current.is_started() {
            self.current.push_description(&text);
        } else {
            // Quiet window after an emit: the annotation belongs to the
            // next transaction
            self.append_carry_over(&text);
        }
        self.prior_line_bare_description = true;
        LineOutcome::Buffered
    }

    fn handle_amounts(&mut self, line: &Line, hits: &[AmountHit]) -> LineOutcome {
        if self.current.date_pending_year {
            // Amounts cannot be assigned while the date is incomplete
            return self.handle_continuation(line);
        }
        if !self.current.date_formed() {
            debug!(
                "line {}: amounts with no transaction in progress, ignoring",
                line.index
            );
            return LineOutcome::Skipped;
        }

        let accumulated = self.current.description_lines.join(" ");
        let keyword_text = format!("{} {}", accumulated, line.text);
        // FX annotation lines are not bare descriptions: they must not
        // license a lone amount to read as a balance.
        let ctx = RowContext {
            line,
            keyword_text: &keyword_text,
            prior_line_bare_description: self.prior_line_bare_description
                && !self.fx_block_active,
            needs_balance_only: self.current.has_directional() && self.current.balance.is_none(),
        };
        let row = classify_row(self.profile, &self.columns, hits, &ctx, &mut self.warnings);

        // Fill only the fields still missing; printed values are never
        // overwritten by later lines.
        if !self.current.has_directional() {
            if let Some(value) = row.money_in {
                self.current.money_in = Some(value);
            } else if let Some(value) = row.money_out {
                self.current.money_out = Some(value);
            }
        }
        if self.current.balance.is_none() {
            if let Some(balance) = row.balance {
                self.current.balance = Some(balance);
            }
        }
        if self.current.type_code.is_none() {
            if let Some(code) = row.type_code.clone() {
                self.current.type_code = Some(code);
            }
        }

        // Whatever on the line is not an amount or the type code joins the
        // description
        let fragment = description_fragment(line, hits, row.type_code.as_deref());
        if !fragment.is_empty() {
            self.current.push_description(&fragment);
        }
        self.prior_line_bare_description = false;

        if self
            .current
            .is_complete(self.columns.expects_balance(), self.profile.allow_missing_balance)
        {
            self.emit_current();
            LineOutcome::Emitted
        } else {
            LineOutcome::Buffered
        }
    }

    fn handle_continuation(&mut self, line: &Line) -> LineOutcome {
        let text = compact_whitespace(&line.text);
        if text.is_empty() {
            return LineOutcome::Skipped;
        }
        if self.current.is_started() {
            self.current.push_description(&text);
        } else {
            self.append_carry_over(&text);
        }
        self.prior_line_bare_description = true;
        LineOutcome::Buffered
    }

    /// Emit the in-flight transaction if it can stand, otherwise discard
    /// it with a warning. Carry-over survives a flush; FX state does not.
    fn flush_current(&mut self) {
        if !self.current.is_started() {
            return;
        }
        let partial = std::mem::take(&mut self.current);
        if partial.is_emittable(self.profile.allow_missing_balance) {
            self.emit_partial(partial);
        } else {
            debug!(
                "discarding incomplete fragment from line {}",
                partial.source_line_index
            );
            self.warnings.push(Warning::IncompleteDiscarded {
                line_index: partial.source_line_index,
                description: partial.description_lines.join(" "),
            });
            // A pending year digit in the date engine is NOT cleared here:
            // when the discard was triggered by a new split-year date, the
            // engine already holds that new fragment.
        }
        self.fx_block_active = false;
    }

    fn emit_current(&mut self) {
        let partial = std::mem::take(&mut self.current);
        self.emit_partial(partial);
        self.fx_block_active = false;
    }

    fn emit_partial(&mut self, partial: PartialTransaction) {
        if self.period_closed {
            // Ledger rows after a carried-forward marker open a new period
            self.start_new_period();
        }
        let description = partial.description_lines.join(" ");
        let transaction_type = self
            .profile
            .resolve_transaction_type(partial.type_code.as_deref(), &description);
        let tx = partial.into_transaction(transaction_type);
        self.track_period_emit(&tx);
        self.transactions.push(tx);
        self.prior_line_bare_description = false;
    }

    fn emit_synthetic(
        &mut self,
        line: &Line,
        transaction_type: TransactionType,
        date: Option<chrono::NaiveDate>,
        balance: Option<Decimal>,
        description: String,
    ) {
        let tx = Transaction {
            date,
            description,
            money_in: Decimal::ZERO,
            money_out: Decimal::ZERO,
            balance,
            type_code: None,
            transaction_type,
            confidence: 0,
            source_page: line.page,
            source_line_index: line.index,
        };
        self.track_period_emit(&tx);
        self.transactions.push(tx);
    }

    fn track_period_emit(&mut self, tx: &Transaction) {
        if let Some(period) = self.periods.last_mut() {
            period.transaction_count += 1;
            if !tx.is_synthetic() {
                if let Some(date) = tx.date {
                    if period.start_date.is_none() {
                        period.start_date = Some(date);
                    }
                    period.end_date = Some(date);
                }
            }
        }
    }

    fn start_new_period(&mut self) {
        self.periods.push(Period::starting_at(self.transactions.len()));
        self.period_closed = false;
    }

    fn attach_carry_over(&mut self) {
        if let Some(desc) = self.carry_over_desc.take() {
            // The buffered narrative precedes anything gathered since
            self.current.description_lines.insert(0, desc);
        }
    }

    fn append_carry_over(&mut self, text: &str) {
        match &mut self.carry_over_desc {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => self.carry_over_desc = Some(text.to_string()),
        }
    }
}

/// Collapse runs of whitespace left over from column spacing.
fn compact_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Line text with amount spans and the type-code token removed.
fn description_fragment(line: &Line, hits: &[AmountHit], type_code: Option<&str>) -> String {
    let mut bytes = line.text.as_bytes().to_vec();
    for hit in hits {
        for b in &mut bytes[hit.start..hit.end] {
            if b.is_ascii() {
                *b = b' ';
            }
        }
    }
    let mut text = String::from_utf8(bytes).unwrap_or_else(|_| line.text.clone());
    if let Some(code) = type_code {
        if let Some(pos) = text.find(code) {
            text.replace_range(pos..pos + code.len(), &" ".repeat(code.len()));
        }
    }
    compact_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::builtin::uk_appbank_personal;
    use crate::parsers::lines::LineReconstructor;
    use crate::structs::Token;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;

    /// Run a token fixture through line reconstruction and the state
    /// machine, the way the engine does.
    fn run_machine(profile: &BankProfile, tokens: Vec<Token>) -> StatementStateMachine<'_> {
        let mut machine = StatementStateMachine::new(profile);
        let mut warnings = Vec::new();
        let reconstructor = LineReconstructor::new(profile.y_tolerance);
        let lines = reconstructor.reconstruct(tokens, &mut warnings);
        machine.warnings.extend(warnings);

        let mut queue: VecDeque<Line> = lines.into();
        while let Some(line) = queue.pop_front() {
            if let LineOutcome::Requeued(rest) = machine.step(&line) {
                queue.push_front(rest);
            }
        }
        machine.finish();
        machine
    }

    /// Fixture rows are (text, x1, x2); y advances per row.
    fn tokens_from_rows(rows: &[&[(&str, f32, f32)]]) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let y = 100.0 + i as f32 * 12.0;
            for (text, x1, x2) in row.iter() {
                tokens.push(Token::new(*text, 0, *x1, *x2, y));
            }
        }
        tokens
    }

    #[test]
    fn test_split_date_with_inline_date_winning() {
        // Scenario: split dates with an intervening description, and a
        // year-digit line with trailing text that belongs to the next
        // description.
        let profile = uk_appbank_personal();
        let rows: &[&[(&str, f32, f32)]] = &[
            &[("08/08/202", 20.0, 74.0)],
            &[("4", 20.0, 26.0)],
            &[("Merchant X", 80.0, 140.0)],
            &[("-30.00", 392.0, 428.0), ("10.39", 508.0, 538.0)],
            &[("08/08/202", 20.0, 74.0)],
            &[("Another Merchant", 80.0, 176.0)],
            &[("4  extra", 20.0, 68.0)],
            &[("-5.00", 398.0, 428.0), ("5.39", 514.0, 538.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        assert_eq!(machine.transactions.len(), 2);
        let first = &machine.transactions[0];
        let second = &machine.transactions[1];

        let expected_date = chrono::NaiveDate::from_ymd_opt(2024, 8, 8);
        assert_eq!(first.date, expected_date);
        assert_eq!(second.date, expected_date);

        assert_eq!(first.description, "Merchant X");
        assert_eq!(first.money_out, dec!(30.00));
        assert_eq!(first.balance, Some(dec!(10.39)));

        // " extra" from the year-digit line lands in the next description
        assert_eq!(second.description, "Another Merchant extra");
        assert_eq!(second.money_out, dec!(5.00));
        assert_eq!(second.balance, Some(dec!(5.39)));
    }

    #[test]
    fn test_fx_block_immediate_emit_and_carry_over() {
        // FX annotations join the description verbatim; the foreign value
        // never becomes a ledger amount; the transaction emits as soon as
        // its balance arrives.
        let profile = uk_appbank_personal();
        let rows: &[&[(&str, f32, f32)]] = &[
            &[("01/08/2024", 20.0, 80.0), ("Transfer from Pot", 90.0, 200.0), ("50.00", 398.0, 428.0), ("60.39", 508.0, 538.0)],
            &[("02/08/2024", 20.0, 80.0)],
            &[("Kashia*Nyasa KEN", 90.0, 200.0)],
            &[("Amount: USD -38.04. Conversion", 90.0, 280.0)],
            &[("rate: 1.268.", 90.0, 160.0)],
            &[("-30.00", 392.0, 428.0)],
            &[("10.39", 508.0, 538.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        assert_eq!(machine.transactions.len(), 2);
        let first = &machine.transactions[0];
        assert_eq!(first.money_in, dec!(50.00));
        assert_eq!(first.balance, Some(dec!(60.39)));

        let second = &machine.transactions[1];
        assert_eq!(
            second.description,
            "Kashia*Nyasa KEN Amount: USD -38.04. Conversion rate: 1.268."
        );
        assert_eq!(second.money_out, dec!(30.00));
        assert_eq!(second.money_in, Decimal::ZERO);
        assert_eq!(second.balance, Some(dec!(10.39)));

        // The foreign 38.04 must never appear as a ledger value
        for tx in &machine.transactions {
            assert_ne!(tx.money_in.abs(), dec!(38.04));
            assert_ne!(tx.money_out.abs(), dec!(38.04));
            assert_ne!(tx.balance.map(|b| b.abs()), Some(dec!(38.04)));
        }
    }

    #[test]
    fn test_carry_over_attaches_to_next_transaction() {
        // A narrative line arriving after an emitted transaction belongs
        // to the next transaction, never the previous one.
        let profile = uk_appbank_personal();
        let rows: &[&[(&str, f32, f32)]] = &[
            &[("01/08/2024", 20.0, 80.0), ("Coffee", 90.0, 130.0), ("-3.50", 398.0, 428.0), ("96.50", 508.0, 538.0)],
            &[("Kashia*Nyasa KEN", 90.0, 200.0)],
            &[("02/08/2024", 20.0, 80.0), ("-10.00", 392.0, 428.0), ("86.50", 508.0, 538.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        assert_eq!(machine.transactions.len(), 2);
        assert_eq!(machine.transactions[0].description, "Coffee");
        assert_eq!(machine.transactions[1].description, "Kashia*Nyasa KEN");
    }

    #[test]
    fn test_period_boundary_emits_markers_and_resets() {
        let profile = uk_appbank_personal();
        let rows: &[&[(&str, f32, f32)]] = &[
            &[("Balance brought forward", 20.0, 180.0), ("1,000.00", 490.0, 538.0)],
            &[("01/08/2024", 20.0, 80.0), ("Coffee", 90.0, 130.0), ("-3.50", 398.0, 428.0), ("996.50", 502.0, 538.0)],
            &[("Balance carried forward", 20.0, 180.0), ("996.50", 502.0, 538.0)],
            &[("Balance brought forward", 20.0, 180.0), ("996.50", 502.0, 538.0)],
            &[("05/09/2024", 20.0, 80.0), ("Refund", 90.0, 130.0), ("20.00", 398.0, 428.0), ("1,016.50", 490.0, 538.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        let types: Vec<TransactionType> = machine
            .transactions
            .iter()
            .map(|t| t.transaction_type)
            .collect();
        assert_eq!(
            types,
            vec![
                TransactionType::BroughtForward,
                TransactionType::Other,
                TransactionType::CarriedForward,
                TransactionType::PeriodBreak,
                TransactionType::Other,
            ]
        );
        assert_eq!(machine.periods.len(), 2);
        assert_eq!(machine.opening_balance, Some(dec!(1000.00)));
        assert_eq!(machine.periods[0].opening_balance, Some(dec!(1000.00)));
        assert_eq!(machine.periods[0].closing_balance, Some(dec!(996.50)));
        assert_eq!(machine.periods[1].opening_balance, Some(dec!(996.50)));
        // The period break marker opens the second period's range
        assert_eq!(machine.periods[1].first_transaction, 3);
    }

    #[test]
    fn test_summary_rows_feed_period_metadata_then_skip() {
        let profile = uk_appbank_personal();
        let rows: &[&[(&str, f32, f32)]] = &[
            &[("01/08/2024", 20.0, 80.0), ("Coffee", 90.0, 130.0), ("-3.50", 398.0, 428.0), ("96.50", 508.0, 538.0)],
            &[("Total money in", 20.0, 120.0), ("0.00", 404.0, 428.0)],
            &[("Total money out", 20.0, 124.0), ("3.50", 404.0, 428.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        assert_eq!(machine.transactions.len(), 1);
        assert_eq!(machine.periods[0].printed_total_in, Some(dec!(0.00)));
        assert_eq!(machine.periods[0].printed_total_out, Some(dec!(3.50)));
    }

    #[test]
    fn test_incomplete_fragment_discarded_with_warning() {
        let profile = uk_appbank_personal();
        let rows: &[&[(&str, f32, f32)]] = &[
            // A dated line whose amounts never arrive
            &[("01/08/2024", 20.0, 80.0), ("Stray entry", 90.0, 160.0)],
            &[("02/08/2024", 20.0, 80.0), ("Real", 90.0, 120.0), ("-1.00", 398.0, 428.0), ("99.00", 508.0, 538.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        assert_eq!(machine.transactions.len(), 1);
        assert_eq!(machine.transactions[0].description, "Real");
        assert!(machine
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::IncompleteDiscarded { .. })));
    }

    #[test]
    fn test_unparseable_date_line_warns_and_continues() {
        let profile = uk_appbank_personal();
        let rows: &[&[(&str, f32, f32)]] = &[
            &[("01/08/2024", 20.0, 80.0), ("Coffee", 90.0, 130.0), ("-3.50", 398.0, 428.0), ("96.50", 508.0, 538.0)],
            &[("99/99/2024 Broken row", 20.0, 150.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        assert_eq!(machine.transactions.len(), 1);
        assert!(machine
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::UnparseableDate { .. })));
    }

    #[test]
    fn test_missing_header_warning_when_required() {
        let mut profile = uk_appbank_personal();
        profile.require_header_per_page = true;
        profile.header_scan_lines = 2;

        let rows: &[&[(&str, f32, f32)]] = &[
            &[("01/08/2024", 20.0, 80.0), ("Coffee", 90.0, 130.0), ("-3.50", 398.0, 428.0), ("96.50", 508.0, 538.0)],
            &[("Filler line", 90.0, 150.0)],
            &[("More filler", 90.0, 150.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));
        assert!(machine
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::HeaderMissing { page: 0 })));
    }

    #[test]
    fn test_type_code_strategy_names_transaction_type() {
        let profile = crate::configs::builtin::uk_highstreet_typecode();
        let rows: &[&[(&str, f32, f32)]] = &[
            &[("Paid out", 340.0, 428.0), ("Paid in", 440.0, 470.0), ("Balance", 500.0, 538.0)],
            &[("01 Aug 2024", 20.0, 86.0), ("DD", 100.0, 114.0), ("British Gas", 130.0, 200.0), ("45.00", 398.0, 428.0), ("955.00", 502.0, 538.0)],
        ];
        let machine = run_machine(&profile, tokens_from_rows(rows));

        assert_eq!(machine.transactions.len(), 1);
        let tx = &machine.transactions[0];
        assert_eq!(tx.type_code.as_deref(), Some("DD"));
        assert_eq!(tx.transaction_type, TransactionType::DirectDebit);
        assert_eq!(tx.money_out, dec!(45.00));
        assert_eq!(tx.description, "British Gas");
    }
}
