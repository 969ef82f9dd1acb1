use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::checkers::check_statement;
use crate::configs::{BankProfile, validate_profile};
use crate::errors::ParseError;
use crate::parsers::lines::LineReconstructor;
use crate::parsers::state_machine::{LineOutcome, StatementStateMachine};
use crate::reconcile::reconcile_statement;
use crate::structs::{Line, StatementResult, Token, TokenStream, VecTokenStream};

/// Shared cancellation flag, checked between lines.
///
/// Cancelling never loses work: the engine returns everything emitted so
/// far as a partial result inside `ParseError::Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Call-time options for one parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// When true, any period that fails reconciliation makes the overall
    /// result unsuccessful (legal-evidence mode). Semantics are otherwise
    /// identical to the permissive default.
    pub require_strict: bool,
    pub cancel: Option<CancelToken>,
}

/// The statement parsing and reconciliation engine.
///
/// Owns no shared state: every parse builds its own context, so one
/// engine may serve parallel statement parses from separate calls. The
/// profile is validated once at construction.
#[derive(Debug)]
pub struct StatementEngine {
    profile: BankProfile,
}

impl StatementEngine {
    /// Build an engine for one bank profile. Rejects invalid profiles up
    /// front so a parse can never start misconfigured.
    pub fn new(profile: BankProfile) -> Result<Self, ParseError> {
        validate_profile(&profile).map_err(|reason| ParseError::ProfileInvalid {
            key: profile.key.clone(),
            reason,
        })?;
        Ok(StatementEngine { profile })
    }

    /// Parse an already-materialized token vector.
    pub fn parse_tokens(
        &self,
        tokens: Vec<Token>,
        options: &ParseOptions,
    ) -> Result<StatementResult, ParseError> {
        let mut stream = VecTokenStream::new(tokens);
        self.parse_stream(&mut stream, options)
    }

    /// Drain a token stream and produce the statement result.
    ///
    /// The pipeline is a synchronous pull: each line is fully processed
    /// before the next is consumed, and reconciliation rewrites happen
    /// before the result is returned. Determinism: the same stream and
    /// profile always produce an identical result.
    pub fn parse_stream(
        &self,
        stream: &mut dyn TokenStream,
        options: &ParseOptions,
    ) -> Result<StatementResult, ParseError> {
        let tokens = self.drain_stream(stream)?;

        let mut machine = StatementStateMachine::new(&self.profile);
        let reconstructor = LineReconstructor::new(self.profile.y_tolerance);
        let mut line_warnings = Vec::new();
        let lines = reconstructor.reconstruct(tokens, &mut line_warnings);
        machine.warnings.extend(line_warnings);

        let mut queue: VecDeque<Line> = lines.into();
        while let Some(line) = queue.pop_front() {
            if let Some(cancel) = &options.cancel {
                if cancel.is_cancelled() {
                    debug!("parse cancelled at line {}", line.index);
                    let partial = self.assemble(machine, true, options);
                    return Err(ParseError::Cancelled {
                        partial: Box::new(partial),
                    });
                }
            }
            if let LineOutcome::Requeued(rest) = machine.step(&line) {
                queue.push_front(rest);
            }
        }
        machine.finish();

        Ok(self.assemble(machine, false, options))
    }

    /// Validate stream ordering while collecting tokens.
    ///
    /// Within-page y-jitter is normalized later by sorting; what cannot
    /// be normalized is a page index that goes backwards.
    fn drain_stream(&self, stream: &mut dyn TokenStream) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut max_page = 0usize;
        while let Some(token) = stream.next_token() {
            if token.page < max_page {
                return Err(ParseError::StreamInvalid {
                    reason: format!(
                        "page order regressed from {} to {}",
                        max_page, token.page
                    ),
                    partial: Box::new(StatementResult {
                        partial: true,
                        ..StatementResult::empty()
                    }),
                });
            }
            max_page = max_page.max(token.page);
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Common result assembly: reconcile, check, score, flag.
    fn assemble(
        &self,
        machine: StatementStateMachine<'_>,
        partial: bool,
        options: &ParseOptions,
    ) -> StatementResult {
        let mut result = StatementResult {
            transactions: machine.transactions,
            periods: machine.periods,
            opening_balance: machine.opening_balance,
            closing_balance: None,
            warnings: machine.warnings,
            confidence_overall: 0,
            partial,
            success: true,
        };

        reconcile_statement(&mut result);
        check_statement(&mut result);

        // Closing balance is the last transaction's post-reconciliation
        // balance; it overrides anything the header printed.
        result.closing_balance = result
            .transactions
            .iter()
            .rev()
            .find_map(|t| t.balance);

        if options.require_strict && result.periods.iter().any(|p| !p.reconciled) {
            result.success = false;
        }
        result
    }
}
