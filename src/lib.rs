pub mod checkers;
pub mod configs;
pub mod errors;
pub mod parsers;
pub mod reconcile;
pub mod structs;

pub use configs::{BankProfile, ClassificationStrategy, ProfileRegistry};
pub use errors::ParseError;
pub use parsers::engine::{CancelToken, ParseOptions, StatementEngine};
pub use structs::{
    Period, StatementResult, Token, TokenStream, Transaction, TransactionType, VecTokenStream,
    Warning,
};
