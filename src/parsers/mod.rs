pub mod amounts;
pub mod classify;
pub mod columns;
pub mod dates;
pub mod engine;
pub mod lines;
pub mod skip;
pub mod state_machine;

pub use amounts::{AmountExtractor, AmountHit};
pub use classify::{classify_row, ClassifiedRow, RowContext};
pub use columns::ColumnModel;
pub use dates::{DateEngine, DateFormat, DateMatch};
pub use engine::{CancelToken, ParseOptions, StatementEngine};
pub use lines::LineReconstructor;
pub use state_machine::{LineOutcome, StatementStateMachine};
