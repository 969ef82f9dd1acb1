pub mod layout;
pub mod line;
pub mod partial;
pub mod statement;
pub mod token;
pub mod transaction;

pub use line::{Line, Run};
pub use partial::PartialTransaction;
pub use statement::{Period, StatementResult, Warning};
pub use token::{Token, TokenStream, VecTokenStream};
pub use transaction::{Transaction, TransactionType};
