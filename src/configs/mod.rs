pub mod builtin;
pub mod load;
pub mod profile;
pub mod registry;
pub mod validate;

pub use load::{from_json_file, from_json_str};
pub use profile::{
    BankProfile, ClassificationStrategy, ColumnRole, ColumnSpec, ColumnThresholds,
};
pub use registry::ProfileRegistry;
pub use validate::validate_profile;
