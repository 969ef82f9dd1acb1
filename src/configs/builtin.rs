use std::collections::BTreeMap;

use crate::configs::profile::{
    BankProfile, ClassificationStrategy, ColumnRole, ColumnSpec, ColumnThresholds,
};
use crate::configs::registry::ProfileRegistry;
use crate::structs::TransactionType;

/// Type map shared by the built-in profiles: printed codes first, then
/// description phrases.
fn common_type_map() -> BTreeMap<String, TransactionType> {
    let entries: &[(&str, TransactionType)] = &[
        ("dd", TransactionType::DirectDebit),
        ("so", TransactionType::StandingOrder),
        ("fpi", TransactionType::Credit),
        ("fpo", TransactionType::Transfer),
        ("bgc", TransactionType::Credit),
        ("tfr", TransactionType::Transfer),
        ("chg", TransactionType::Fee),
        ("int", TransactionType::Interest),
        ("atm", TransactionType::Atm),
        ("pos", TransactionType::CardPayment),
        ("card payment", TransactionType::CardPayment),
        ("card transaction", TransactionType::CardPayment),
        ("direct debit", TransactionType::DirectDebit),
        ("standing order", TransactionType::StandingOrder),
        ("transfer", TransactionType::Transfer),
        ("automated credit", TransactionType::Credit),
        ("cash withdrawal", TransactionType::Atm),
        ("interest", TransactionType::Interest),
        ("account fee", TransactionType::Fee),
    ];
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

/// Generic UK current account: three labelled amount columns, geometry
/// classification.
pub fn uk_generic_current() -> BankProfile {
    BankProfile {
        key: "uk__generic__current__1".to_string(),
        bank_name: "Generic Bank".to_string(),
        identifiers: vec![],
        date_formats: vec![
            "DD MMM YYYY".to_string(),
            "DD MMM".to_string(),
            "DD/MM/YYYY".to_string(),
        ],
        columns: vec![
            ColumnSpec::new("Money out", ColumnRole::MoneyOut),
            ColumnSpec::new("Withdrawn", ColumnRole::MoneyOut),
            ColumnSpec::new("\u{a3} Out", ColumnRole::MoneyOut),
            ColumnSpec::new("Money in", ColumnRole::MoneyIn),
            ColumnSpec::new("Paid in", ColumnRole::MoneyIn),
            ColumnSpec::new("\u{a3} In", ColumnRole::MoneyIn),
            ColumnSpec::new("Balance", ColumnRole::Balance),
        ],
        classification_strategy: ClassificationStrategy::ColumnPosition,
        transaction_type_map: common_type_map(),
        ..BankProfile::default()
    }
}

/// App-bank personal account in the Monzo mould: one signed amount column
/// plus balance, foreign-currency annotation lines, split-year dates.
///
/// The signed amount column maps to the money-in role; negative values
/// classify as money out.
pub fn uk_appbank_personal() -> BankProfile {
    BankProfile {
        key: "uk__appbank__personal__1".to_string(),
        bank_name: "App Bank".to_string(),
        identifiers: vec![],
        date_formats: vec!["DD/MM/YYYY".to_string(), "DD MMM YYYY".to_string()],
        columns: vec![
            ColumnSpec::new("Amount", ColumnRole::MoneyIn),
            ColumnSpec::new("Amount (GBP)", ColumnRole::MoneyIn),
            ColumnSpec::new("Balance", ColumnRole::Balance),
            ColumnSpec::new("Balance (GBP)", ColumnRole::Balance),
        ],
        default_column_thresholds: ColumnThresholds {
            money_in: Some(430.0),
            money_out: None,
            balance: Some(540.0),
        },
        classification_strategy: ClassificationStrategy::Hybrid,
        money_in_keywords: vec![
            "automated credit".to_string(),
            "cash & dep".to_string(),
            "transfer from".to_string(),
        ],
        money_out_keywords: vec![
            "card transaction".to_string(),
            "direct debit".to_string(),
            "online transaction".to_string(),
        ],
        fx_markers: vec![
            "USD".to_string(),
            "EUR".to_string(),
            "KES".to_string(),
            "SGD".to_string(),
        ],
        transaction_type_map: common_type_map(),
        ..BankProfile::default()
    }
}

/// Legacy high-street layout: printed type codes decide direction,
/// geometry is the fallback.
pub fn uk_highstreet_typecode() -> BankProfile {
    BankProfile {
        key: "uk__highstreet__current__1".to_string(),
        bank_name: "High Street Bank".to_string(),
        identifiers: vec![],
        date_formats: vec!["DD MMM YYYY".to_string(), "DD MMM".to_string()],
        columns: vec![
            ColumnSpec::new("Paid out", ColumnRole::MoneyOut),
            ColumnSpec::new("Paid in", ColumnRole::MoneyIn),
            ColumnSpec::new("Balance", ColumnRole::Balance),
        ],
        classification_strategy: ClassificationStrategy::TypeCode,
        money_in_codes: vec![
            "FPI".to_string(),
            "BGC".to_string(),
            "CR".to_string(),
            "DEP".to_string(),
        ],
        money_out_codes: vec![
            "FPO".to_string(),
            "DD".to_string(),
            "SO".to_string(),
            "CHG".to_string(),
            "ATM".to_string(),
            "POS".to_string(),
        ],
        type_code_position_threshold: Some(120.0),
        transaction_type_map: common_type_map(),
        ..BankProfile::default()
    }
}

/// Register every built-in profile.
///
/// Built-ins are static data validated on registration. A rejection is a
/// programming error, so it panics immediately rather than shipping a
/// registry with a silently missing profile.
pub fn register_builtins(registry: &mut ProfileRegistry) {
    for profile in [
        uk_generic_current(),
        uk_appbank_personal(),
        uk_highstreet_typecode(),
    ] {
        let key = profile.key.clone();
        if let Err(reason) = registry.register(profile) {
            panic!("builtin profile '{}' rejected: {}", key, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::validate::validate_profile;

    #[test]
    fn test_all_builtins_validate() {
        assert!(validate_profile(&uk_generic_current()).is_ok());
        assert!(validate_profile(&uk_appbank_personal()).is_ok());
        assert!(validate_profile(&uk_highstreet_typecode()).is_ok());
    }

    #[test]
    fn test_builtin_keys_are_distinct() {
        let keys = [
            uk_generic_current().key,
            uk_appbank_personal().key,
            uk_highstreet_typecode().key,
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
    }

    #[test]
    fn test_appbank_carries_fx_markers() {
        let profile = uk_appbank_personal();
        assert!(profile.fx_markers.contains(&"KES".to_string()));
        assert_eq!(profile.classification_strategy, ClassificationStrategy::Hybrid);
    }
}
