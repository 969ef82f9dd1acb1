use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::structs::TransactionType;

/// Default marker for brought-forward / carried-forward balance lines.
static DEFAULT_PERIOD_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbalance\s+(brought|carried)\s+forward\b|\b(b|c)/f\s+balance\b").unwrap()
});

/// Which ledger column a header name announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    MoneyIn,
    MoneyOut,
    Balance,
}

/// A header name to look for and the column it announces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub role: ColumnRole,
}

impl ColumnSpec {
    pub fn new(name: &str, role: ColumnRole) -> Self {
        ColumnSpec {
            name: name.to_string(),
            role,
        }
    }
}

/// Fallback right-edge x-values used until a header has been seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ColumnThresholds {
    pub money_in: Option<f32>,
    pub money_out: Option<f32>,
    pub balance: Option<f32>,
}

/// How amounts on a row are assigned to money-in / money-out / balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStrategy {
    /// Geometry only: thresholds derived from the column model.
    ColumnPosition,
    /// A printed type code decides direction; geometry is the fallback.
    TypeCode,
    /// Directional keywords in the description decide; default is out.
    Keyword,
    /// Geometry when unambiguous, keywords when a row has a lone amount.
    Hybrid,
}

/// Declarative parsing configuration for one bank's statement layout.
///
/// Banks differ only in data: the same engine drives every profile. A
/// profile is immutable once loaded and registered.
#[derive(Debug, Clone)]
pub struct BankProfile {
    pub key: String,
    pub bank_name: String,
    /// Strings the upstream bank resolver matches on. The engine itself
    /// never reads these; they ship with the profile for documentation.
    pub identifiers: Vec<String>,
    /// Ordered date format names tried by the date engine
    pub date_formats: Vec<String>,
    /// Matches brought-forward / carried-forward marker lines
    pub period_boundary_pattern: Regex,
    /// Header names announcing amount columns
    pub columns: Vec<ColumnSpec>,
    pub default_column_thresholds: ColumnThresholds,
    pub classification_strategy: ClassificationStrategy,
    pub money_in_codes: Vec<String>,
    pub money_out_codes: Vec<String>,
    pub money_in_keywords: Vec<String>,
    pub money_out_keywords: Vec<String>,
    /// Right edge below which a token may be read as a type code
    pub type_code_position_threshold: Option<f32>,
    /// Per-bank noise patterns, applied after the universal set
    pub skip_patterns: Vec<Regex>,
    /// Currency codes treated as foreign annotations, never ledger values
    pub fx_markers: Vec<String>,
    /// Brought-forward and fee rows may print only one of balance /
    /// directional amount
    pub allow_missing_balance: bool,
    /// Permit rows carrying both money-in and money-out
    pub allow_dual_amounts: bool,
    pub x_tolerance: f32,
    pub y_tolerance: f32,
    pub require_header_per_page: bool,
    /// How many lines into a page to look for a header before inheriting
    /// the previous page's column model
    pub header_scan_lines: usize,
    /// Code or keyword (lowercase) to transaction type
    pub transaction_type_map: BTreeMap<String, TransactionType>,
}

impl Default for BankProfile {
    fn default() -> Self {
        BankProfile {
            key: "generic".to_string(),
            bank_name: "Generic Bank".to_string(),
            identifiers: vec![],
            date_formats: vec![
                "DD MMM YYYY".to_string(),
                "DD MMM".to_string(),
                "DD/MM/YYYY".to_string(),
            ],
            period_boundary_pattern: DEFAULT_PERIOD_BOUNDARY.clone(),
            columns: vec![
                ColumnSpec::new("Money out", ColumnRole::MoneyOut),
                ColumnSpec::new("Money in", ColumnRole::MoneyIn),
                ColumnSpec::new("Balance", ColumnRole::Balance),
            ],
            default_column_thresholds: ColumnThresholds::default(),
            classification_strategy: ClassificationStrategy::ColumnPosition,
            money_in_codes: vec![],
            money_out_codes: vec![],
            money_in_keywords: vec![],
            money_out_keywords: vec![],
            type_code_position_threshold: None,
            skip_patterns: vec![],
            fx_markers: vec![],
            allow_missing_balance: false,
            allow_dual_amounts: false,
            x_tolerance: 1.0,
            y_tolerance: 1.2,
            require_header_per_page: false,
            header_scan_lines: 8,
            transaction_type_map: BTreeMap::new(),
        }
    }
}

impl BankProfile {
    /// True when `code` is a known money-in type code.
    pub fn is_money_in_code(&self, code: &str) -> bool {
        self.money_in_codes.iter().any(|c| c == code)
    }

    /// True when `code` is a known money-out type code.
    pub fn is_money_out_code(&self, code: &str) -> bool {
        self.money_out_codes.iter().any(|c| c == code)
    }

    /// Resolve a transaction type from a printed code or the description.
    ///
    /// Codes match exactly (case-insensitive); map keys are otherwise
    /// treated as lowercase substrings of the description. Entries are
    /// scanned in key order so resolution is deterministic.
    pub fn resolve_transaction_type(
        &self,
        type_code: Option<&str>,
        description: &str,
    ) -> TransactionType {
        if let Some(code) = type_code {
            let code_lower = code.to_lowercase();
            if let Some(t) = self.transaction_type_map.get(&code_lower) {
                return *t;
            }
        }
        let desc_lower = description.to_lowercase();
        for (key, t) in &self.transaction_type_map {
            // Multi-word keys match as phrases; single words must match a
            // whole word so "dd" cannot hit inside "address".
            let hit = if key.contains(' ') {
                desc_lower.contains(key.as_str())
            } else {
                desc_lower
                    .split_whitespace()
                    .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == key.as_str())
            };
            if hit {
                return *t;
            }
        }
        TransactionType::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period_boundary_matches_markers() {
        let profile = BankProfile::default();
        assert!(profile.period_boundary_pattern.is_match("Balance brought forward"));
        assert!(profile.period_boundary_pattern.is_match("BALANCE CARRIED FORWARD 120.00"));
        assert!(!profile.period_boundary_pattern.is_match("Card payment to Tesco"));
    }

    #[test]
    fn test_resolve_type_prefers_code_over_keyword() {
        let mut profile = BankProfile::default();
        profile
            .transaction_type_map
            .insert("dd".to_string(), TransactionType::DirectDebit);
        profile
            .transaction_type_map
            .insert("card payment".to_string(), TransactionType::CardPayment);

        let t = profile.resolve_transaction_type(Some("DD"), "Card payment to Tesco");
        assert_eq!(t, TransactionType::DirectDebit);

        let t = profile.resolve_transaction_type(None, "Card payment to Tesco");
        assert_eq!(t, TransactionType::CardPayment);

        let t = profile.resolve_transaction_type(None, "Something else entirely");
        assert_eq!(t, TransactionType::Other);
    }

    #[test]
    fn test_code_tables() {
        let mut profile = BankProfile::default();
        profile.money_in_codes = vec!["FPI".to_string()];
        profile.money_out_codes = vec!["FPO".to_string(), "DD".to_string()];
        assert!(profile.is_money_in_code("FPI"));
        assert!(!profile.is_money_in_code("FPO"));
        assert!(profile.is_money_out_code("DD"));
    }
}
