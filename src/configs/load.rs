use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::configs::profile::{
    BankProfile, ClassificationStrategy, ColumnSpec, ColumnThresholds,
};
use crate::configs::validate::validate_profile;
use crate::structs::TransactionType;

fn compile_regex(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("Invalid regex '{}': {}", pattern, e))
}

fn compile_regex_vec(patterns: Vec<String>) -> Result<Vec<Regex>, String> {
    let mut result = Vec::with_capacity(patterns.len());
    for p in patterns {
        result.push(compile_regex(&p)?);
    }
    Ok(result)
}

/// Raw struct used only for deserialization (all fields optional so we can
/// overlay defaults).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BankProfilePartial {
    key: Option<String>,
    bank_name: Option<String>,
    identifiers: Option<Vec<String>>,
    date_formats: Option<Vec<String>>,
    period_boundary_pattern: Option<String>,
    columns: Option<Vec<ColumnSpec>>,
    default_column_thresholds: Option<ColumnThresholds>,
    classification_strategy: Option<ClassificationStrategy>,
    money_in_codes: Option<Vec<String>>,
    money_out_codes: Option<Vec<String>>,
    money_in_keywords: Option<Vec<String>>,
    money_out_keywords: Option<Vec<String>>,
    type_code_position_threshold: Option<f32>,
    skip_patterns: Option<Vec<String>>,
    fx_markers: Option<Vec<String>>,
    allow_missing_balance: Option<bool>,
    allow_dual_amounts: Option<bool>,
    x_tolerance: Option<f32>,
    y_tolerance: Option<f32>,
    require_header_per_page: Option<bool>,
    header_scan_lines: Option<usize>,
    transaction_type_map: Option<BTreeMap<String, TransactionType>>,
}

/// Load and validate a profile from a JSON file.
pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<BankProfile, String> {
    let path_ref = path.as_ref();
    let data = fs::read_to_string(path_ref)
        .map_err(|e| format!("Failed reading profile {:?}: {}", path_ref, e))?;
    from_json_str(&data)
}

/// Load and validate a profile from a JSON string, overlaying the supplied
/// fields onto `BankProfile::default()`.
pub fn from_json_str(src: &str) -> Result<BankProfile, String> {
    let partial: BankProfilePartial =
        serde_json::from_str(src).map_err(|e| format!("JSON parse error: {}", e))?;
    let mut profile = BankProfile::default();

    macro_rules! overlay {
        ($field:ident) => {
            if let Some(v) = partial.$field {
                profile.$field = v;
            }
        };
    }

    overlay!(key);
    overlay!(bank_name);
    overlay!(identifiers);
    overlay!(date_formats);
    if let Some(pattern) = partial.period_boundary_pattern {
        profile.period_boundary_pattern = compile_regex(&pattern)?;
    }
    overlay!(columns);
    overlay!(default_column_thresholds);
    overlay!(classification_strategy);
    overlay!(money_in_codes);
    overlay!(money_out_codes);
    overlay!(money_in_keywords);
    overlay!(money_out_keywords);
    if let Some(v) = partial.type_code_position_threshold {
        profile.type_code_position_threshold = Some(v);
    }
    if let Some(patterns) = partial.skip_patterns {
        profile.skip_patterns = compile_regex_vec(patterns)?;
    }
    overlay!(fx_markers);
    overlay!(allow_missing_balance);
    overlay!(allow_dual_amounts);
    overlay!(x_tolerance);
    overlay!(y_tolerance);
    overlay!(require_header_per_page);
    overlay!(header_scan_lines);
    if let Some(map) = partial.transaction_type_map {
        // Keys are matched lowercase at resolution time
        profile.transaction_type_map = map
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
    }

    validate_profile(&profile)?;
    Ok(profile)
}
