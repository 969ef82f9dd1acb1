use crate::configs::profile::{BankProfile, ClassificationStrategy, ColumnRole};
use crate::parsers::dates::DateFormat;

/// Validate a profile before it is registered or used for a parse.
///
/// Returns a human-readable reason on rejection; callers surface it as
/// `ParseError::ProfileInvalid`.
pub fn validate_profile(profile: &BankProfile) -> Result<(), String> {
    if profile.key.trim().is_empty() {
        return Err("profile key must not be empty".to_string());
    }

    if profile.date_formats.is_empty() {
        return Err("at least one date format is required".to_string());
    }
    for name in &profile.date_formats {
        if DateFormat::from_name(name).is_none() {
            return Err(format!("unknown date format '{}'", name));
        }
    }

    if !(profile.x_tolerance.is_finite() && profile.x_tolerance > 0.0) {
        return Err(format!("x_tolerance must be positive, got {}", profile.x_tolerance));
    }
    if !(profile.y_tolerance.is_finite() && profile.y_tolerance > 0.0) {
        return Err(format!("y_tolerance must be positive, got {}", profile.y_tolerance));
    }
    if profile.header_scan_lines == 0 {
        return Err("header_scan_lines must be at least 1".to_string());
    }

    for marker in &profile.fx_markers {
        if marker.len() != 3 || !marker.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(format!(
                "fx marker '{}' is not a three-letter currency code",
                marker
            ));
        }
    }

    match profile.classification_strategy {
        ClassificationStrategy::TypeCode => {
            if profile.money_in_codes.is_empty() && profile.money_out_codes.is_empty() {
                return Err(
                    "type_code strategy requires money_in_codes or money_out_codes".to_string(),
                );
            }
        }
        ClassificationStrategy::Keyword => {
            if profile.money_in_keywords.is_empty() && profile.money_out_keywords.is_empty() {
                return Err(
                    "keyword strategy requires money_in_keywords or money_out_keywords".to_string(),
                );
            }
        }
        ClassificationStrategy::ColumnPosition | ClassificationStrategy::Hybrid => {
            let has_in = profile
                .columns
                .iter()
                .any(|c| c.role == ColumnRole::MoneyIn)
                || profile.default_column_thresholds.money_in.is_some();
            let has_out = profile
                .columns
                .iter()
                .any(|c| c.role == ColumnRole::MoneyOut)
                || profile.default_column_thresholds.money_out.is_some();
            if profile.classification_strategy == ClassificationStrategy::ColumnPosition {
                if !has_in || !has_out {
                    return Err(
                        "column_position needs money-in and money-out columns or default thresholds"
                            .to_string(),
                    );
                }
            } else if !has_in && !has_out {
                // Hybrid can lean on keywords, but needs at least one
                // directional column to anchor geometry (single signed
                // amount columns map to money-in).
                return Err(
                    "hybrid needs at least one directional column or default threshold".to_string(),
                );
            }
        }
    }

    Ok(())
}
