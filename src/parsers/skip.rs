use once_cell::sync::Lazy;
use regex::Regex;

use crate::configs::BankProfile;
use crate::structs::Line;

/// Universal noise: layout furniture and regulatory text that appears on
/// statements regardless of bank. Deliberately a small hand-picked set;
/// anything bank-specific belongs in the profile's `skip_patterns` so one
/// bank's noise cannot swallow another bank's data.
static UNIVERSAL_SKIP: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^\s*page \d+(\s*of\s*\d+)?\s*$",
        r"(?i)financial services compensation scheme",
        r"(?i)\bfscs\b",
        r"(?i)prudential regulation authority",
        r"(?i)financial conduct authority",
        r"(?i)registered (office|in england)",
        r"(?i)^\s*(sort code|account number|iban|bic|swift)\b",
        r"(?i)^\s*statement\s+(number|date|period)\b",
        r"(?i)^\s*total (money|paid) (in|out)\b",
        r"(?i)^\s*(continued overleaf|continued on next page|continued\.\.\.)\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TOTAL_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*total (money|paid) in\b").unwrap());
static TOTAL_OUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*total (money|paid) out\b").unwrap());

/// A summary row worth capturing into period metadata before it is
/// skipped as a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    TotalIn,
    TotalOut,
}

/// Recognize printed period-total rows. Callers capture the amount first;
/// the line is still skipped as a transaction afterwards.
pub fn summary_kind(text: &str) -> Option<SummaryKind> {
    if TOTAL_IN.is_match(text) {
        return Some(SummaryKind::TotalIn);
    }
    if TOTAL_OUT.is_match(text) {
        return Some(SummaryKind::TotalOut);
    }
    None
}

/// True when the line is noise: blank, universally noisy, or matching a
/// per-bank skip pattern.
pub fn is_noise(line: &Line, profile: &BankProfile) -> bool {
    if line.is_blank() {
        return true;
    }
    let text = line.text.trim();
    if UNIVERSAL_SKIP.iter().any(|p| p.is_match(text)) {
        return true;
    }
    profile.skip_patterns.iter().any(|p| p.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::from_json_str;
    use crate::structs::Run;

    fn line(text: &str) -> Line {
        Line {
            text: text.to_string(),
            runs: vec![Run {
                start: 0,
                end: text.len(),
                x1: 10.0,
                x2: 10.0 + text.len() as f32 * 5.0,
            }],
            page: 0,
            y: 0.0,
            index: 0,
        }
    }

    #[test]
    fn test_universal_noise() {
        let profile = BankProfile::default();
        assert!(is_noise(&line("Page 2 of 5"), &profile));
        assert!(is_noise(&line(""), &profile));
        assert!(is_noise(&line("   "), &profile));
        assert!(is_noise(
            &line("Your eligible deposits are covered by the Financial Services Compensation Scheme."),
            &profile
        ));
        assert!(is_noise(&line("Sort Code 01-02-03"), &profile));
        assert!(is_noise(&line("Total money in 1,250.00"), &profile));
    }

    #[test]
    fn test_transaction_lines_pass() {
        let profile = BankProfile::default();
        assert!(!is_noise(&line("08/08/2024 Merchant X 30.00 10.39"), &profile));
        assert!(!is_noise(&line("Balance brought forward 1,000.00"), &profile));
        assert!(!is_noise(&line("Card transaction at Tesco"), &profile));
    }

    #[test]
    fn test_profile_patterns_apply_after_universal() {
        let profile = from_json_str(
            r#"{ "key": "x", "skip_patterns": ["(?i)^your account summary"] }"#,
        )
        .unwrap();
        assert!(is_noise(&line("Your account summary"), &profile));
        assert!(!is_noise(
            &line("Your account summary"),
            &BankProfile::default()
        ));
    }

    #[test]
    fn test_summary_rows_are_recognized_and_skipped() {
        assert_eq!(summary_kind("Total money in 1,250.00"), Some(SummaryKind::TotalIn));
        assert_eq!(summary_kind("Total paid out 980.17"), Some(SummaryKind::TotalOut));
        assert_eq!(summary_kind("Total balance 10.00"), None);
        assert_eq!(summary_kind("Card payment"), None);
    }
}
