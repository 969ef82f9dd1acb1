use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::configs::BankProfile;
use crate::structs::Line;

/// Monetary values: `-?\d{1,3}(,\d{3})*\.\d{2}`, i.e. optional sign,
/// comma-grouped thousands, exactly two fractional digits.
static MONEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d{1,3}(?:,\d{3})*\.\d{2}").unwrap());

/// Conversion-rate annotations ("rate: 1.268.") are FX meta, never
/// amounts.
static FX_RATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\brate:\s*\d").unwrap());

/// A monetary value found on a line, keyed by the x-coordinate of its
/// rightmost digit. Amounts are right-aligned in their columns, so the
/// right edge (never the start) is what column classification uses.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountHit {
    pub value: Decimal,
    pub right_edge: f32,
    pub start: usize,
    pub end: usize,
}

/// Extracts GBP ledger amounts from a line, filtering foreign-currency
/// annotations first.
pub struct AmountExtractor {
    /// Matches `Amount: <CUR> <num>` regions for the profile's foreign
    /// currency codes; those numbers must never surface as ledger values.
    fx_pattern: Option<Regex>,
}

impl AmountExtractor {
    pub fn new(profile: &BankProfile) -> Self {
        let fx_pattern = if profile.fx_markers.is_empty() {
            None
        } else {
            let codes = profile.fx_markers.join("|");
            // Codes are validated as [A-Z]{3} at profile load
            Regex::new(&format!(
                r"Amount:\s*(?:{})\s*-?\d[\d,]*(?:\.\d+)?",
                codes
            ))
            .ok()
        };
        AmountExtractor { fx_pattern }
    }

    /// True when the line is a foreign-currency annotation (an
    /// `Amount: <CUR>` marker or a conversion rate). Such lines join the
    /// description verbatim and contribute no amounts.
    pub fn is_fx_meta(&self, text: &str) -> bool {
        if FX_RATE.is_match(text) {
            return true;
        }
        match &self.fx_pattern {
            Some(pattern) => pattern.is_match(text),
            None => false,
        }
    }

    /// Every ledger amount on the line with its right-edge x-coordinate,
    /// left to right.
    pub fn extract(&self, line: &Line) -> Vec<AmountHit> {
        let scratch = self.blank_fx_regions(&line.text);
        let mut hits = Vec::new();
        for m in MONEY.find_iter(&scratch) {
            if !has_clean_boundaries(scratch.as_bytes(), m.start(), m.end()) {
                continue;
            }
            let cleaned: String = m.as_str().chars().filter(|c| *c != ',').collect();
            if let Ok(value) = cleaned.parse::<Decimal>() {
                hits.push(AmountHit {
                    value,
                    right_edge: line.right_edge_at(m.end()),
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
        hits
    }

    /// Overwrite FX-annotated regions with spaces so their numbers cannot
    /// match, while keeping every byte offset aligned with the original
    /// text (the run map depends on it).
    fn blank_fx_regions(&self, text: &str) -> String {
        let Some(pattern) = &self.fx_pattern else {
            return text.to_string();
        };
        let mut bytes = text.as_bytes().to_vec();
        for m in pattern.find_iter(text) {
            for b in &mut bytes[m.start()..m.end()] {
                if b.is_ascii() {
                    *b = b' ';
                }
            }
        }
        String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
    }
}

/// Reject matches embedded in longer digit runs ("1234.56" must not yield
/// "234.56", "1.268" must not yield "1.26").
fn has_clean_boundaries(bytes: &[u8], start: usize, end: usize) -> bool {
    if start > 0 {
        let prev = bytes[start - 1];
        if prev.is_ascii_digit() || prev == b',' || prev == b'.' {
            return false;
        }
    }
    if end < bytes.len() && bytes[end].is_ascii_digit() {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Run;
    use rust_decimal_macros::dec;

    fn line(text: &str) -> Line {
        // One run per whitespace-separated word, 6pt per byte
        let mut runs = Vec::new();
        let mut offset = 0usize;
        for word in text.split(' ') {
            if !word.is_empty() {
                runs.push(Run {
                    start: offset,
                    end: offset + word.len(),
                    x1: offset as f32 * 6.0,
                    x2: (offset + word.len()) as f32 * 6.0,
                });
            }
            offset += word.len() + 1;
        }
        Line {
            text: text.to_string(),
            runs,
            page: 0,
            y: 0.0,
            index: 0,
        }
    }

    fn extractor_with_markers(markers: &[&str]) -> AmountExtractor {
        let mut profile = BankProfile::default();
        profile.fx_markers = markers.iter().map(|s| s.to_string()).collect();
        AmountExtractor::new(&profile)
    }

    #[test]
    fn test_extracts_amounts_with_right_edges() {
        let extractor = AmountExtractor::new(&BankProfile::default());
        let l = line("Merchant -30.00 10.39");
        let hits = extractor.extract(&l);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].value, dec!(-30.00));
        assert_eq!(hits[1].value, dec!(10.39));
        assert!(hits[1].right_edge > hits[0].right_edge);
        // Right edge is the end of the matched text
        assert_eq!(hits[1].right_edge, l.right_edge_at(hits[1].end));
    }

    #[test]
    fn test_thousands_groups() {
        let extractor = AmountExtractor::new(&BankProfile::default());
        let hits = extractor.extract(&line("Salary 12,345.67"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, dec!(12345.67));
    }

    #[test]
    fn test_embedded_digit_runs_rejected() {
        let extractor = AmountExtractor::new(&BankProfile::default());
        // Reference numbers and conversion rates must not shed amounts
        assert!(extractor.extract(&line("Ref 1234.56")).is_empty());
        assert!(extractor.extract(&line("rate 1.268")).is_empty());
    }

    #[test]
    fn test_fx_amounts_are_blanked() {
        let extractor = extractor_with_markers(&["USD", "EUR"]);
        let hits = extractor.extract(&line("Amount: USD -38.04. Conversion 10.39"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, dec!(10.39));
    }

    #[test]
    fn test_fx_blanking_preserves_offsets() {
        let extractor = extractor_with_markers(&["USD"]);
        let l = line("Amount: USD -38.04 then 10.39");
        let hits = extractor.extract(&l);
        assert_eq!(hits.len(), 1);
        assert_eq!(&l.text[hits[0].start..hits[0].end], "10.39");
    }

    #[test]
    fn test_unlisted_currency_is_not_blanked() {
        let extractor = extractor_with_markers(&["USD"]);
        let hits = extractor.extract(&line("Amount: JPY 120.00"));
        // JPY is not in the profile's marker list, so this reads as a
        // ledger amount
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, dec!(120.00));
    }

    #[test]
    fn test_fx_meta_detection() {
        let extractor = extractor_with_markers(&["USD"]);
        assert!(extractor.is_fx_meta("Amount: USD -38.04. Conversion"));
        assert!(extractor.is_fx_meta("rate: 1.268."));
        assert!(!extractor.is_fx_meta("Card payment 10.00"));

        let no_markers = AmountExtractor::new(&BankProfile::default());
        assert!(!no_markers.is_fx_meta("Amount: USD -38.04"));
        assert!(no_markers.is_fx_meta("rate: 1.268."));
    }

    #[test]
    fn test_no_amounts_on_plain_description() {
        let extractor = AmountExtractor::new(&BankProfile::default());
        assert!(extractor.extract(&line("Kashia*Nyasa KEN")).is_empty());
    }
}
