use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

// Day groups tolerate ordinal suffixes so offsets stay aligned with the
// original text.
static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]{3,9})\s+(\d{4})\b").unwrap()
});
static DAY_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]{3,9})\b").unwrap());
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{3,9})\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b").unwrap()
});
static SLASH_DMY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static SLASH_DMY_SHORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})\b").unwrap());
/// A slash date whose year was cut after three digits at the end of a
/// line; the final digit arrives on a later line.
static SLASH_SPLIT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{3})\s*$").unwrap());

/// A printed statement period such as "9 Jan 2024 - 7 Feb 2024".
static PERIOD_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{1,2}(?:st|nd|rd|th)?\s+[A-Za-z]{3,9}\s+\d{4})\s*(?:-|\x{2013}|\x{2014}|to|until)\s*(\d{1,2}(?:st|nd|rd|th)?\s+[A-Za-z]{3,9}\s+\d{4})",
    )
    .unwrap()
});

/// Date layouts a profile can enable, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// "9 Jan 2024", "9th Jan 2024"
    DayMonthYear,
    /// "9 Jan", "9th Jan" (year inferred from the statement period)
    DayMonth,
    /// "Jan 9, 2024"
    MonthDayYear,
    /// "08/08/2024" (also enables split-year handling)
    SlashDmy,
    /// "08/08/24"
    SlashDmyShort,
}

impl DateFormat {
    /// Resolve a profile format name. Unknown names are rejected at
    /// profile validation.
    pub fn from_name(name: &str) -> Option<DateFormat> {
        match name.trim() {
            "DD MMM YYYY" => Some(DateFormat::DayMonthYear),
            "DD MMM" => Some(DateFormat::DayMonth),
            "MMM DD YYYY" => Some(DateFormat::MonthDayYear),
            "DD/MM/YYYY" => Some(DateFormat::SlashDmy),
            "DD/MM/YY" => Some(DateFormat::SlashDmyShort),
            _ => None,
        }
    }
}

fn parse_month(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lower = name.to_lowercase();
    MONTHS.iter().position(|m| {
        *m == lower || (lower.len() == 3 && m.starts_with(&lower))
    }).map(|i| i as u32 + 1)
}

/// Result of offering a line to the date engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateMatch {
    /// A complete date; `end` is the byte offset just past the date text.
    Full {
        date: NaiveDate,
        end: usize,
        /// The year was inferred across a year boundary or outside the
        /// statement period
        cross_year: bool,
    },
    /// A split-year date holding everything but its final year digit.
    Partial { end: usize },
    None,
}

/// Parses transaction dates and infers missing years from the statement
/// period.
///
/// State is per parse: the engine remembers the most recent date and any
/// pending split-year fragment, and resets at period boundaries.
#[derive(Debug, Clone)]
pub struct DateEngine {
    formats: Vec<DateFormat>,
    period_start: Option<NaiveDate>,
    period_end: Option<NaiveDate>,
    current_date: Option<NaiveDate>,
    /// (day, month, three leading year digits) awaiting the final digit
    partial: Option<(u32, u32, String)>,
}

impl DateEngine {
    pub fn new(format_names: &[String]) -> Self {
        let formats = format_names
            .iter()
            .filter_map(|n| DateFormat::from_name(n))
            .collect();
        DateEngine {
            formats,
            period_start: None,
            period_end: None,
            current_date: None,
            partial: None,
        }
    }

    pub fn set_period(&mut self, start: NaiveDate, end: NaiveDate) {
        self.period_start = Some(start);
        self.period_end = Some(end);
    }

    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.period_start.zip(self.period_end)
    }

    pub fn current_date(&self) -> Option<NaiveDate> {
        self.current_date
    }

    pub fn pending_year_digit(&self) -> bool {
        self.partial.is_some()
    }

    /// Reset per-period state at a period boundary; the statement period
    /// itself is retained.
    pub fn reset(&mut self) {
        self.current_date = None;
        self.partial = None;
    }

    /// Try to read a statement-period range off a header line.
    pub fn try_capture_period(&mut self, text: &str) -> bool {
        if self.period_start.is_some() {
            return false;
        }
        if let Some(caps) = PERIOD_RANGE.captures(text) {
            let start = parse_full_dmy(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
            let end = parse_full_dmy(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            if let (Some(start), Some(end)) = (start, end) {
                if start <= end {
                    self.period_start = Some(start);
                    self.period_end = Some(end);
                    return true;
                }
            }
        }
        false
    }

    /// Try each enabled format against the start of `text`.
    ///
    /// Formats are tried most-specific first regardless of profile order,
    /// so "9 Jan 2024" can never half-match as "9 Jan". A full match
    /// always replaces any pending split-year fragment: a new date wins
    /// over state completion.
    pub fn match_date(&mut self, text: &str) -> DateMatch {
        let trimmed = text.trim_start();
        let lead = text.len() - trimmed.len();

        for format in Self::trial_order() {
            if !self.formats.contains(&format) {
                continue;
            }
            match format {
                DateFormat::DayMonthYear => {
                    if let Some(caps) = DAY_MONTH_YEAR.captures(trimmed) {
                        let day: u32 = caps[1].parse().unwrap_or(0);
                        let month = parse_month(&caps[2]);
                        let year: i32 = caps[3].parse().unwrap_or(0);
                        if let Some(month) = month {
                            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                                return self.accept_full(date, lead + caps[0].len(), false);
                            }
                        }
                    }
                }
                DateFormat::MonthDayYear => {
                    if let Some(caps) = MONTH_DAY_YEAR.captures(trimmed) {
                        let month = parse_month(&caps[1]);
                        let day: u32 = caps[2].parse().unwrap_or(0);
                        let year: i32 = caps[3].parse().unwrap_or(0);
                        if let Some(month) = month {
                            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                                return self.accept_full(date, lead + caps[0].len(), false);
                            }
                        }
                    }
                }
                DateFormat::SlashDmy => {
                    if let Some(caps) = SLASH_DMY.captures(trimmed) {
                        let day: u32 = caps[1].parse().unwrap_or(0);
                        let month: u32 = caps[2].parse().unwrap_or(0);
                        let year: i32 = caps[3].parse().unwrap_or(0);
                        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                            return self.accept_full(date, lead + caps[0].len(), false);
                        }
                    }
                    // Split-year form: "08/08/202" at end of line
                    if let Some(caps) = SLASH_SPLIT_YEAR.captures(trimmed) {
                        let day: u32 = caps[1].parse().unwrap_or(0);
                        let month: u32 = caps[2].parse().unwrap_or(0);
                        if (1..=31).contains(&day) && (1..=12).contains(&month) {
                            self.partial = Some((day, month, caps[3].to_string()));
                            return DateMatch::Partial {
                                end: lead + caps[0].len(),
                            };
                        }
                    }
                }
                DateFormat::SlashDmyShort => {
                    if let Some(caps) = SLASH_DMY_SHORT.captures(trimmed) {
                        let day: u32 = caps[1].parse().unwrap_or(0);
                        let month: u32 = caps[2].parse().unwrap_or(0);
                        let year: i32 = 2000 + caps[3].parse::<i32>().unwrap_or(0);
                        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                            return self.accept_full(date, lead + caps[0].len(), false);
                        }
                    }
                }
                DateFormat::DayMonth => {
                    if let Some(caps) = DAY_MONTH.captures(trimmed) {
                        let day: u32 = caps[1].parse().unwrap_or(0);
                        if let Some(month) = parse_month(&caps[2]) {
                            if let Some((date, cross_year)) = self.infer_year(day, month) {
                                return self.accept_full(date, lead + caps[0].len(), cross_year);
                            }
                        }
                    }
                }
            }
        }
        DateMatch::None
    }

    /// Consume the leading digit of `text` to complete a pending
    /// split-year date.
    ///
    /// The digit must be followed by whitespace or end-of-line so an
    /// amount such as "10.39" can never be mistaken for a year digit.
    /// Returns the completed date and the byte offset just past the
    /// consumed digit.
    pub fn complete_year(&mut self, text: &str) -> Option<(NaiveDate, usize)> {
        let (day, month, prefix) = self.partial.clone()?;
        let trimmed = text.trim_start();
        let lead = text.len() - trimmed.len();
        let mut chars = trimmed.chars();
        let digit = chars.next()?;
        if !digit.is_ascii_digit() {
            return None;
        }
        if let Some(next) = chars.next() {
            if !next.is_whitespace() {
                return None;
            }
        }
        let year: i32 = format!("{}{}", prefix, digit).parse().ok()?;
        self.partial = None;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        self.current_date = Some(date);
        Some((date, lead + digit.len_utf8()))
    }

    /// Drop a pending split-year fragment (state reset, new period).
    pub fn abandon_partial(&mut self) {
        self.partial = None;
    }

    fn accept_full(&mut self, date: NaiveDate, end: usize, cross_year: bool) -> DateMatch {
        // A complete date always wins over a pending year digit
        self.partial = None;
        self.current_date = Some(date);
        DateMatch::Full {
            date,
            end,
            cross_year,
        }
    }

    /// Pick a year for a day/month with none printed.
    ///
    /// Tries the period's start and end years looking for a date inside
    /// the period; Nov/Dec rows in a Jan/Feb-starting period roll back one
    /// year; Feb 29 adopts a valid period year silently; anything else
    /// falls back to the period-start year with a cross-year warning.
    fn infer_year(&self, day: u32, month: u32) -> Option<(NaiveDate, bool)> {
        if let (Some(start), Some(end)) = (self.period_start, self.period_end) {
            let mut years = vec![start.year()];
            if end.year() != start.year() {
                years.push(end.year());
            }
            for year in years {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    if date >= start && date <= end {
                        return Some((date, false));
                    }
                }
            }
            if start.month() <= 2 && (month == 11 || month == 12) {
                if let Some(date) = NaiveDate::from_ymd_opt(start.year() - 1, month, day) {
                    return Some((date, true));
                }
            }
            if month == 2 && day == 29 {
                if let Some(date) = NaiveDate::from_ymd_opt(start.year(), month, day) {
                    return Some((date, false));
                }
                if let Some(date) = NaiveDate::from_ymd_opt(end.year(), month, day) {
                    return Some((date, false));
                }
            }
            if let Some(date) = NaiveDate::from_ymd_opt(start.year(), month, day) {
                return Some((date, true));
            }
            return NaiveDate::from_ymd_opt(end.year(), month, day).map(|d| (d, true));
        }

        // No period known: stay in the current date's year
        if let Some(current) = self.current_date {
            if let Some(date) = NaiveDate::from_ymd_opt(current.year(), month, day) {
                return Some((date, false));
            }
        }
        None
    }

    fn trial_order() -> [DateFormat; 5] {
        [
            DateFormat::DayMonthYear,
            DateFormat::MonthDayYear,
            DateFormat::SlashDmy,
            DateFormat::SlashDmyShort,
            DateFormat::DayMonth,
        ]
    }
}

static DATE_LED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,2}[/-]\d{1,2}[/-]\d{1,4}\b").unwrap());

/// True when a line opens with something shaped like a numeric date.
///
/// Used to warn about date-led lines no configured format accepted
/// ("99/99/2024"); such lines are then treated as non-dates and parsing
/// continues.
pub fn looks_date_led(text: &str) -> bool {
    DATE_LED.is_match(text)
}

/// Parse a "9 Jan 2024"-style date outside engine state (period ranges).
fn parse_full_dmy(text: &str) -> Option<NaiveDate> {
    let caps = DAY_MONTH_YEAR.captures(text.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month = parse_month(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
