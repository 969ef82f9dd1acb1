use log::debug;

use crate::structs::{Line, Run, Token, Warning};

/// Fallback glyph width when a line carries no measurable text.
const FALLBACK_CHAR_WIDTH: f32 = 5.0;

/// Groups a page-ordered token sequence into reconstructed lines.
///
/// Two tokens share a line iff their y-coordinates differ by at most the
/// profile's `y_tolerance`. Within a line tokens sort left to right and
/// the gap between neighbours is rendered as `max(1, round(gap / avg
/// char width))` spaces, so column whitespace survives into the text.
pub struct LineReconstructor {
    y_tolerance: f32,
}

impl LineReconstructor {
    pub fn new(y_tolerance: f32) -> Self {
        LineReconstructor { y_tolerance }
    }

    /// Build ordered lines from ordered tokens.
    ///
    /// Tokens with unusable coordinates are dropped with a warning; this
    /// is never fatal. Minor y-jitter within a page is normalized by a
    /// stable sort before banding.
    pub fn reconstruct(&self, tokens: Vec<Token>, warnings: &mut Vec<Warning>) -> Vec<Line> {
        let mut usable: Vec<Token> = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token.has_valid_coords() {
                usable.push(token);
            } else {
                debug!(
                    "dropping token '{}' on page {}: invalid coordinates",
                    token.text, token.page
                );
                warnings.push(Warning::TokenDropped {
                    page: token.page,
                    text: token.text,
                });
            }
        }

        // Normalize within-page jitter; page order was validated upstream.
        usable.sort_by(|a, b| {
            a.page
                .cmp(&b.page)
                .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut lines: Vec<Line> = Vec::new();
        let mut band: Vec<Token> = Vec::new();
        let mut band_y = 0.0f32;
        let mut band_page = 0usize;

        for token in usable {
            let starts_new_band = band.is_empty()
                || token.page != band_page
                || (token.y - band_y).abs() > self.y_tolerance;
            if starts_new_band {
                if !band.is_empty() {
                    let index = lines.len();
                    lines.push(assemble_line(std::mem::take(&mut band), band_page, band_y, index));
                }
                band_y = token.y;
                band_page = token.page;
            }
            band.push(token);
        }
        if !band.is_empty() {
            let index = lines.len();
            lines.push(assemble_line(band, band_page, band_y, index));
        }
        lines
    }
}

/// Join one y-band of tokens into a line with reconstructed spacing and a
/// run map.
fn assemble_line(mut band: Vec<Token>, page: usize, y: f32, index: usize) -> Line {
    band.sort_by(|a, b| a.x1.partial_cmp(&b.x1).unwrap_or(std::cmp::Ordering::Equal));

    let char_width = average_char_width(&band);
    let mut text = String::new();
    let mut runs = Vec::with_capacity(band.len());
    let mut prev_x2: Option<f32> = None;

    for token in band {
        if let Some(prev) = prev_x2 {
            let gap = token.x1 - prev;
            let spaces = if gap > 0.0 {
                ((gap / char_width).round() as usize).max(1)
            } else {
                1
            };
            text.push_str(&" ".repeat(spaces));
        }
        let start = text.len();
        text.push_str(&token.text);
        runs.push(Run {
            start,
            end: text.len(),
            x1: token.x1,
            x2: token.x2,
        });
        prev_x2 = Some(token.x2);
    }

    Line {
        text,
        runs,
        page,
        y,
        index,
    }
}

fn average_char_width(band: &[Token]) -> f32 {
    let mut width = 0.0f32;
    let mut chars = 0usize;
    for token in band {
        let n = token.text.chars().count();
        if n > 0 && token.width() > 0.0 {
            width += token.width();
            chars += n;
        }
    }
    if chars == 0 {
        FALLBACK_CHAR_WIDTH
    } else {
        width / chars as f32
    }
}
