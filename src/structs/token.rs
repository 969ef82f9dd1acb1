/// A positioned text fragment from one page of a statement.
///
/// Tokens are ordered by `(page, y, x1)`. Coordinates are in page points
/// with the origin at the top-left, so `y` grows downwards and `x2` is the
/// right edge of the rendered text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The text content of the token
    pub text: String,
    /// Zero-based page the token was rendered on
    pub page: usize,
    /// Left edge of the rendered text
    pub x1: f32,
    /// Right edge of the rendered text
    pub x2: f32,
    /// Baseline y-coordinate
    pub y: f32,
    /// Font size in points, when the extractor reports one
    pub font_size: Option<f32>,
    /// Fill color as reported by the extractor, when available
    pub color: Option<String>,
}

impl Token {
    /// Token constructor; font metadata defaults to absent.
    pub fn new(text: impl Into<String>, page: usize, x1: f32, x2: f32, y: f32) -> Self {
        Token {
            text: text.into(),
            page,
            x1,
            x2,
            y,
            font_size: None,
            color: None,
        }
    }

    /// Width of the token in page points.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// True when the coordinates can be used for layout work.
    pub fn has_valid_coords(&self) -> bool {
        self.x1.is_finite() && self.x2.is_finite() && self.y.is_finite() && self.x2 >= self.x1
    }
}

/// Abstract source of ordered tokens.
///
/// Implementations live outside the core (native text-layer readers, OCR
/// services). The contract: `(page, y, x1)` is monotonically non-decreasing
/// apart from y-jitter within the profile tolerance; `None` is terminal.
pub trait TokenStream {
    fn next_token(&mut self) -> Option<Token>;
}

/// TokenStream over an already-materialized vector of tokens.
pub struct VecTokenStream {
    tokens: std::vec::IntoIter<Token>,
}

impl VecTokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }
}

impl TokenStream for VecTokenStream {
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }
}

impl From<Vec<Token>> for VecTokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_width() {
        let t = Token::new("12.34", 0, 100.0, 125.0, 40.0);
        assert_eq!(t.width(), 25.0);
    }

    #[test]
    fn test_invalid_coords_detected() {
        let mut t = Token::new("x", 0, 10.0, 5.0, 40.0);
        assert!(!t.has_valid_coords());

        t.x2 = 15.0;
        assert!(t.has_valid_coords());

        t.y = f32::NAN;
        assert!(!t.has_valid_coords());
    }

    #[test]
    fn test_vec_token_stream_drains_in_order() {
        let tokens = vec![
            Token::new("a", 0, 0.0, 5.0, 10.0),
            Token::new("b", 0, 6.0, 11.0, 10.0),
        ];
        let mut stream = VecTokenStream::new(tokens);
        assert_eq!(stream.next_token().unwrap().text, "a");
        assert_eq!(stream.next_token().unwrap().text, "b");
        assert!(stream.next_token().is_none());
    }
}
