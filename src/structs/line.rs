/// Maps a byte range of a line's text to the x-extent it was rendered at.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Byte offset into `Line::text` where this run starts
    pub start: usize,
    /// Byte offset into `Line::text` where this run ends (exclusive)
    pub end: usize,
    /// Left edge of the run
    pub x1: f32,
    /// Right edge of the run
    pub x2: f32,
}

/// One reconstructed line of statement text.
///
/// The text carries explicit spacing between tokens; `runs` is the parallel
/// map from byte ranges back to page x-extents, which is what column
/// classification works from. Invariants: runs are ordered left to right
/// and never overlap, and no two lines share a y-band on the same page.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub runs: Vec<Run>,
    pub page: usize,
    pub y: f32,
    /// Running line index across the whole statement, for audit trails
    pub index: usize,
}

impl Line {
    /// Interpolated x-coordinate of the right edge of text ending at byte
    /// position `end`.
    ///
    /// Positions inside a run are interpolated proportionally; positions in
    /// the whitespace between runs resolve to the previous run's right
    /// edge. Amounts are right-aligned in their columns, so this is the
    /// canonical coordinate for classification.
    pub fn right_edge_at(&self, end: usize) -> f32 {
        let mut last_x2 = self.runs.first().map(|r| r.x1).unwrap_or(0.0);
        for run in &self.runs {
            if end <= run.start {
                return last_x2;
            }
            if end <= run.end {
                let span = (run.end - run.start) as f32;
                if span <= 0.0 {
                    return run.x2;
                }
                let frac = (end - run.start) as f32 / span;
                return run.x1 + (run.x2 - run.x1) * frac;
            }
            last_x2 = run.x2;
        }
        last_x2
    }

    /// True when the line carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Split off the remainder of the line starting at byte `offset`,
    /// preserving the geometry of the surviving runs.
    ///
    /// Used when a leading fragment of a line (a year digit, a date) has
    /// been consumed and the trailing text must be re-queued for
    /// reclassification. `offset` must lie on a char boundary.
    pub fn slice_from(&self, offset: usize) -> Line {
        let text = self.text[offset..].to_string();
        let mut runs = Vec::new();
        for run in &self.runs {
            if run.end <= offset {
                continue;
            }
            if run.start >= offset {
                runs.push(Run {
                    start: run.start - offset,
                    end: run.end - offset,
                    x1: run.x1,
                    x2: run.x2,
                });
            } else {
                // Run straddles the cut: interpolate a new left edge
                let span = (run.end - run.start) as f32;
                let frac = if span > 0.0 {
                    (offset - run.start) as f32 / span
                } else {
                    0.0
                };
                runs.push(Run {
                    start: 0,
                    end: run.end - offset,
                    x1: run.x1 + (run.x2 - run.x1) * frac,
                    x2: run.x2,
                });
            }
        }
        Line {
            text,
            runs,
            page: self.page,
            y: self.y,
            index: self.index,
        }
    }
}
