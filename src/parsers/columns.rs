use log::debug;

use crate::configs::{ColumnRole, ColumnSpec, ColumnThresholds};
use crate::structs::Line;

/// Right edges of the recognized amount columns on the current page.
///
/// Lifetime is per page: a fresh header re-anchors the model, a page
/// without one inherits the previous page's model, and before any header
/// the profile's default thresholds apply. Keeping the model current per
/// page matters because many statements reflow the same header with
/// different margins from one page to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnModel {
    pub money_in_right: Option<f32>,
    pub money_out_right: Option<f32>,
    pub balance_right: Option<f32>,
    pub header_y: Option<f32>,
    pub header_page: Option<usize>,
}

impl ColumnModel {
    /// Model seeded from profile defaults, used until a header is seen.
    pub fn from_thresholds(thresholds: &ColumnThresholds) -> Self {
        ColumnModel {
            money_in_right: thresholds.money_in,
            money_out_right: thresholds.money_out,
            balance_right: thresholds.balance,
            header_y: None,
            header_page: None,
        }
    }

    /// True when the model knows where a balance column ends.
    pub fn expects_balance(&self) -> bool {
        self.balance_right.is_some()
    }

    /// True when no column position is known at all.
    pub fn is_empty(&self) -> bool {
        self.money_in_right.is_none()
            && self.money_out_right.is_none()
            && self.balance_right.is_none()
    }

    /// Try to read `line` as a column header.
    ///
    /// A header must name at least two distinct column roles. On match the
    /// right edge of each named column is recorded and the model re-anchors
    /// to this page; roles the header does not name keep their previous
    /// edges. Returns true when the line was consumed as a header.
    pub fn try_update_from_header(&mut self, line: &Line, specs: &[ColumnSpec]) -> bool {
        // Longest names first so "Balance (GBP)" wins over "Balance".
        let mut ordered: Vec<&ColumnSpec> = specs.iter().collect();
        ordered.sort_by(|a, b| b.name.len().cmp(&a.name.len()).then(a.name.cmp(&b.name)));

        let haystack = line.text.to_lowercase();
        let mut found: [(Option<f32>, bool); 3] = [(None, false); 3];

        for spec in ordered {
            let slot = match spec.role {
                ColumnRole::MoneyOut => 0,
                ColumnRole::MoneyIn => 1,
                ColumnRole::Balance => 2,
            };
            if found[slot].1 {
                continue;
            }
            let needle = spec.name.to_lowercase();
            if needle.is_empty() {
                continue;
            }
            if let Some(pos) = haystack.find(&needle) {
                let right = line.right_edge_at(pos + needle.len());
                found[slot] = (Some(right), true);
            }
        }

        let matched_roles = found.iter().filter(|(_, hit)| *hit).count();
        if matched_roles < 2 {
            return false;
        }

        if let (Some(right), true) = found[0] {
            self.money_out_right = Some(right);
        }
        if let (Some(right), true) = found[1] {
            self.money_in_right = Some(right);
        }
        if let (Some(right), true) = found[2] {
            self.balance_right = Some(right);
        }
        self.header_y = Some(line.y);
        self.header_page = Some(line.page);
        debug!(
            "column header on page {}: out={:?} in={:?} balance={:?}",
            line.page, self.money_out_right, self.money_in_right, self.balance_right
        );
        true
    }

    /// Assign a column to an amount by the x-coordinate of its right edge.
    ///
    /// Columns are ordered by their right edges; the boundary between two
    /// adjacent columns is the midpoint of their edges and comparisons are
    /// inclusive on the left column. Falls back to the balance column when
    /// nothing is known.
    pub fn classify_x(&self, x: f32) -> ColumnRole {
        let mut known: Vec<(ColumnRole, f32)> = Vec::with_capacity(3);
        if let Some(edge) = self.money_out_right {
            known.push((ColumnRole::MoneyOut, edge));
        }
        if let Some(edge) = self.money_in_right {
            known.push((ColumnRole::MoneyIn, edge));
        }
        if let Some(edge) = self.balance_right {
            known.push((ColumnRole::Balance, edge));
        }
        if known.is_empty() {
            return ColumnRole::Balance;
        }
        known.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        for pair in known.windows(2) {
            let threshold = (pair[0].1 + pair[1].1) / 2.0;
            if x <= threshold {
                return pair[0].0;
            }
        }
        known[known.len() - 1].0
    }
}
