//! Uniform grid broad phase
//!
//! Buckets body AABBs into square cells keyed by `floor(x / cell_size)`.
//! Queries return every body sharing a cell with the query region: false
//! positives are expected, false negatives never happen. The grid is rebuilt
//! from scratch every step.

use std::collections::HashMap;

use super::geom::Rect;

/// Lower bound on the auto-derived cell size
const MIN_CELL_SIZE: f32 = 1.0;
/// Cap on the cells a single AABB may cover; anything larger goes to the
/// oversized list
const MAX_CELLS_PER_BODY: i64 = 4096;

type CellKey = (i32, i32);

/// Spatial hash grid over dense body indices
#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    /// Fixed cell size; `None` derives it from the bodies on every rebuild
    configured: Option<f32>,
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    /// Bodies too large to bucket sensibly; returned by every query
    oversized: Vec<usize>,
    len: usize,
}

impl SpatialGrid {
    /// `cell_size` of `None` (or a non-positive value) means auto-size
    pub fn new(cell_size: Option<f32>) -> Self {
        let configured = cell_size.filter(|s| s.is_finite() && *s > 0.0);
        Self {
            configured,
            cell_size: configured.unwrap_or(64.0),
            cells: HashMap::new(),
            oversized: Vec::new(),
            len: 0,
        }
    }

    /// Current cell size
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of bodies inserted by the last rebuild
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        self.len = 0;
    }

    /// Clear and insert `(index, aabb)` for every entry
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (usize, Rect)>,
    {
        let entries: Vec<(usize, Rect)> = entries.into_iter().collect();
        self.clear();

        if self.configured.is_none() {
            self.cell_size = auto_cell_size(entries.iter().map(|(_, r)| r));
        }

        for (index, rect) in entries {
            self.insert(index, rect);
        }
    }

    /// Insert one body
    pub fn insert(&mut self, index: usize, rect: Rect) {
        self.len += 1;
        match self.cell_range(&rect) {
            Some((x0, y0, x1, y1)) => {
                for cy in y0..=y1 {
                    for cx in x0..=x1 {
                        self.cells.entry((cx, cy)).or_default().push(index);
                    }
                }
            }
            None => self.oversized.push(index),
        }
    }

    /// Candidate indices for `rect`, ascending and de-duplicated
    pub fn query(&self, rect: &Rect) -> Vec<usize> {
        let mut out = Vec::new();
        self.query_into(rect, &mut out);
        out
    }

    /// `query` into a reusable buffer (cleared first)
    pub fn query_into(&self, rect: &Rect, out: &mut Vec<usize>) {
        out.clear();
        out.extend_from_slice(&self.oversized);

        match self.cell_range(rect) {
            Some((x0, y0, x1, y1)) => {
                for cy in y0..=y1 {
                    for cx in x0..=x1 {
                        if let Some(bucket) = self.cells.get(&(cx, cy)) {
                            out.extend_from_slice(bucket);
                        }
                    }
                }
            }
            None => {
                // Query region too large to walk; every bucketed body is a candidate
                for bucket in self.cells.values() {
                    out.extend_from_slice(bucket);
                }
            }
        }

        out.sort_unstable();
        out.dedup();
    }

    /// Inclusive cell range covered by `rect`, or `None` if it spans too many
    fn cell_range(&self, rect: &Rect) -> Option<(i32, i32, i32, i32)> {
        if !rect.x.is_finite() || !rect.y.is_finite() {
            return None;
        }
        let inv = 1.0 / self.cell_size;
        let x0 = (rect.left() * inv).floor() as i64;
        let y0 = (rect.top() * inv).floor() as i64;
        let x1 = (rect.right() * inv).floor() as i64;
        let y1 = (rect.bottom() * inv).floor() as i64;

        let covered = (x1 - x0 + 1).saturating_mul(y1 - y0 + 1);
        if covered > MAX_CELLS_PER_BODY {
            return None;
        }
        let fits = |v: i64| v >= i32::MIN as i64 && v <= i32::MAX as i64;
        if !(fits(x0) && fits(y0) && fits(x1) && fits(y1)) {
            return None;
        }
        Some((x0 as i32, y0 as i32, x1 as i32, y1 as i32))
    }
}

/// Mean of each body's larger extent
fn auto_cell_size<'a>(rects: impl Iterator<Item = &'a Rect>) -> f32 {
    let (sum, count) = rects
        .filter(|r| r.is_valid())
        .fold((0.0f64, 0u32), |(sum, n), r| {
            (sum + r.width.max(r.height) as f64, n + 1)
        });
    if count == 0 {
        return 64.0;
    }
    ((sum / count as f64) as f32).max(MIN_CELL_SIZE)
}
