//! Uniform grid for sub-quadratic neighbour pairing
//!
//! With the cell size equal to the link distance, every pair closer than that
//! distance lands in the same or an adjacent cell. Only used for fields above
//! [`BRUTE_FORCE_LIMIT`](crate::consts::BRUTE_FORCE_LIMIT).

use glam::Vec2;

/// Forward half of the 8-neighbourhood, so each cell pair is visited once
const FORWARD_NEIGHBORS: [(isize, isize); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    /// Cell edge actually used by the current layout, never below `cell_size`
    cell: f32,
    origin: Vec2,
    cols: usize,
    rows: usize,
    /// Particle indices per cell, row-major
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cell: cell_size.max(f32::EPSILON),
            origin: Vec2::ZERO,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Re-bucket all positions. Cell storage is reused between frames.
    ///
    /// Cells per axis are capped at twice the square root of the particle
    /// count; a tiny cell size over a wide spread gets coarser cells instead.
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        if positions.is_empty() {
            self.cols = 0;
            self.rows = 0;
            return;
        }

        let (min, max) = positions.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        self.origin = min;

        let max_axis = 2 * (positions.len() as f32).sqrt().ceil().max(1.0) as usize;
        let extent = (max - min).max_element();
        self.cell = self.cell_size.max(extent / max_axis as f32);

        let span = (max - min) / self.cell;
        // `as` saturates, so NaN or infinite spans collapse to one cell
        self.cols = (span.x.floor() as usize).min(max_axis) + 1;
        self.rows = (span.y.floor() as usize).min(max_axis) + 1;

        let needed = self.cols.checked_mul(self.rows).unwrap_or(usize::MAX);
        if self.cells.len() < needed {
            self.cells.resize_with(needed, Vec::new);
        }

        for (i, p) in positions.iter().enumerate() {
            let (cx, cy) = self.cell_of(*p);
            let idx = self.index(cx, cy);
            self.cells[idx].push(i);
        }
    }

    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let rel = (p - self.origin) / self.cell;
        (
            (rel.x.max(0.0).floor() as usize).min(self.cols - 1),
            (rel.y.max(0.0).floor() as usize).min(self.rows - 1),
        )
    }

    #[inline]
    fn index(&self, cx: usize, cy: usize) -> usize {
        cy * self.cols + cx
    }

    /// Visit every unordered pair sharing or neighbouring a cell, exactly once.
    /// Pairs are reported as `(lower, higher)` index.
    pub fn for_each_candidate_pair(&self, mut f: impl FnMut(usize, usize)) {
        for cy in 0..self.rows {
            for cx in 0..self.cols {
                let here = &self.cells[self.index(cx, cy)];
                for (k, &a) in here.iter().enumerate() {
                    for &b in &here[k + 1..] {
                        f(a.min(b), a.max(b));
                    }
                }
                for (dx, dy) in FORWARD_NEIGHBORS {
                    let (Some(nx), Some(ny)) =
                        (cx.checked_add_signed(dx), cy.checked_add_signed(dy))
                    else {
                        continue;
                    };
                    if nx >= self.cols || ny >= self.rows {
                        continue;
                    }
                    let there = &self.cells[self.index(nx, ny)];
                    for &a in here {
                        for &b in there {
                            f(a.min(b), a.max(b));
                        }
                    }
                }
            }
        }
    }
}
