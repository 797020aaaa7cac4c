//! Paint capability used by the pose tracker
//!
//! The core only ever asks for "paint this cell with this meaning". Cells are
//! addressed in the renderer's frame (see [`Grid::to_render`](crate::core::Grid::to_render)).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cell address in the renderer's frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderCell {
    pub row: usize,
    pub col: usize,
}

/// Semantic colour of a rendered cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Paint {
    /// Unexplored, outside any zone
    Background,
    /// Sensed empty or traversed by the robot
    Explored,
    Obstacle,
    /// START or GOAL zone
    Zone,
    /// Robot body
    Footprint,
    /// Front-facing cell of the robot body
    Heading,
    /// Cell on the executed fastest path
    FastestPath,
}

impl Paint {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }

    /// Single-character glyph for terminal rendering
    pub fn glyph(self) -> char {
        match self {
            Paint::Background => '.',
            Paint::Explored => ' ',
            Paint::Obstacle => '#',
            Paint::Zone => 'z',
            Paint::Footprint => 'o',
            Paint::Heading => '^',
            Paint::FastestPath => '*',
        }
    }
}

/// Anything that can colour a cell
pub trait PaintSurface: Send {
    fn paint(&mut self, cell: RenderCell, paint: Paint);
}

#[derive(Debug)]
struct CanvasCells {
    rows: usize,
    cols: usize,
    paints: Vec<Paint>,
    counts: Vec<[u32; Paint::COUNT]>,
}

/// In-memory paint surface
///
/// Clones share the same cells, so a caller can hand one clone to the pose
/// tracker and keep another to inspect what was painted.
#[derive(Debug, Clone)]
pub struct Canvas {
    cells: Arc<Mutex<CanvasCells>>,
}

impl Canvas {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: Arc::new(Mutex::new(CanvasCells {
                rows,
                cols,
                paints: vec![Paint::Background; rows * cols],
                counts: vec![[0; Paint::COUNT]; rows * cols],
            })),
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.lock().rows
    }

    pub fn cols(&self) -> usize {
        self.cells.lock().cols
    }

    /// Current paint of a cell
    pub fn get(&self, cell: RenderCell) -> Option<Paint> {
        let cells = self.cells.lock();
        (cell.row < cells.rows && cell.col < cells.cols)
            .then(|| cells.paints[cell.row * cells.cols + cell.col])
    }

    /// How many times `paint` was applied to `cell`
    pub fn paint_count(&self, cell: RenderCell, paint: Paint) -> u32 {
        let cells = self.cells.lock();
        if cell.row < cells.rows && cell.col < cells.cols {
            cells.counts[cell.row * cells.cols + cell.col][paint.index()]
        } else {
            0
        }
    }

    /// Cells currently showing `paint`
    pub fn cells_with(&self, paint: Paint) -> Vec<RenderCell> {
        let cells = self.cells.lock();
        cells
            .paints
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == paint)
            .map(|(i, _)| RenderCell {
                row: i / cells.cols,
                col: i % cells.cols,
            })
            .collect()
    }

    /// Snapshot of all paints, row-major
    pub fn snapshot(&self) -> Vec<Paint> {
        self.cells.lock().paints.clone()
    }

    /// Zero the per-cell paint counters
    pub fn clear_counts(&self) {
        let mut cells = self.cells.lock();
        cells.counts.iter_mut().for_each(|c| *c = [0; Paint::COUNT]);
    }

    /// Terminal rendering, one line per render row
    pub fn render_ascii(&self) -> String {
        let cells = self.cells.lock();
        let mut out = String::with_capacity(cells.rows * (cells.cols + 1));
        for row in cells.paints.chunks(cells.cols.max(1)) {
            out.extend(row.iter().map(|p| p.glyph()));
            out.push('\n');
        }
        out
    }
}

impl PaintSurface for Canvas {
    fn paint(&mut self, cell: RenderCell, paint: Paint) {
        let mut cells = self.cells.lock();
        if cell.row >= cells.rows || cell.col >= cells.cols {
            return;
        }
        let i = cell.row * cells.cols + cell.col;
        cells.paints[i] = paint;
        cells.counts[i][paint.index()] += 1;
    }
}
