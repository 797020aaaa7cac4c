//! Simulated arena layout and the map descriptor format
//!
//! The arena is the ground truth the simulated sensor reads. Its descriptor
//! is column-major: `width` lines of `length` characters, where line `x`
//! holds the cells `(x, 0)..(x, length - 1)`. `'1'` marks an obstacle and
//! `'0'` an empty cell.

use maze_core::core::grid::{ARENA_LENGTH, ARENA_WIDTH};
use maze_core::core::{Grid, Position};
use maze_core::error::{MazeError, MazeResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Why a descriptor could not be read
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("descriptor has {0} columns, at least 3 are needed")]
    TooShort(usize),

    #[error("line {line}: expected {expected} cells, found {found}")]
    Width {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unexpected character {ch:?}")]
    BadCell { line: usize, ch: char },

    #[error("line {line}: zone cell at y = {y} marked as obstacle")]
    ZoneObstacle { line: usize, y: usize },
}

impl From<DescriptorError> for MazeError {
    fn from(e: DescriptorError) -> Self {
        MazeError::InvalidInput(e.to_string())
    }
}

/// True obstacle layout of an arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena {
    width: usize,
    length: usize,
    obstacles: Vec<bool>,
}

impl Arena {
    pub fn new(width: usize, length: usize) -> MazeResult<Self> {
        // Same size rules as the sensed grid
        Grid::new(width, length)?;
        Ok(Self {
            width,
            length,
            obstacles: vec![false; width * length],
        })
    }

    /// Empty reference 15×20 arena
    pub fn empty() -> Self {
        Self {
            width: ARENA_WIDTH,
            length: ARENA_LENGTH,
            obstacles: vec![false; ARENA_WIDTH * ARENA_LENGTH],
        }
    }

    /// Reference arena with each non-zone cell an obstacle with probability `density`
    pub fn random(seed: u64, density: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let density = density.clamp(0.0, 1.0);
        let mut arena = Self::empty();
        for y in 0..arena.length as i32 {
            for x in 0..arena.width as i32 {
                let p = Position::new(x, y);
                if !arena.in_zone(p) && rng.gen_bool(density) {
                    arena.set_obstacle(p, true);
                }
            }
        }
        arena
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Unexplored grid of the same size
    pub fn blank_grid(&self) -> Grid {
        Grid::new(self.width, self.length).unwrap_or_default()
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.length
    }

    /// START or GOAL zone cell
    pub fn in_zone(&self, p: Position) -> bool {
        let start = Position::new(1, 1);
        let goal = Position::new(self.width as i32 - 2, self.length as i32 - 2);
        self.contains(p) && (p.chebyshev(start) <= 1 || p.chebyshev(goal) <= 1)
    }

    fn index(&self, p: Position) -> Option<usize> {
        self.contains(p)
            .then(|| p.y as usize * self.width + p.x as usize)
    }

    pub fn is_obstacle(&self, p: Position) -> bool {
        self.index(p).is_some_and(|i| self.obstacles[i])
    }

    /// Returns `false` for cells outside the arena or obstacles inside a zone
    pub fn set_obstacle(&mut self, p: Position, obstacle: bool) -> bool {
        if obstacle && self.in_zone(p) {
            return false;
        }
        match self.index(p) {
            Some(i) => {
                self.obstacles[i] = obstacle;
                true
            }
            None => false,
        }
    }

    /// Flip a cell; returns its new state, or `None` if it cannot hold an obstacle
    pub fn toggle_obstacle(&mut self, p: Position) -> Option<bool> {
        let next = !self.is_obstacle(p);
        self.set_obstacle(p, next).then_some(next)
    }

    pub fn clear(&mut self) {
        self.obstacles.fill(false);
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.iter().filter(|o| **o).count()
    }

    pub fn to_descriptor(&self) -> String {
        let mut out = String::with_capacity(self.width * (self.length + 1));
        for x in 0..self.width as i32 {
            out.extend((0..self.length as i32).map(|y| {
                if self.is_obstacle(Position::new(x, y)) {
                    '1'
                } else {
                    '0'
                }
            }));
            out.push('\n');
        }
        out
    }

    pub fn from_descriptor(text: &str) -> Result<Self, DescriptorError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() < 3 {
            return Err(DescriptorError::TooShort(lines.len()));
        }

        let width = lines.len();
        let length = lines[0].chars().count();
        if length < 3 {
            return Err(DescriptorError::Width {
                line: 1,
                expected: 3,
                found: length,
            });
        }
        let mut arena = Self {
            width,
            length,
            obstacles: vec![false; width * length],
        };

        for (x, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != length {
                return Err(DescriptorError::Width {
                    line: x + 1,
                    expected: length,
                    found,
                });
            }
            for (y, ch) in line.chars().enumerate() {
                let p = Position::new(x as i32, y as i32);
                match ch {
                    '0' => {}
                    '1' if arena.in_zone(p) => {
                        return Err(DescriptorError::ZoneObstacle { line: x + 1, y })
                    }
                    '1' => {
                        arena.set_obstacle(p, true);
                    }
                    other => return Err(DescriptorError::BadCell { line: x + 1, ch: other }),
                }
            }
        }

        Ok(arena)
    }

    /// Write the descriptor, creating parent directories
    pub fn save(&self, path: &Path) -> MazeResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_descriptor())?;
        info!("map descriptor written to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> MazeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let arena = Self::from_descriptor(&text)?;
        info!(
            "map descriptor loaded from {} ({} obstacles)",
            path.display(),
            arena.obstacle_count()
        );
        Ok(arena)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::empty()
    }
}
