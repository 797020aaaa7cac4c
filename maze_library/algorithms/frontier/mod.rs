//! Frontier exploration
//!
//! [`FrontierExplorer`] is the stepping contract the exploration session
//! drives: one primitive per call, `None` when the run is over.
//! [`FrontierSearch`] is the reference explorer:
//!
//! 1. head for the GOAL zone, planning through unexplored cells
//! 2. sweep to the nearest reachable frontier until the coverage target is met
//! 3. return to the START zone
//!
//! Phase 3 starts early as soon as the time threshold is raised.

mod sensor;

pub use sensor::{ArenaSensor, Sensor};

use crate::algorithms::astar::AStarPlanner;
use maze_core::core::{Grid, Move, Pose, Position};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// What the explorer may look at when choosing its next move
#[derive(Debug, Clone, Copy)]
pub struct ExploreView<'a> {
    pub grid: &'a Grid,
    pub pose: Pose,
    /// Coverage percentage after which the explorer heads home
    pub coverage_target: f32,
    /// Time threshold raised; head home now
    pub return_requested: bool,
}

/// Lazy exploration stepper
pub trait FrontierExplorer: Send {
    /// Prepare a new run from `pose`
    fn begin(&mut self, grid: &Grid, pose: Pose);

    /// Next primitive to apply, or `None` when the run is over
    fn next_move(&mut self, view: &ExploreView<'_>) -> Option<Move>;

    /// Whether the robot centre reached the GOAL anchor during this run
    fn reached_goal(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorePhase {
    ToGoal,
    Sweep,
    Return,
    Done,
}

/// Reference frontier explorer
#[derive(Debug, Clone)]
pub struct FrontierSearch {
    sensing_radius: u32,
    planner: AStarPlanner,
    phase: ExplorePhase,
    reached_goal: bool,
    target: Option<Position>,
    unreachable: HashSet<Position>,
    plan: VecDeque<Move>,
}

impl FrontierSearch {
    /// `sensing_radius` must match the sensor feeding the grid
    pub fn new(sensing_radius: u32) -> Self {
        Self {
            sensing_radius,
            planner: AStarPlanner::new(),
            phase: ExplorePhase::ToGoal,
            reached_goal: false,
            target: None,
            unreachable: HashSet::new(),
            plan: VecDeque::new(),
        }
    }

    pub fn with_turn_penalty(mut self, turn_penalty: f64) -> Self {
        self.planner = self.planner.with_turn_penalty(turn_penalty);
        self
    }

    pub fn phase(&self) -> ExplorePhase {
        self.phase
    }

    fn enter(&mut self, phase: ExplorePhase) {
        if self.phase != phase {
            debug!("explorer phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        self.target = None;
        self.plan.clear();
    }

    /// A centre from which the sensor would still reveal something
    fn is_frontier(&self, grid: &Grid, center: Position) -> bool {
        let r = self.sensing_radius as i32;
        (-r..=r).any(|dy| {
            (-r..=r).any(|dx| {
                grid.cell(center.offset((dx, dy)))
                    .is_some_and(|c| !c.is_known())
            })
        })
    }

    /// Breadth-first over known-free centres
    fn nearest_frontier(&self, grid: &Grid, from: Position) -> Option<Position> {
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(center) = queue.pop_front() {
            if center != from
                && !self.unreachable.contains(&center)
                && self.is_frontier(grid, center)
            {
                return Some(center);
            }
            for delta in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
                let next = center.offset(delta);
                if grid.is_traversable(next, false) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Current target, moving through phases as they complete
    fn select_target(&mut self, view: &ExploreView<'_>) -> Option<Position> {
        let grid = view.grid;
        let here = view.pose.position;

        loop {
            match self.phase {
                ExplorePhase::ToGoal if self.reached_goal => self.enter(ExplorePhase::Sweep),
                ExplorePhase::ToGoal => return Some(grid.goal()),
                ExplorePhase::Sweep => {
                    if grid.coverage() >= view.coverage_target {
                        self.enter(ExplorePhase::Return);
                        continue;
                    }
                    if let Some(target) = self.target.filter(|t| self.is_frontier(grid, *t)) {
                        return Some(target);
                    }
                    match self.nearest_frontier(grid, here) {
                        Some(target) => {
                            self.target = Some(target);
                            self.plan.clear();
                            return Some(target);
                        }
                        None => self.enter(ExplorePhase::Return),
                    }
                }
                ExplorePhase::Return if here == grid.start() => self.enter(ExplorePhase::Done),
                ExplorePhase::Return => return Some(grid.start()),
                ExplorePhase::Done => return None,
            }
        }
    }

    fn plan_to(&self, grid: &Grid, pose: Pose, target: Position) -> Option<VecDeque<Move>> {
        let planner = self
            .planner
            .clone()
            .with_unknown_is_free(self.phase == ExplorePhase::ToGoal);
        let path = planner
            .plan(pose.position, Some(pose.orientation), target, grid)
            .ok()?;
        let moves = path.moves_from(pose.position, pose.orientation).ok()?;
        (!moves.is_empty()).then(|| moves.into())
    }

    /// Next forward move would run the footprint into something
    fn plan_blocked(&self, grid: &Grid, pose: Pose) -> bool {
        self.plan.front() == Some(&Move::Forward)
            && !grid.is_traversable(
                pose.heading_cell(),
                self.phase == ExplorePhase::ToGoal,
            )
    }
}

impl FrontierExplorer for FrontierSearch {
    fn begin(&mut self, grid: &Grid, pose: Pose) {
        self.phase = ExplorePhase::ToGoal;
        self.reached_goal = pose.position == grid.goal();
        self.target = None;
        self.unreachable.clear();
        self.plan.clear();
    }

    fn next_move(&mut self, view: &ExploreView<'_>) -> Option<Move> {
        let grid = view.grid;
        if view.pose.position == grid.goal() {
            self.reached_goal = true;
        }
        if view.return_requested
            && matches!(self.phase, ExplorePhase::ToGoal | ExplorePhase::Sweep)
        {
            self.enter(ExplorePhase::Return);
        }

        // Each failed plan retires a target or a phase, so this terminates
        loop {
            let target = self.select_target(view)?;

            if self.plan_blocked(grid, view.pose) {
                self.plan.clear();
            }
            if self.plan.is_empty() {
                match self.plan_to(grid, view.pose, target) {
                    Some(moves) => self.plan = moves,
                    None => {
                        debug!("explorer cannot reach {} in {:?}", target, self.phase);
                        match self.phase {
                            ExplorePhase::ToGoal => self.enter(ExplorePhase::Sweep),
                            ExplorePhase::Sweep => {
                                self.unreachable.insert(target);
                                self.target = None;
                            }
                            ExplorePhase::Return | ExplorePhase::Done => {
                                self.enter(ExplorePhase::Done)
                            }
                        }
                        continue;
                    }
                }
            }

            return self.plan.pop_front();
        }
    }

    fn reached_goal(&self) -> bool {
        self.reached_goal
    }
}
