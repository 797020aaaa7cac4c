/// End-to-end exploration and fastest-path sessions on the reference arena
use maze_core::core::{Canvas, CellState, Grid, Move, Paint, Pose, Position};
use maze_core::params::SessionConfig;
use maze_core::scheduling::SessionState;
use maze_core::MazeError;
use maze_library::algorithms::{
    ArenaSensor, ExploreView, FrontierExplorer, FrontierSearch, Sensor,
};
use maze_library::arena::Arena;
use maze_library::nodes::{
    ExplorationNode, ExploreParams, FastestPathNode, FastestPathParams, MazeContext,
    MazeController, RunMode,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

fn sample_arena() -> Arena {
    let mut arena = Arena::empty();
    let mut cells = vec![
        (5, 6),
        (6, 6),
        (5, 7),
        (6, 7),
        (10, 4),
        (11, 4),
        (9, 14),
        (9, 15),
        (9, 16),
    ];
    cells.extend((0..6).map(|x| (x, 12)));
    for (x, y) in cells {
        assert!(arena.set_obstacle(Position::new(x, y), true));
    }
    arena
}

fn walled_goal_arena() -> Arena {
    let mut arena = Arena::empty();
    for y in 16..20 {
        arena.set_obstacle(Position::new(11, y), true);
    }
    for x in 11..15 {
        arena.set_obstacle(Position::new(x, 16), true);
    }
    arena
}

fn controller(dir: &Path, mode: RunMode) -> (MazeController, Canvas) {
    let config = SessionConfig {
        descriptor_path: dir.join("arena.txt"),
        ..SessionConfig::default()
    };
    let canvas = Canvas::new(20, 15);
    let ctx = MazeContext::new(config, mode, canvas.clone()).unwrap();
    (MazeController::new(ctx), canvas)
}

fn load(controller: &MazeController, arena: Arena) {
    controller.edit_layout(arena).unwrap();
    controller.load_layout().unwrap();
}

/// Spins a full turn before every primitive of the wrapped explorer
struct Dawdler {
    inner: FrontierSearch,
    spins: u8,
}

impl FrontierExplorer for Dawdler {
    fn begin(&mut self, grid: &Grid, pose: Pose) {
        self.spins = 0;
        self.inner.begin(grid, pose);
    }

    fn next_move(&mut self, view: &ExploreView<'_>) -> Option<Move> {
        // Four left turns leave the pose unchanged
        if self.spins < 4 {
            self.spins += 1;
            return Some(Move::TurnLeft);
        }
        self.spins = 0;
        self.inner.next_move(view)
    }

    fn reached_goal(&self) -> bool {
        self.inner.reached_goal()
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_a_exploration_reaches_goal() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = controller(dir.path(), RunMode::Simulation);
    load(&controller, sample_arena());
    controller.set_speed("1").unwrap();
    controller.set_explore_time_limit("360").unwrap();
    controller.reset_robot(3, 3).unwrap();

    controller.start_exploration().unwrap();
    assert_eq!(controller.status().status(), "robot exploring");
    let outcome = controller.wait_exploration().await.unwrap();

    assert_eq!(outcome.state, SessionState::Finished);
    assert!(outcome.reached_goal);
    assert!(outcome.coverage > 0.0);
    assert!(outcome.steps < 360);
    assert_eq!(controller.status().status(), "exploration reaches goal zone");
    assert_eq!(
        controller.status().timer_message(),
        "explored within time limit"
    );
    assert!(controller.status().ffp_enabled());
    assert!(controller.status().explore_enabled());
    assert!(!controller.exploration().is_running());
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_slow_explorer_times_out() {
    let ctx = MazeContext::new(
        SessionConfig::default(),
        RunMode::Simulation,
        Canvas::new(20, 15),
    )
    .unwrap();
    *ctx.arena.write() = Some(sample_arena());
    ctx.tracker.reset_pose(3, 3).unwrap();
    let node = ExplorationNode::new(ctx.clone());

    let params = ExploreParams {
        speed: 1,
        time_limit: 1,
        coverage_target: 100,
    };
    node.start(
        params,
        Box::new(Dawdler {
            inner: FrontierSearch::new(3),
            spins: 0,
        }),
        Box::new(ArenaSensor::new(sample_arena(), 2)),
    )
    .unwrap();
    let outcome = node.wait().await.unwrap();

    assert_eq!(outcome.state, SessionState::TimedOut);
    assert_eq!(ctx.status.timer_message(), "exploration: time out");
    assert!(ctx
        .status
        .snapshot()
        .alerts
        .contains(&"exploration: time out".to_string()));
    assert!(!ctx.status.ffp_enabled());
    // Cancelled between primitives: the pose is whole and painted
    let pose = ctx.tracker.pose().unwrap();
    assert!(ctx.grid.read().footprint_in_bounds(pose.position));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_short_limit_through_controller() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = controller(dir.path(), RunMode::Simulation);
    load(&controller, sample_arena());
    controller.set_speed("1").unwrap();
    controller.set_explore_time_limit("1").unwrap();
    controller.reset_robot(3, 3).unwrap();

    controller.start_exploration().unwrap();
    let outcome = controller.wait_exploration().await.unwrap();

    assert_eq!(outcome.state, SessionState::TimedOut);
    assert!(!controller.status().ffp_enabled());
    assert!(matches!(
        controller.find_fastest_path(),
        Err(MazeError::NotReady(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_fastest_path_after_exploration() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, canvas) = controller(dir.path(), RunMode::Simulation);
    load(&controller, sample_arena());
    controller.set_speed("2").unwrap();
    controller.reset_robot(3, 3).unwrap();

    controller.start_exploration().unwrap();
    let explored = controller.wait_exploration().await.unwrap();
    assert!(explored.reached_goal);

    controller.find_fastest_path().unwrap();
    assert_eq!(controller.status().status(), "robot finding fastest path");
    let outcome = controller.wait_fastest_path().await.unwrap();

    let path = outcome.path.expect("path through the explored arena");
    assert!(path.num_steps() > 0);
    let ctx = controller.context();
    let goal = ctx.grid.read().goal();
    assert_eq!(ctx.tracker.pose().unwrap().position, goal);
    assert_eq!(path.last(), Some(goal));

    for step in &path.steps {
        let cell = ctx.grid.read().to_render(*step).unwrap();
        assert_eq!(canvas.paint_count(cell, Paint::FastestPath), 1);
    }
    assert_eq!(controller.status().status(), "fastest path found");
    assert_eq!(outcome.state, SessionState::Finished);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_walled_goal_has_no_path() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, canvas) = controller(dir.path(), RunMode::Hardware);
    let arena = walled_goal_arena();
    load(&controller, arena.clone());

    // Fully explored grid
    {
        let mut grid = controller.context().grid.write();
        let all: Vec<_> = grid.positions().collect();
        for p in all {
            let state = if arena.is_obstacle(p) {
                CellState::Obstacle
            } else {
                CellState::Empty
            };
            grid.set_cell(p, state);
        }
    }
    let before = controller.reset_robot(5, 5).unwrap();

    controller.find_fastest_path().unwrap();
    let outcome = controller.wait_fastest_path().await.unwrap();

    assert!(outcome.path.is_none());
    assert!(outcome.error.is_none());
    assert_eq!(controller.status().status(), "no path found");
    assert_eq!(controller.context().tracker.pose(), Some(before));
    assert!(canvas.cells_with(Paint::FastestPath).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hardware_handshake_starts_exploration() {
    let dir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let robot = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"3,3\nSTATUS ok\nES\n").await.unwrap();
        // Keep the connection open until the test ends
        stream
    });

    let config = SessionConfig {
        descriptor_path: dir.path().join("arena.txt"),
        link_address: addr,
        ..SessionConfig::default()
    };
    let ctx = MazeContext::new(config, RunMode::Hardware, Canvas::new(20, 15)).unwrap();
    let arena = sample_arena();
    let controller = Arc::new(MazeController::new(ctx).with_sensor_factory(Arc::new(
        move || -> Box<dyn Sensor> { Box::new(ArenaSensor::new(arena.clone(), 2)) },
    )));

    let session = controller.connect_hardware().unwrap().await.unwrap().unwrap();
    assert!(controller.take_link().is_some());
    let _robot = robot.await.unwrap();

    let outcome = controller.wait_exploration().await.unwrap();
    assert_eq!(outcome.session, session);
    assert_eq!(outcome.state, SessionState::Finished);
    assert!(outcome.reached_goal);
    // Hardware runs leave the triggers to the link
    assert!(!controller.status().explore_enabled());
}

#[tokio::test]
async fn test_hardware_handshake_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"three,three\n").await.unwrap();
    });

    let config = SessionConfig {
        descriptor_path: dir.path().join("arena.txt"),
        link_address: addr,
        ..SessionConfig::default()
    };
    let ctx = MazeContext::new(config, RunMode::Hardware, Canvas::new(20, 15)).unwrap();
    let controller = Arc::new(MazeController::new(ctx));

    let result = controller.connect_hardware().unwrap().await.unwrap();
    assert!(matches!(result, Err(MazeError::Communication(_))));
    assert!(!controller.exploration().is_running());
    assert!(controller.context().tracker.pose().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_one_session_at_a_time_across_kinds() {
    let ctx = MazeContext::new(
        SessionConfig::default(),
        RunMode::Hardware,
        Canvas::new(20, 15),
    )
    .unwrap();
    ctx.tracker.reset_pose(3, 3).unwrap();
    let exploration = ExplorationNode::new(ctx.clone());
    let fastest_path = FastestPathNode::new(ctx.clone());
    let ffp = FastestPathParams {
        speed: 1,
        time_limit: 30,
    };

    exploration
        .start(
            ExploreParams {
                speed: 1,
                time_limit: 30,
                coverage_target: 100,
            },
            Box::new(FrontierSearch::new(3)),
            Box::new(ArenaSensor::new(Arena::empty(), 2)),
        )
        .unwrap();
    assert!(matches!(
        fastest_path.start(ffp),
        Err(MazeError::SessionActive("exploration"))
    ));
    assert!(!fastest_path.is_running());
    assert_eq!(ctx.robot.holder(), Some("exploration"));

    assert!(exploration.stop());
    exploration.wait().await.unwrap();
    assert_eq!(ctx.robot.holder(), None);

    fastest_path.start(ffp).unwrap();
    assert_eq!(ctx.robot.holder(), Some("fastest path"));
    fastest_path.wait().await.unwrap();
    assert_eq!(ctx.robot.holder(), None);
}

#[tokio::test(start_paused = true)]
async fn test_hardware_connect_refused_during_exploration() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = controller(dir.path(), RunMode::Hardware);
    let controller = Arc::new(controller);
    load(&controller, sample_arena());
    controller.reset_robot(3, 8).unwrap();
    controller.start_exploration().unwrap();
    let before = controller.context().tracker.pose();

    assert!(matches!(
        controller.connect_hardware(),
        Err(MazeError::SessionActive("exploration"))
    ));
    assert!(matches!(
        controller.reset_robot(3, 3),
        Err(MazeError::SessionActive("exploration"))
    ));
    assert_eq!(controller.context().tracker.pose(), before);
    assert!(controller.exploration().is_running());

    controller.stop_exploration();
    controller.wait_exploration().await.unwrap();
}
