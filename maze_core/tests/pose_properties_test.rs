/// Property checks for the pose tracker over the whole reference arena
use maze_core::core::{Canvas, Grid, Orientation, Paint, PoseTracker, Position};
use maze_core::MazeError;

fn tracker() -> (PoseTracker, Canvas) {
    let canvas = Canvas::new(20, 15);
    (
        PoseTracker::new(Grid::arena().into_shared(), canvas.clone()),
        canvas,
    )
}

#[test]
fn test_every_valid_reset_reads_back() {
    let (tracker, _) = tracker();
    for x in 2..=14 {
        for y in 2..=19 {
            let pose = tracker.reset_pose(x, y).unwrap();
            assert_eq!(pose.position, Position::new(x - 1, y - 1));
            assert_eq!(pose.orientation, Orientation::North);
            assert_eq!(tracker.pose(), Some(pose));
        }
    }
}

#[test]
fn test_every_invalid_reset_blanks() {
    let (reference, reference_canvas) = tracker();
    reference.reset_surface();
    let blank = reference_canvas.snapshot();

    let (tracker, canvas) = tracker();
    let invalid = [(1, 5), (15, 5), (5, 1), (5, 20), (0, 0), (-3, 7), (16, 21)];
    for (x, y) in invalid {
        tracker.reset_pose(8, 8).unwrap();
        tracker.turn_right().unwrap();

        let err = tracker.reset_pose(x, y).unwrap_err();
        assert!(matches!(err, MazeError::PositionOutOfRange { .. }));
        assert!(tracker.pose().is_none());
        assert_eq!(canvas.snapshot(), blank);
    }
}

#[test]
fn test_footprint_never_leaves_grid() {
    let (tracker, _) = tracker();
    tracker.reset_pose(2, 2).unwrap();

    // Walk around the perimeter, bumping each wall
    for _ in 0..4 {
        loop {
            match tracker.move_forward() {
                Ok(pose) => {
                    let grid = Grid::arena();
                    assert!(grid.footprint_in_bounds(pose.position));
                }
                Err(MazeError::OutOfBounds(_)) => break,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        tracker.turn_right().unwrap();
    }

    assert_eq!(tracker.pose().unwrap().position, Position::new(1, 1));
}

#[test]
fn test_turns_keep_position_and_repaint_heading() {
    let (tracker, canvas) = tracker();
    let grid = Grid::arena();
    let start = tracker.reset_pose(7, 10).unwrap();

    let pose = tracker.turn_right().unwrap();
    assert_eq!(pose.position, start.position);
    assert_eq!(pose.orientation, Orientation::East);

    let east = grid.to_render(Position::new(7, 9)).unwrap();
    let north = grid.to_render(Position::new(6, 10)).unwrap();
    assert_eq!(canvas.get(east), Some(Paint::Heading));
    assert_eq!(canvas.get(north), Some(Paint::Footprint));
    assert_eq!(canvas.cells_with(Paint::Heading).len(), 1);
}
