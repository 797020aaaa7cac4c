use crate::messages::LinkMessage;
use crate::nodes::context::MazeContext;
use crate::nodes::status_board::StatusBoard;
use maze_core::communication::LineLink;
use maze_core::core::{LogSummary, Pose, PoseTracker};
use maze_core::error::MazeResult;
use maze_core::scheduling::RobotLock;
use std::sync::Arc;
use tracing::{debug, error, info};

type Result<T> = MazeResult<T>;

/// Link and pose after a successful handshake
pub struct Handshake {
    pub link: LineLink,
    pub pose: Pose,
}

/// Robot-side handshake before a hardware exploration
///
/// Connect, read the initial `"x,y"` position, place the robot, then wait
/// for the start token. Any failure aborts the attempt; there is no retry.
/// The robot is only placed while no session holds it.
pub struct HardwareLinkNode {
    address: String,
    start_token: String,
    tracker: Arc<PoseTracker>,
    robot: RobotLock,
    status: StatusBoard,
}

impl HardwareLinkNode {
    pub fn new(ctx: &MazeContext) -> Self {
        Self {
            address: ctx.config.link_address.clone(),
            start_token: ctx.config.start_token.clone(),
            tracker: ctx.tracker.clone(),
            robot: ctx.robot.clone(),
            status: ctx.status.clone(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Run the whole handshake, logging any failure
    pub async fn handshake(&self) -> Result<Handshake> {
        match self.try_handshake().await {
            Ok(handshake) => Ok(handshake),
            Err(e) => {
                error!("hardware handshake with {} aborted: {}", self.address, e);
                self.status.set_status("connection aborted");
                Err(e)
            }
        }
    }

    async fn try_handshake(&self) -> Result<Handshake> {
        self.status.set_status("waiting for connection...");
        let mut link = LineLink::connect(&self.address).await?;
        self.status.set_status("connected with robot");

        let line = link.recv_line().await?;
        let (x, y) = LinkMessage::parse_position(&line)?;
        let pose = self.robot.with_robot(|| self.tracker.reset_pose(x, y))??;
        self.status.set_status("robot initial position set");
        info!("robot placed at {}", pose.log_summary());

        self.wait_for_start(&mut link).await?;
        self.status.set_status("start exploring");
        Ok(Handshake { link, pose })
    }

    /// Poll lines until the start token; everything else is ignored
    pub async fn wait_for_start(&self, link: &mut LineLink) -> Result<()> {
        loop {
            let line = link.recv_line().await?;
            match LinkMessage::parse(&line, &self.start_token) {
                LinkMessage::StartExploration => return Ok(()),
                other => debug!("ignoring {} before start", other.log_summary()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::context::RunMode;
    use maze_core::core::{Canvas, Orientation, Position};
    use maze_core::error::MazeError;
    use maze_core::params::SessionConfig;
    use maze_core::scheduling::SessionGate;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn context() -> MazeContext {
        MazeContext::new(SessionConfig::default(), RunMode::Hardware, Canvas::new(20, 15))
            .unwrap()
    }

    async fn robot(script: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(script.as_bytes()).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_handshake_places_robot_and_waits_for_token() {
        let ctx = context();
        let addr = robot("3,3\nhello\n4,4\nES\n").await;
        let node = HardwareLinkNode::new(&ctx).with_address(addr);

        let handshake = node.handshake().await.unwrap();
        assert_eq!(
            handshake.pose,
            Pose::new(Position::new(2, 2), Orientation::North)
        );
        // Later positions before the token are ignored
        assert_eq!(ctx.tracker.pose(), Some(handshake.pose));
        assert_eq!(ctx.status.status(), "start exploring");
    }

    #[tokio::test]
    async fn test_malformed_position_aborts() {
        let ctx = context();
        let addr = robot("3;3\nES\n").await;
        let node = HardwareLinkNode::new(&ctx).with_address(addr);

        let err = node.handshake().await.err().unwrap();
        assert!(matches!(err, MazeError::Communication(_)));
        assert!(ctx.tracker.pose().is_none());
        assert_eq!(ctx.status.status(), "connection aborted");
    }

    #[tokio::test]
    async fn test_position_refused_while_session_holds_robot() {
        let ctx = context();
        let placed = ctx.tracker.reset_pose(3, 8).unwrap();
        let _session = SessionGate::new("exploration")
            .with_robot_lock(ctx.robot.clone())
            .try_acquire()
            .unwrap();
        let addr = robot("3,3\nES\n").await;
        let node = HardwareLinkNode::new(&ctx).with_address(addr);

        let err = node.handshake().await.err().unwrap();
        assert!(matches!(err, MazeError::SessionActive("exploration")));
        assert_eq!(ctx.tracker.pose(), Some(placed));
        assert_eq!(ctx.status.status(), "connection aborted");
    }

    #[tokio::test]
    async fn test_disconnect_before_token_aborts() {
        let ctx = context();
        let addr = robot("5,5\n").await;
        let node = HardwareLinkNode::new(&ctx).with_address(addr);

        let err = node.handshake().await.err().unwrap();
        assert!(matches!(err, MazeError::Communication(_)));
    }

    #[tokio::test]
    async fn test_unknown_host_aborts() {
        let ctx = context();
        let node = HardwareLinkNode::new(&ctx).with_address("no-such-host.invalid:5182");
        assert!(node.handshake().await.is_err());
    }
}
