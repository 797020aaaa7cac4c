use crate::error::{MazeError, MazeResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

/// Line-framed text link over TCP
///
/// Each message is one line; the terminator is stripped on receive and
/// appended on send.
pub struct LineLink {
    peer: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl LineLink {
    /// Resolve and connect; unknown hosts and refused connections become
    /// [`MazeError::Communication`]
    pub async fn connect(addr: &str) -> MazeResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| MazeError::communication(format!("failed to connect to {}: {}", addr, e)))?;
        debug!("link connected to {}", addr);
        Ok(Self::from_stream(stream, addr))
    }

    pub fn from_stream(stream: TcpStream, peer: impl Into<String>) -> Self {
        let (read, writer) = stream.into_split();
        Self {
            peer: peer.into(),
            lines: BufReader::new(read).lines(),
            writer,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Next line from the peer; a closed connection is an error
    pub async fn recv_line(&mut self) -> MazeResult<String> {
        match self.lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim_end_matches('\r').to_string();
                debug!("link <- {}: {}", self.peer, line);
                Ok(line)
            }
            Ok(None) => Err(MazeError::communication(format!(
                "connection to {} closed",
                self.peer
            ))),
            Err(e) => Err(MazeError::communication(format!(
                "read from {} failed: {}",
                self.peer, e
            ))),
        }
    }

    pub async fn send_line(&mut self, line: &str) -> MazeResult<()> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');
        self.writer
            .write_all(framed.as_bytes())
            .await
            .map_err(|e| MazeError::communication(format!("write to {} failed: {}", self.peer, e)))?;
        debug!("link -> {}: {}", self.peer, line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_line_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            let mut link = LineLink::from_stream(stream, peer.to_string());
            link.send_line("3,4").await.unwrap();
            link.recv_line().await.unwrap()
        });

        let mut link = LineLink::connect(&addr).await.unwrap();
        assert_eq!(link.recv_line().await.unwrap(), "3,4");
        link.send_line("ack").await.unwrap();
        assert_eq!(server.await.unwrap(), "ack");
    }

    #[tokio::test]
    async fn test_closed_connection_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut link = LineLink::connect(&addr).await.unwrap();
        assert!(matches!(
            link.recv_line().await,
            Err(MazeError::Communication(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(LineLink::connect(&addr).await.is_err());
    }
}
