use maze_core::core::LogSummary;
use maze_core::error::{MazeError, MazeResult};
use serde::{Deserialize, Serialize};

/// Token the robot sends when exploration should begin
pub const DEFAULT_START_TOKEN: &str = "ES";

/// Message received from the robot over the line link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMessage {
    /// `"<x>,<y>"`, 1-indexed like operator input
    InitialPosition { x: i32, y: i32 },
    /// The configured start token
    StartExploration,
    /// Anything else; ignored while waiting for the start token
    Other(String),
}

impl LinkMessage {
    /// Classify one line
    pub fn parse(line: &str, start_token: &str) -> Self {
        if line == start_token {
            return LinkMessage::StartExploration;
        }
        match Self::parse_position(line) {
            Ok((x, y)) => LinkMessage::InitialPosition { x, y },
            Err(_) => LinkMessage::Other(line.to_string()),
        }
    }

    /// Strict `"x,y"` decimal pair, no whitespace
    pub fn parse_position(line: &str) -> MazeResult<(i32, i32)> {
        let malformed = || MazeError::communication(format!("malformed position message {:?}", line));

        let (x, y) = line.split_once(',').ok_or_else(malformed)?;
        let is_decimal = |s: &str| {
            let digits = s.strip_prefix('-').unwrap_or(s);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        };
        if !is_decimal(x) || !is_decimal(y) {
            return Err(malformed());
        }

        Ok((
            x.parse().map_err(|_| malformed())?,
            y.parse().map_err(|_| malformed())?,
        ))
    }
}

impl LogSummary for LinkMessage {
    fn log_summary(&self) -> String {
        match self {
            LinkMessage::InitialPosition { x, y } => format!("InitialPosition({},{})", x, y),
            LinkMessage::StartExploration => "StartExploration".to_string(),
            LinkMessage::Other(line) => format!("Other({} bytes)", line.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(LinkMessage::parse_position("3,4").unwrap(), (3, 4));
        assert_eq!(LinkMessage::parse_position("12,-1").unwrap(), (12, -1));
        assert!(LinkMessage::parse_position("3, 4").is_err());
        assert!(LinkMessage::parse_position(" 3,4").is_err());
        assert!(LinkMessage::parse_position("3;4").is_err());
        assert!(LinkMessage::parse_position("3,").is_err());
        assert!(LinkMessage::parse_position("+3,4").is_err());
        assert!(LinkMessage::parse_position("3,4,5").is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            LinkMessage::parse("ES", DEFAULT_START_TOKEN),
            LinkMessage::StartExploration
        );
        assert_eq!(
            LinkMessage::parse("2,2", DEFAULT_START_TOKEN),
            LinkMessage::InitialPosition { x: 2, y: 2 }
        );
        assert_eq!(
            LinkMessage::parse("SENSOR 1 2 3", DEFAULT_START_TOKEN),
            LinkMessage::Other("SENSOR 1 2 3".to_string())
        );
    }
}
