//! # Communication layer for MAZE
//!
//! - **LineLink**: line-delimited text link to the physical robot
//!
//! ```rust,ignore
//! use maze_core::communication::LineLink;
//! let mut link = LineLink::connect("192.168.16.1:5182").await?;
//! let first = link.recv_line().await?;   // "x,y"
//! ```

pub mod link;

pub use link::LineLink;
