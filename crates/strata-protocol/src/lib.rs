//! strata-protocol: command vocabulary and reply frames.
//!
//! Turns argument arrays into typed [`Command`]s and defines the
//! [`Frame`] values the server replies with. There is no wire encoding;
//! callers build argument frames however their input arrives.
//!
//! # quick start
//!
//! ```
//! use bytes::Bytes;
//! use strata_protocol::{Command, Frame};
//!
//! let args = ["ZCARD", "leaderboard"]
//!     .iter()
//!     .map(|s| Frame::Bulk(Bytes::from(s.to_string())))
//!     .collect();
//! let cmd = Command::from_frame(Frame::Array(args)).unwrap();
//! assert_eq!(cmd, Command::ZCard { key: "leaderboard".into() });
//! ```

pub mod command;
pub mod error;
pub mod types;

pub use command::{Command, RangeLimit, RangeSpec, StoreAggregate, StoreArgs, ZAddFlags};
pub use error::ProtocolError;
pub use types::Frame;
