//! uartlog-core — shared library for the uartlog tools.
//!
//! Provides:
//! - `port` — serial device handle, framing configuration, bounded-wait reads
//! - `sanitize` — line-terminator normalization and blank classification
//! - `idle` — last-activity tracking and idle-expiry decisions
//! - `session` — log session state machine and record formatting

pub mod idle;
pub mod port;
pub mod sanitize;
pub mod session;

pub use idle::IdleTracker;
pub use port::{BaudRate, PortConfig, PortError, PortRead, READ_BUFFER_SIZE, UartPort};
pub use sanitize::{SanitizedLine, sanitize};
pub use session::{LineOutcome, LogSession, SessionError};
