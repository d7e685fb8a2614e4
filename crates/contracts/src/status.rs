//! Destination connection state machine
//!
//! Pure transition table, independent of any socket.

use serde::Serialize;
use std::fmt;

/// Connection status of a single destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Dial in progress
    Connecting,
    /// Handle open and usable for writes
    Connected,
    /// No usable handle; the next write triggers a reconnect
    NotConnected,
    /// Explicitly closed; terminal
    Closed,
}

/// Events driving [`ConnectionStatus`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A connect attempt starts
    Dial,
    /// The connect attempt produced a usable handle
    DialSucceeded,
    /// The connect attempt failed
    DialFailed,
    /// A write on the open handle failed
    WriteFailed,
    /// Explicit close
    Close,
}

impl ConnectionStatus {
    /// Apply an event and return the next status
    pub fn on(self, event: LinkEvent) -> Self {
        use ConnectionStatus::*;

        match (self, event) {
            (Closed, _) => Closed,
            (_, LinkEvent::Close) => Closed,
            (_, LinkEvent::Dial) => Connecting,
            (Connecting, LinkEvent::DialSucceeded) => Connected,
            (Connecting, LinkEvent::DialFailed) => NotConnected,
            (Connected, LinkEvent::WriteFailed) => NotConnected,
            (status, _) => status,
        }
    }

    /// Only a connected destination may be written to
    pub fn accepts_writes(self) -> bool {
        self == ConnectionStatus::Connected
    }

    /// Whether the next write should attempt a reconnect instead of writing
    pub fn wants_reconnect(self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connecting | ConnectionStatus::NotConnected
        )
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::NotConnected => "not_connected",
            ConnectionStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}
