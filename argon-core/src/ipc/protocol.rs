//! IPC protocol definitions
//!
//! Messages exchanged between portal clients (or control tools) and the
//! daemon. Source types, cursor modes, and device sets travel as portal
//! bitmasks and are validated server-side.

use serde::{Deserialize, Serialize};

use crate::types::{SessionKind, StreamResult};

/// Requests accepted by the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PortalRequest {
    /// Open a new negotiation session
    CreateSession {
        session_handle: String,
        kind: SessionKind,
        app_id: String,
    },
    /// Record capture intent for a later Start
    SelectSources {
        session_handle: String,
        types: u32,
        multiple: bool,
        cursor_mode: u32,
    },
    /// Record requested input devices (RemoteDesktop sessions)
    SelectDevices { session_handle: String, devices: u32 },
    /// Run the consent dialog and start streaming
    Start {
        session_handle: String,
        parent_window: Option<String>,
    },
    /// Release a session and its streams
    CloseSession { session_handle: String },
    /// Forward relative pointer motion
    NotifyPointerMotion {
        session_handle: String,
        dx: f64,
        dy: f64,
    },
    /// Forward a pointer button event
    NotifyPointerButton {
        session_handle: String,
        button: i32,
        pressed: bool,
    },
    /// Forward pointer axis (scroll) motion
    NotifyPointerAxis {
        session_handle: String,
        dx: f64,
        dy: f64,
    },
    /// Forward a keyboard key event
    NotifyKeyboardKeycode {
        session_handle: String,
        keycode: i32,
        pressed: bool,
    },
    /// Check if the daemon is alive
    Ping,
    /// Request daemon status
    Status,
    /// List live sessions
    Sessions,
    /// Stop the daemon gracefully
    Stop,
}

/// Responses from the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PortalResponse {
    /// Request succeeded with no payload
    Ok,
    /// Start succeeded; streams are in acceptance order
    Started {
        streams: Vec<StreamResult>,
        /// Granted device bitmask (RemoteDesktop sessions only)
        devices: Option<u32>,
    },
    /// User declined the request
    Cancelled,
    /// Error response
    Error { message: String },
    /// Pong response to ping
    Pong,
    /// Status response
    Status(ServiceStatus),
    /// Session listing response
    Sessions(Vec<SessionSummary>),
    /// Shutdown acknowledgment
    Stopping,
}

/// Daemon-level status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Whether the capture backend is usable
    pub backend_available: bool,
    /// Number of live sessions
    pub active_sessions: usize,
    /// Process ID
    pub pid: u32,
    /// Uptime in seconds
    pub uptime_seconds: f64,
}

/// One row of the session listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session handle token
    pub handle: String,
    /// Portal flavor
    pub kind: SessionKind,
    /// Owning application id
    pub app_id: String,
    /// Current state name
    pub state: String,
    /// Number of live streams
    pub streams: usize,
}

impl PortalRequest {
    /// Serialize request to JSON bytes with newline terminator
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }

    /// Deserialize request from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl PortalResponse {
    /// Serialize response to JSON bytes with newline terminator
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }

    /// Deserialize response from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        PortalResponse::Error {
            message: message.into(),
        }
    }

    /// Portal result code: 0 ok, 1 cancelled, 2 error
    pub fn code(&self) -> u32 {
        match self {
            PortalResponse::Cancelled => 1,
            PortalResponse::Error { .. } => 2,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let msg = PortalRequest::Ping;
        let bytes = msg.to_bytes();
        let parsed = PortalRequest::from_bytes(&bytes[..bytes.len() - 1]).unwrap();
        assert!(matches!(parsed, PortalRequest::Ping));
    }

    #[test]
    fn test_response_serialization() {
        let resp = PortalResponse::Pong;
        let bytes = resp.to_bytes();
        let parsed = PortalResponse::from_bytes(&bytes[..bytes.len() - 1]).unwrap();
        assert!(matches!(parsed, PortalResponse::Pong));
    }

    #[test]
    fn test_response_codes() {
        assert_eq!(PortalResponse::Ok.code(), 0);
        assert_eq!(PortalResponse::Cancelled.code(), 1);
        assert_eq!(PortalResponse::error("boom").code(), 2);
    }
}
