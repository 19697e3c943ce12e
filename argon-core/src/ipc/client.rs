//! IPC client
//!
//! Connects to the running daemon to issue portal calls and control
//! commands. Portal calls return the raw `PortalResponse` so callers can
//! inspect the result code; control commands unwrap into typed values.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use super::protocol::{PortalRequest, PortalResponse, ServiceStatus, SessionSummary};
use super::socket_path;
use crate::error::{ArgonError, Result};
use crate::types::{CursorMode, DeviceTypes, SessionKind, SourceTypes};

/// Default connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read/write timeout
///
/// Generous, since Start blocks on the consent dialog.
const IO_TIMEOUT: Duration = Duration::from_secs(120);

/// IPC client for communicating with the daemon
pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    /// Connect to the daemon on the default socket path
    pub async fn connect() -> Result<Self> {
        Self::connect_to(&socket_path()).await
    }

    /// Connect to the daemon on an explicit socket path
    pub async fn connect_to(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ArgonError::ipc(format!(
                "Daemon socket not found at {:?}",
                path
            )));
        }

        let stream = tokio::time::timeout(CONNECT_TIMEOUT, UnixStream::connect(path))
            .await
            .map_err(|_| ArgonError::ipc("Connection timed out"))?
            .map_err(|e| ArgonError::ipc(format!("Failed to connect to daemon: {}", e)))?;

        debug!("Connected to daemon at {:?}", path);

        Ok(Self { stream })
    }

    /// Send a request and receive the response
    pub async fn request(&mut self, request: PortalRequest) -> Result<PortalResponse> {
        self.request_with_timeout(request, IO_TIMEOUT).await
    }

    /// Send a request and receive the response with a custom timeout
    pub async fn request_with_timeout(
        &mut self,
        request: PortalRequest,
        timeout: Duration,
    ) -> Result<PortalResponse> {
        let (reader, mut writer) = self.stream.split();

        let request_bytes = request.to_bytes();
        tokio::time::timeout(timeout, writer.write_all(&request_bytes))
            .await
            .map_err(|_| ArgonError::ipc("Write timed out"))?
            .map_err(|e| ArgonError::ipc(format!("Failed to send request: {}", e)))?;

        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        tokio::time::timeout(timeout, reader.read_line(&mut line))
            .await
            .map_err(|_| ArgonError::ipc("Read timed out"))?
            .map_err(|e| ArgonError::ipc(format!("Failed to read response: {}", e)))?;

        PortalResponse::from_bytes(line.trim().as_bytes())
            .map_err(|e| ArgonError::ipc(format!("Invalid response: {}", e)))
    }

    /// Open a new negotiation session
    pub async fn create_session(
        &mut self,
        session_handle: &str,
        kind: SessionKind,
        app_id: &str,
    ) -> Result<PortalResponse> {
        self.request(PortalRequest::CreateSession {
            session_handle: session_handle.to_string(),
            kind,
            app_id: app_id.to_string(),
        })
        .await
    }

    /// Record capture intent for a later Start
    pub async fn select_sources(
        &mut self,
        session_handle: &str,
        types: SourceTypes,
        multiple: bool,
        cursor_mode: CursorMode,
    ) -> Result<PortalResponse> {
        self.request(PortalRequest::SelectSources {
            session_handle: session_handle.to_string(),
            types: types.bits(),
            multiple,
            cursor_mode: cursor_mode.bits(),
        })
        .await
    }

    /// Record requested input devices (RemoteDesktop sessions)
    pub async fn select_devices(
        &mut self,
        session_handle: &str,
        devices: DeviceTypes,
    ) -> Result<PortalResponse> {
        self.request(PortalRequest::SelectDevices {
            session_handle: session_handle.to_string(),
            devices: devices.bits(),
        })
        .await
    }

    /// Run the consent dialog and start streaming
    pub async fn start(
        &mut self,
        session_handle: &str,
        parent_window: Option<&str>,
    ) -> Result<PortalResponse> {
        self.request(PortalRequest::Start {
            session_handle: session_handle.to_string(),
            parent_window: parent_window.map(str::to_string),
        })
        .await
    }

    /// Release a session and its streams
    pub async fn close_session(&mut self, session_handle: &str) -> Result<PortalResponse> {
        self.request(PortalRequest::CloseSession {
            session_handle: session_handle.to_string(),
        })
        .await
    }

    /// Ping the daemon to check if it's alive
    pub async fn ping(&mut self) -> Result<bool> {
        match self.request(PortalRequest::Ping).await {
            Ok(PortalResponse::Pong) => Ok(true),
            Ok(_) => Ok(false),
            Err(_) => Ok(false),
        }
    }

    /// Get the current daemon status
    pub async fn status(&mut self) -> Result<ServiceStatus> {
        match self.request(PortalRequest::Status).await? {
            PortalResponse::Status(status) => Ok(status),
            PortalResponse::Error { message } => Err(ArgonError::Ipc(message)),
            _ => Err(ArgonError::ipc("Unexpected response")),
        }
    }

    /// List live sessions
    pub async fn sessions(&mut self) -> Result<Vec<SessionSummary>> {
        match self.request(PortalRequest::Sessions).await? {
            PortalResponse::Sessions(rows) => Ok(rows),
            PortalResponse::Error { message } => Err(ArgonError::Ipc(message)),
            _ => Err(ArgonError::ipc("Unexpected response")),
        }
    }

    /// Request the daemon to stop
    pub async fn stop(&mut self) -> Result<()> {
        match self.request(PortalRequest::Stop).await? {
            PortalResponse::Stopping => Ok(()),
            PortalResponse::Error { message } => Err(ArgonError::Ipc(message)),
            _ => Err(ArgonError::ipc("Unexpected response")),
        }
    }
}
