//! IPC server
//!
//! Listens on a Unix socket. Each client connection runs on its own task
//! and owns the sessions it creates: when the connection drops, every
//! session it opened is closed. Sandboxed callers may be killed abruptly,
//! and this is their primary cleanup path.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::protocol::{PortalRequest, PortalResponse, ServiceStatus, SessionSummary};
use super::socket_path;
use crate::error::{ArgonError, Result};
use crate::portal::PortalService;
use crate::session::SourceSelection;
use crate::types::{CursorMode, DeviceTypes, OwnerId, SessionHandle, SourceTypes};

/// IPC server that handles portal client connections
pub struct IpcServer {
    /// Path to the Unix socket
    socket_path: PathBuf,
    /// Listener for incoming connections
    listener: Option<UnixListener>,
    /// Shared portal service
    service: Arc<PortalService>,
    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,
    /// Connection id allocator
    next_owner: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl IpcServer {
    /// Create a new IPC server on the default socket path
    pub fn new(service: Arc<PortalService>) -> Self {
        Self::with_socket_path(service, socket_path())
    }

    /// Create a new IPC server on an explicit socket path
    pub fn with_socket_path(service: Arc<PortalService>, path: PathBuf) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            socket_path: path,
            listener: None,
            service,
            shutdown_tx,
            next_owner: AtomicU64::new(1),
            start_time: Instant::now(),
        }
    }

    /// Start listening for connections
    pub async fn start(&mut self) -> Result<()> {
        // Remove existing socket if present
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .map_err(|e| ArgonError::ipc(format!("Failed to remove old socket: {}", e)))?;
        }

        // Create parent directory if needed
        if let Some(parent) = self.socket_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ArgonError::ipc(format!("Failed to create socket directory: {}", e))
                })?;
            }
        }

        // Bind to socket
        let listener = UnixListener::bind(&self.socket_path).map_err(|e| {
            ArgonError::ipc(format!(
                "Failed to bind socket at {:?}: {}",
                self.socket_path, e
            ))
        })?;

        // Set socket permissions to owner-only (0600)
        // This prevents other users from connecting to our daemon
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&self.socket_path, permissions)
            .map_err(|e| ArgonError::ipc(format!("Failed to set socket permissions: {}", e)))?;

        info!("IPC server listening on {:?}", self.socket_path);
        self.listener = Some(listener);

        Ok(())
    }

    /// Get a receiver for shutdown signals
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Get a handle that can trigger shutdown
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Accept and serve connections until shutdown is signalled
    pub async fn serve(&self) -> Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| ArgonError::ipc("Server not started"))?;

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let owner = OwnerId::new(self.next_owner.fetch_add(1, Ordering::SeqCst));
                            debug!(%owner, "portal client connected");
                            let connection = Connection {
                                service: self.service.clone(),
                                shutdown_tx: self.shutdown_tx.clone(),
                                start_time: self.start_time,
                                owner,
                            };
                            tokio::spawn(async move { connection.run(stream).await });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("IPC server shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Clean up the socket file
    pub fn cleanup(&self) {
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            } else {
                debug!("Removed socket file {:?}", self.socket_path);
            }
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// One portal client connection
struct Connection {
    service: Arc<PortalService>,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Instant,
    owner: OwnerId,
}

impl Connection {
    /// Serve the connection until the client disconnects, then release
    /// every session it still owns
    async fn run(self, stream: UnixStream) {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!(owner = %self.owner, "portal client disconnected");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(owner = %self.owner, "error reading from portal client: {}", e);
                    break;
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (response, should_stop) = match PortalRequest::from_bytes(trimmed.as_bytes()) {
                Ok(request) => {
                    let should_stop = matches!(request, PortalRequest::Stop);
                    (self.handle_request(request).await, should_stop)
                }
                Err(e) => {
                    warn!("invalid portal request: {}", e);
                    (
                        PortalResponse::error(format!("Invalid request: {}", e)),
                        false,
                    )
                }
            };

            if let Err(e) = writer.write_all(&response.to_bytes()).await {
                error!("Failed to send portal response: {}", e);
                break;
            }

            if should_stop {
                info!("received stop command via IPC");
                let _ = self.shutdown_tx.send(());
                break;
            }
        }

        let closed = self.service.close_owned_by(self.owner).await;
        if closed > 0 {
            info!(owner = %self.owner, closed, "released sessions after disconnect");
        }
    }

    /// Dispatch one request to the portal service
    async fn handle_request(&self, request: PortalRequest) -> PortalResponse {
        match request {
            PortalRequest::CreateSession {
                session_handle,
                kind,
                app_id,
            } => {
                let handle = SessionHandle::new(session_handle);
                self.portal_result(
                    self.service
                        .create_session(self.owner, handle, kind, &app_id)
                        .await,
                )
            }
            PortalRequest::SelectSources {
                session_handle,
                types,
                multiple,
                cursor_mode,
            } => {
                let Some(types) = SourceTypes::from_bits(types) else {
                    return PortalResponse::error(format!("Invalid source types: {}", types));
                };
                let Some(cursor_mode) = CursorMode::from_bits(cursor_mode) else {
                    return PortalResponse::error(format!("Invalid cursor mode: {}", cursor_mode));
                };
                let selection = SourceSelection {
                    types,
                    multiple,
                    cursor_mode,
                };
                let handle = SessionHandle::new(session_handle);
                self.portal_result(self.service.select_sources(&handle, selection).await)
            }
            PortalRequest::SelectDevices {
                session_handle,
                devices,
            } => {
                let Some(devices) = DeviceTypes::from_bits(devices) else {
                    return PortalResponse::error(format!("Invalid device types: {}", devices));
                };
                let handle = SessionHandle::new(session_handle);
                self.portal_result(self.service.select_devices(&handle, devices).await)
            }
            PortalRequest::Start {
                session_handle,
                parent_window,
            } => {
                let handle = SessionHandle::new(session_handle);
                match self.service.start(&handle, parent_window).await {
                    Ok(started) => PortalResponse::Started {
                        streams: started.streams,
                        devices: started.devices.map(|d| d.bits()),
                    },
                    Err(ArgonError::Cancelled) => PortalResponse::Cancelled,
                    Err(e) => PortalResponse::error(e.to_string()),
                }
            }
            PortalRequest::CloseSession { session_handle } => {
                let handle = SessionHandle::new(session_handle);
                self.portal_result(self.service.close(&handle).await)
            }
            PortalRequest::NotifyPointerMotion {
                session_handle,
                dx,
                dy,
            } => {
                let handle = SessionHandle::new(session_handle);
                self.portal_result(self.service.notify_pointer_motion(&handle, dx, dy).await)
            }
            PortalRequest::NotifyPointerButton {
                session_handle,
                button,
                pressed,
            } => {
                let handle = SessionHandle::new(session_handle);
                self.portal_result(
                    self.service
                        .notify_pointer_button(&handle, button, pressed)
                        .await,
                )
            }
            PortalRequest::NotifyPointerAxis {
                session_handle,
                dx,
                dy,
            } => {
                let handle = SessionHandle::new(session_handle);
                self.portal_result(self.service.notify_pointer_axis(&handle, dx, dy).await)
            }
            PortalRequest::NotifyKeyboardKeycode {
                session_handle,
                keycode,
                pressed,
            } => {
                let handle = SessionHandle::new(session_handle);
                self.portal_result(
                    self.service
                        .notify_keyboard_keycode(&handle, keycode, pressed)
                        .await,
                )
            }
            PortalRequest::Ping => PortalResponse::Pong,
            PortalRequest::Status => PortalResponse::Status(self.status()),
            PortalRequest::Sessions => PortalResponse::Sessions(self.session_summaries().await),
            PortalRequest::Stop => PortalResponse::Stopping,
        }
    }

    /// Translate a portal-call result into a response; cancellation is a
    /// normal outcome, everything else surfaces as an error message
    fn portal_result(&self, result: Result<()>) -> PortalResponse {
        match result {
            Ok(()) => PortalResponse::Ok,
            Err(ArgonError::Cancelled) => PortalResponse::Cancelled,
            Err(e) => PortalResponse::error(e.to_string()),
        }
    }

    fn status(&self) -> ServiceStatus {
        ServiceStatus {
            backend_available: self.service.backend_available(),
            active_sessions: self.service.registry().len(),
            pid: std::process::id(),
            uptime_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }

    async fn session_summaries(&self) -> Vec<SessionSummary> {
        let registry = self.service.registry();
        let mut rows = Vec::new();
        for handle in registry.handles() {
            let Some(shared) = registry.lookup(&handle) else {
                continue;
            };
            let session = shared.lock().await;
            rows.push(SessionSummary {
                handle: handle.to_string(),
                kind: session.kind(),
                app_id: session.app_id().to_string(),
                state: session.state().to_string(),
                streams: session.streams().len(),
            });
        }
        rows
    }
}
