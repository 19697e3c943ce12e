//! Portal negotiation protocol
//!
//! Implements the ordered CreateSession → SelectSources → Start request
//! sequence shared by the ScreenCast and RemoteDesktop portals, plus
//! session closure and the remote-input forwarding calls.
//!
//! The session lock is never held across the picker or backend suspension
//! points; the `Starting` state is what rejects re-entrant Starts, and a
//! concurrent Close wins over a pending dialog via the session's close
//! signal.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::apps;
use crate::backend::{CaptureBackend, InputInjector};
use crate::error::{ArgonError, Result};
use crate::picker::{PickerReply, PickerRequest, SourcePicker};
use crate::publisher::publish_streams;
use crate::registry::{SessionRegistry, SharedSession};
use crate::session::{SessionState, SourceSelection};
use crate::types::{DeviceTypes, OwnerId, SessionHandle, SessionKind, StreamHandle, StreamResult};

/// Outcome of a successful Start
#[derive(Debug, Clone)]
pub struct StartedSession {
    /// Started streams, in acceptance order
    pub streams: Vec<StreamResult>,
    /// Granted input devices (RemoteDesktop sessions only)
    pub devices: Option<DeviceTypes>,
}

/// Shared negotiation logic for both portal flavors
pub struct PortalService {
    registry: Arc<SessionRegistry>,
    backend: Arc<dyn CaptureBackend>,
    picker: Arc<dyn SourcePicker>,
    input: Option<Arc<dyn InputInjector>>,
}

impl PortalService {
    /// Create a service over the given registry, backend, and picker
    pub fn new(
        registry: Arc<SessionRegistry>,
        backend: Arc<dyn CaptureBackend>,
        picker: Arc<dyn SourcePicker>,
    ) -> Self {
        Self {
            registry,
            backend,
            picker,
            input: None,
        }
    }

    /// Wire up a remote-input sink for RemoteDesktop sessions
    pub fn with_input(mut self, input: Arc<dyn InputInjector>) -> Self {
        self.input = Some(input);
        self
    }

    /// Get the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Whether the capture backend is usable
    pub fn backend_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Open a new negotiation session
    pub async fn create_session(
        &self,
        owner: OwnerId,
        handle: SessionHandle,
        kind: SessionKind,
        app_id: &str,
    ) -> Result<()> {
        info!(session = %handle, %kind, app_id, %owner, "CreateSession");
        if !self.backend.is_available() {
            warn!("capture backend is not available, rejecting session");
            return Err(ArgonError::Unavailable);
        }
        self.registry.create(handle, kind, app_id, owner)?;
        Ok(())
    }

    /// Record capture intent for a later Start; shows no UI
    pub async fn select_sources(
        &self,
        handle: &SessionHandle,
        selection: SourceSelection,
    ) -> Result<()> {
        info!(session = %handle, ?selection, "SelectSources");
        let shared = self.resolve(handle)?;
        let mut session = shared.lock().await;
        session.select_sources(selection)
    }

    /// Record requested input devices; RemoteDesktop sessions only
    pub async fn select_devices(&self, handle: &SessionHandle, devices: DeviceTypes) -> Result<()> {
        info!(session = %handle, %devices, "SelectDevices");
        let shared = self.resolve(handle)?;
        let mut session = shared.lock().await;
        session.select_devices(devices)
    }

    /// Run the consent dialog and start streaming
    ///
    /// The caller's request suspends here until the user responds. A
    /// cancelled dialog is a normal outcome, not an error path: the
    /// session is destroyed and `Cancelled` is returned. Per-source
    /// stream-start failures are tolerated as long as at least one stream
    /// comes up; a session that cannot establish any stream is destroyed.
    pub async fn start(
        &self,
        handle: &SessionHandle,
        parent_window: Option<String>,
    ) -> Result<StartedSession> {
        info!(session = %handle, ?parent_window, "Start");
        let shared = self.resolve(handle)?;

        let (selection, kind, app_id, requested_devices, mut closed_rx) = {
            let mut session = shared.lock().await;
            let selection = session.begin_start()?;
            (
                selection,
                session.kind(),
                session.app_id().to_string(),
                session.devices(),
                session.subscribe_closed(),
            )
        };

        let candidates = match self.backend.enumerate_sources(selection.types).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(session = %handle, "source enumeration failed: {}", e);
                self.destroy(handle, &shared).await;
                return Err(e);
            }
        };
        if candidates.is_empty() {
            warn!(session = %handle, "no capture sources matched the requested types");
            self.destroy(handle, &shared).await;
            return Err(ArgonError::NoSources);
        }

        let request = PickerRequest {
            app_label: apps::display_name(&app_id),
            candidates,
            multiple: selection.multiple,
            source_types: selection.types,
            device_types: (kind == SessionKind::RemoteDesktop).then_some(requested_devices),
            parent_window,
        };

        let reply = tokio::select! {
            reply = self.picker.pick(request) => reply,
            _ = closed_rx.recv() => {
                info!(session = %handle, "session closed while the dialog was pending");
                return Err(ArgonError::Cancelled);
            }
        };
        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %handle, "source selection dialog failed: {}", e);
                self.destroy(handle, &shared).await;
                return Err(e);
            }
        };
        let (accepted, granted) = match reply {
            PickerReply::Selected { sources, devices } => (sources, devices),
            PickerReply::Cancelled => {
                info!(session = %handle, "user cancelled source selection");
                self.destroy(handle, &shared).await;
                return Err(ArgonError::Cancelled);
            }
        };

        let mut streams = Vec::with_capacity(accepted.len());
        for source in &accepted {
            match self.backend.start_stream(source, selection.cursor_mode).await {
                Ok(stream) => streams.push(stream),
                Err(e) => {
                    warn!(session = %handle, source = %source.id, "stream start failed: {}", e);
                }
            }
        }
        if streams.is_empty() {
            warn!(session = %handle, "no stream could be started");
            self.destroy(handle, &shared).await;
            return Err(ArgonError::StreamStartFailed);
        }

        let mut session = shared.lock().await;
        if session.state() != SessionState::Starting {
            // Close raced us between dialog acceptance and publication.
            drop(session);
            info!(session = %handle, "session closed while streams were starting");
            self.stop_streams(handle, &streams).await;
            return Err(ArgonError::Cancelled);
        }

        let results = publish_streams(&streams);
        let granted =
            (kind == SessionKind::RemoteDesktop).then(|| granted.unwrap_or(requested_devices));
        session.mark_active(streams, granted);
        info!(session = %handle, streams = results.len(), "session active");

        Ok(StartedSession {
            streams: results,
            devices: granted,
        })
    }

    /// Close a session and release its streams
    ///
    /// Idempotent: closing an unknown or already-closed session is a
    /// no-op. Streams are torn down before the registry entry disappears.
    pub async fn close(&self, handle: &SessionHandle) -> Result<()> {
        let Some(shared) = self.registry.lookup(handle) else {
            debug!(session = %handle, "Close on unknown session is a no-op");
            return Ok(());
        };
        let streams = {
            let mut session = shared.lock().await;
            session.close()
        };
        self.stop_streams(handle, &streams).await;
        self.registry.remove(handle);
        info!(session = %handle, "session closed");
        Ok(())
    }

    /// Close every session owned by a connection
    ///
    /// The primary cleanup path: sandboxed callers may be killed abruptly,
    /// and their sessions must not outlive them.
    pub async fn close_owned_by(&self, owner: OwnerId) -> usize {
        let handles = self.registry.handles_owned_by(owner);
        let count = handles.len();
        for handle in handles {
            if let Err(e) = self.close(&handle).await {
                warn!(session = %handle, "cleanup close failed: {}", e);
            }
        }
        count
    }

    /// Close every live session; used at service shutdown
    pub async fn close_all(&self) -> usize {
        let handles = self.registry.handles();
        let count = handles.len();
        for handle in handles {
            if let Err(e) = self.close(&handle).await {
                warn!(session = %handle, "shutdown close failed: {}", e);
            }
        }
        count
    }

    /// Forward relative pointer motion into the session's desktop
    pub async fn notify_pointer_motion(
        &self,
        handle: &SessionHandle,
        dx: f64,
        dy: f64,
    ) -> Result<()> {
        self.ensure_device(handle, DeviceTypes::POINTER).await?;
        self.input()?.pointer_motion(dx, dy).await
    }

    /// Forward a pointer button event
    pub async fn notify_pointer_button(
        &self,
        handle: &SessionHandle,
        button: i32,
        pressed: bool,
    ) -> Result<()> {
        self.ensure_device(handle, DeviceTypes::POINTER).await?;
        self.input()?.pointer_button(button, pressed).await
    }

    /// Forward pointer axis (scroll) motion
    pub async fn notify_pointer_axis(
        &self,
        handle: &SessionHandle,
        dx: f64,
        dy: f64,
    ) -> Result<()> {
        self.ensure_device(handle, DeviceTypes::POINTER).await?;
        self.input()?.pointer_axis(dx, dy).await
    }

    /// Forward a keyboard key event
    pub async fn notify_keyboard_keycode(
        &self,
        handle: &SessionHandle,
        keycode: i32,
        pressed: bool,
    ) -> Result<()> {
        self.ensure_device(handle, DeviceTypes::KEYBOARD).await?;
        self.input()?.keyboard_keycode(keycode, pressed).await
    }

    fn resolve(&self, handle: &SessionHandle) -> Result<SharedSession> {
        self.registry
            .lookup(handle)
            .ok_or_else(|| ArgonError::NoSuchSession(handle.to_string()))
    }

    fn input(&self) -> Result<&Arc<dyn InputInjector>> {
        self.input.as_ref().ok_or(ArgonError::Unavailable)
    }

    async fn ensure_device(&self, handle: &SessionHandle, device: DeviceTypes) -> Result<()> {
        let shared = self.resolve(handle)?;
        let session = shared.lock().await;
        session.ensure_device(device)
    }

    /// Tear down a session whose Start failed irrecoverably
    async fn destroy(&self, handle: &SessionHandle, shared: &SharedSession) {
        {
            let mut session = shared.lock().await;
            if session.state() == SessionState::Closed {
                // A concurrent Close already cleaned up.
                return;
            }
            session.mark_failed();
        }
        self.registry.remove(handle);
        debug!(session = %handle, "session destroyed after failed start");
    }

    async fn stop_streams(&self, handle: &SessionHandle, streams: &[StreamHandle]) {
        for stream in streams {
            if let Err(e) = self.backend.stop_stream(stream).await {
                warn!(
                    session = %handle,
                    node_id = stream.node_id,
                    "stream teardown failed: {}",
                    e
                );
            }
        }
    }
}
