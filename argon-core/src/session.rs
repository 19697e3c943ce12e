//! Session state machine
//!
//! A session is one in-progress or active negotiation between one caller
//! and the service. Requests against a single session are serialized by
//! the registry's per-session lock; this module only validates and applies
//! transitions.

use tokio::sync::broadcast;

use crate::error::{ArgonError, Result};
use crate::types::{
    CursorMode, DeviceTypes, OwnerId, SessionHandle, SessionKind, SourceTypes, StreamHandle,
};

/// Lifecycle of one negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Just created; no sources selected
    Initial,
    /// SelectSources has been called at least once
    SourcesPending,
    /// Start is in progress; UI and backend setup pending
    Starting,
    /// At least one stream is live; selection is locked
    Active,
    /// Start could not establish any stream; terminal
    Failed,
    /// All resources released; terminal
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Initial => write!(f, "Initial"),
            SessionState::SourcesPending => write!(f, "SourcesPending"),
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Active => write!(f, "Active"),
            SessionState::Failed => write!(f, "Failed"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Capture intent recorded by SelectSources, consumed by Start
///
/// Each SelectSources call overwrites the previous selection wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSelection {
    /// Which source kinds the dialog should offer
    pub types: SourceTypes,
    /// Whether more than one source may be accepted
    pub multiple: bool,
    /// Cursor handling for started streams
    pub cursor_mode: CursorMode,
}

/// One negotiation/capability context, identified by an opaque token
pub struct Session {
    handle: SessionHandle,
    kind: SessionKind,
    app_id: String,
    owner: OwnerId,
    state: SessionState,
    selection: SourceSelection,
    /// Devices the caller asked for (RemoteDesktop); defaults to all
    devices: DeviceTypes,
    /// Devices the user actually granted, fixed at Start
    granted_devices: Option<DeviceTypes>,
    /// Whether the caller asked to share screens alongside remote input;
    /// set by SelectSources on RemoteDesktop sessions, never on ScreenCast
    screen_sharing: bool,
    streams: Vec<StreamHandle>,
    closed_tx: broadcast::Sender<()>,
}

impl Session {
    pub(crate) fn new(
        handle: SessionHandle,
        kind: SessionKind,
        app_id: String,
        owner: OwnerId,
    ) -> Self {
        let (closed_tx, _) = broadcast::channel(1);
        Self {
            handle,
            kind,
            app_id,
            owner,
            state: SessionState::Initial,
            selection: SourceSelection::default(),
            devices: DeviceTypes::all(),
            granted_devices: None,
            screen_sharing: false,
            streams: Vec::new(),
            closed_tx,
        }
    }

    /// Get the session handle
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Get the portal flavor
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Get the caller's application id (labeling only)
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Get the owning connection
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the recorded capture intent
    pub fn selection(&self) -> SourceSelection {
        self.selection
    }

    /// Get the requested device set
    pub fn devices(&self) -> DeviceTypes {
        self.devices
    }

    /// Get the granted device set, if Start has completed
    pub fn granted_devices(&self) -> Option<DeviceTypes> {
        self.granted_devices
    }

    /// Whether a RemoteDesktop session asked for screen sharing
    ///
    /// Distinguishes a capture-plus-input session from an input-only one;
    /// always false for ScreenCast sessions, which share screens by
    /// definition.
    pub fn screen_sharing(&self) -> bool {
        self.screen_sharing
    }

    /// Get the live streams; non-empty exactly when the session is Active
    pub fn streams(&self) -> &[StreamHandle] {
        &self.streams
    }

    /// Subscribe to the close signal; fires when Close interrupts a
    /// pending negotiation
    pub fn subscribe_closed(&self) -> broadcast::Receiver<()> {
        self.closed_tx.subscribe()
    }

    /// Record capture intent; valid before Start only
    pub fn select_sources(&mut self, selection: SourceSelection) -> Result<()> {
        match self.state {
            SessionState::Initial | SessionState::SourcesPending => {
                self.selection = selection;
                if self.kind == SessionKind::RemoteDesktop {
                    self.screen_sharing = true;
                }
                self.state = SessionState::SourcesPending;
                Ok(())
            }
            state => Err(ArgonError::invalid_state(format!(
                "cannot select sources for session {} in state {}",
                self.handle, state
            ))),
        }
    }

    /// Record requested input devices; RemoteDesktop sessions only
    pub fn select_devices(&mut self, devices: DeviceTypes) -> Result<()> {
        if self.kind != SessionKind::RemoteDesktop {
            return Err(ArgonError::invalid_state(format!(
                "cannot select devices for screen cast session {}",
                self.handle
            )));
        }
        match self.state {
            SessionState::Initial | SessionState::SourcesPending => {
                self.devices = devices;
                self.state = SessionState::SourcesPending;
                Ok(())
            }
            state => Err(ArgonError::invalid_state(format!(
                "cannot select devices for session {} in state {}",
                self.handle, state
            ))),
        }
    }

    /// Enter the Starting state, returning the selection Start will use
    pub fn begin_start(&mut self) -> Result<SourceSelection> {
        match self.state {
            SessionState::Initial | SessionState::SourcesPending => {
                self.state = SessionState::Starting;
                Ok(self.selection)
            }
            SessionState::Starting => Err(ArgonError::AlreadyStarting(self.handle.to_string())),
            state => Err(ArgonError::invalid_state(format!(
                "cannot start session {} in state {}",
                self.handle, state
            ))),
        }
    }

    /// Enter the Active state with the started streams
    pub fn mark_active(&mut self, streams: Vec<StreamHandle>, granted: Option<DeviceTypes>) {
        debug_assert_eq!(self.state, SessionState::Starting);
        debug_assert!(!streams.is_empty());
        self.streams = streams;
        self.granted_devices = granted;
        self.state = SessionState::Active;
    }

    /// Enter the terminal Failed state after an unsuccessful Start
    pub fn mark_failed(&mut self) {
        self.streams.clear();
        self.state = SessionState::Failed;
    }

    /// Enter the terminal Closed state, interrupting any pending
    /// negotiation, and hand back the streams for backend teardown
    pub fn close(&mut self) -> Vec<StreamHandle> {
        let _ = self.closed_tx.send(());
        self.state = SessionState::Closed;
        std::mem::take(&mut self.streams)
    }

    /// Validate an input-injection request against state, kind, and grant
    pub fn ensure_device(&self, device: DeviceTypes) -> Result<()> {
        if self.kind != SessionKind::RemoteDesktop {
            return Err(ArgonError::invalid_state(format!(
                "session {} is not a remote desktop session",
                self.handle
            )));
        }
        if self.state != SessionState::Active {
            return Err(ArgonError::invalid_state(format!(
                "session {} is not active",
                self.handle
            )));
        }
        match self.granted_devices {
            Some(granted) if granted.contains(device) => Ok(()),
            _ => Err(ArgonError::invalid_state(format!(
                "device {} was not granted for session {}",
                device, self.handle
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceDescriptor;

    fn session(kind: SessionKind) -> Session {
        Session::new(
            SessionHandle::new("s1"),
            kind,
            "org.example.App".to_string(),
            OwnerId::new(1),
        )
    }

    fn stream(node_id: u32) -> StreamHandle {
        StreamHandle {
            node_id,
            source: SourceDescriptor::output("DP-1", "Display", (0, 0), (1920, 1080)),
        }
    }

    #[test]
    fn test_select_sources_overwrites() {
        let mut s = session(SessionKind::ScreenCast);
        assert_eq!(s.state(), SessionState::Initial);

        let first = SourceSelection {
            types: SourceTypes::Monitor,
            multiple: false,
            cursor_mode: CursorMode::Embedded,
        };
        s.select_sources(first).unwrap();
        assert_eq!(s.state(), SessionState::SourcesPending);
        assert_eq!(s.selection(), first);

        let second = SourceSelection {
            types: SourceTypes::Window,
            multiple: true,
            cursor_mode: CursorMode::Hidden,
        };
        s.select_sources(second).unwrap();
        assert_eq!(s.state(), SessionState::SourcesPending);
        assert_eq!(s.selection(), second);
    }

    #[test]
    fn test_select_sources_locked_after_start() {
        let mut s = session(SessionKind::ScreenCast);
        s.begin_start().unwrap();
        s.mark_active(vec![stream(7)], None);
        assert_eq!(s.state(), SessionState::Active);

        let err = s.select_sources(SourceSelection::default()).unwrap_err();
        assert!(matches!(err, ArgonError::InvalidState(_)));
        assert_eq!(s.streams().len(), 1);
    }

    #[test]
    fn test_start_from_initial_uses_defaults() {
        let mut s = session(SessionKind::ScreenCast);
        let selection = s.begin_start().unwrap();
        assert_eq!(selection, SourceSelection::default());
        assert_eq!(s.state(), SessionState::Starting);
    }

    #[test]
    fn test_reentrant_start_rejected() {
        let mut s = session(SessionKind::ScreenCast);
        s.begin_start().unwrap();
        let err = s.begin_start().unwrap_err();
        assert!(matches!(err, ArgonError::AlreadyStarting(_)));
    }

    #[test]
    fn test_start_rejected_when_active() {
        let mut s = session(SessionKind::ScreenCast);
        s.begin_start().unwrap();
        s.mark_active(vec![stream(7)], None);
        let err = s.begin_start().unwrap_err();
        assert!(matches!(err, ArgonError::InvalidState(_)));
    }

    #[test]
    fn test_close_releases_streams() {
        let mut s = session(SessionKind::ScreenCast);
        s.begin_start().unwrap();
        s.mark_active(vec![stream(7), stream(8)], None);

        let streams = s.close();
        assert_eq!(streams.len(), 2);
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.streams().is_empty());
    }

    #[test]
    fn test_close_signals_pending_waiters() {
        let mut s = session(SessionKind::ScreenCast);
        let mut rx = s.subscribe_closed();
        s.close();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_select_sources_enables_screen_sharing_for_remote_desktop() {
        let mut s = session(SessionKind::RemoteDesktop);
        assert!(!s.screen_sharing());

        s.select_sources(SourceSelection::default()).unwrap();
        assert!(s.screen_sharing());
    }

    #[test]
    fn test_input_only_session_never_shares_screens() {
        let mut s = session(SessionKind::RemoteDesktop);
        s.select_devices(DeviceTypes::POINTER).unwrap();
        assert!(!s.screen_sharing());
    }

    #[test]
    fn test_screen_sharing_stays_false_for_screencast() {
        let mut s = session(SessionKind::ScreenCast);
        s.select_sources(SourceSelection::default()).unwrap();
        assert!(!s.screen_sharing());
    }

    #[test]
    fn test_select_devices_screencast_rejected() {
        let mut s = session(SessionKind::ScreenCast);
        let err = s.select_devices(DeviceTypes::all()).unwrap_err();
        assert!(matches!(err, ArgonError::InvalidState(_)));
    }

    #[test]
    fn test_device_grant_checked() {
        let mut s = session(SessionKind::RemoteDesktop);
        s.select_devices(DeviceTypes::KEYBOARD).unwrap();
        s.begin_start().unwrap();
        s.mark_active(vec![stream(7)], Some(DeviceTypes::KEYBOARD));

        assert!(s.ensure_device(DeviceTypes::KEYBOARD).is_ok());
        assert!(s.ensure_device(DeviceTypes::POINTER).is_err());
    }

    #[test]
    fn test_ensure_device_requires_active() {
        let s = session(SessionKind::RemoteDesktop);
        assert!(s.ensure_device(DeviceTypes::POINTER).is_err());
    }

    #[test]
    fn test_failed_session_holds_no_streams() {
        let mut s = session(SessionKind::ScreenCast);
        s.begin_start().unwrap();
        s.mark_failed();
        assert_eq!(s.state(), SessionState::Failed);
        assert!(s.streams().is_empty());
    }
}
