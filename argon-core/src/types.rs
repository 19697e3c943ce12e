//! Core types for Argon
//!
//! These types represent the vocabulary shared between the session layer,
//! the capture backend, and the IPC surface.

use serde::{Deserialize, Serialize};

/// Opaque, caller-supplied token identifying one session
///
/// Unique for the lifetime of the process; never reused while the session
/// is live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Wrap a caller-supplied token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionHandle {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Portal flavor a session was created for; immutable after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Screen/window capture only
    ScreenCast,
    /// Capture plus remote input injection
    RemoteDesktop,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::ScreenCast => write!(f, "ScreenCast"),
            SessionKind::RemoteDesktop => write!(f, "RemoteDesktop"),
        }
    }
}

/// Kind of capturable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A monitor output
    Output,
    /// An application window
    Window,
}

impl SourceKind {
    /// Portal wire bits for this kind (1 = monitor, 2 = window)
    pub fn source_type_bits(&self) -> u32 {
        match self {
            SourceKind::Output => 1,
            SourceKind::Window => 2,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Output => write!(f, "Output"),
            SourceKind::Window => write!(f, "Window"),
        }
    }
}

/// Requested source-type filter for a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceTypes {
    /// Only monitor outputs
    #[default]
    Monitor,
    /// Only application windows
    Window,
    /// Both monitors and windows
    Both,
}

impl SourceTypes {
    /// Parse the portal bitmask (1 = monitor, 2 = window, 3 = both)
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            1 => Some(Self::Monitor),
            2 => Some(Self::Window),
            3 => Some(Self::Both),
            _ => None,
        }
    }

    /// Portal bitmask for this filter
    pub fn bits(&self) -> u32 {
        match self {
            Self::Monitor => 1,
            Self::Window => 2,
            Self::Both => 3,
        }
    }

    /// Whether a source of the given kind passes this filter
    pub fn accepts(&self, kind: SourceKind) -> bool {
        match self {
            Self::Monitor => kind == SourceKind::Output,
            Self::Window => kind == SourceKind::Window,
            Self::Both => true,
        }
    }
}

/// Cursor capture mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Hide cursor in capture
    Hidden,
    /// Show cursor embedded in capture frames
    #[default]
    Embedded,
    /// Cursor metadata only (compositor-dependent)
    Metadata,
}

impl CursorMode {
    /// Parse the portal bitmask (1 = hidden, 2 = embedded, 4 = metadata)
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            1 => Some(Self::Hidden),
            2 => Some(Self::Embedded),
            4 => Some(Self::Metadata),
            _ => None,
        }
    }

    /// Portal bitmask for this mode
    pub fn bits(&self) -> u32 {
        match self {
            Self::Hidden => 1,
            Self::Embedded => 2,
            Self::Metadata => 4,
        }
    }
}

/// Input device grant set for RemoteDesktop sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceTypes(u32);

impl DeviceTypes {
    /// Keyboard events
    pub const KEYBOARD: Self = Self(1);
    /// Pointer motion, buttons, and axes
    pub const POINTER: Self = Self(2);
    /// Touchscreen events
    pub const TOUCHSCREEN: Self = Self(4);

    const MASK: u32 = 7;

    /// No devices
    pub fn empty() -> Self {
        Self(0)
    }

    /// Every device type
    pub fn all() -> Self {
        Self(Self::MASK)
    }

    /// Parse the portal bitmask; unknown bits are rejected
    pub fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::MASK != 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    /// Portal bitmask for this set
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Whether every device in `other` is in this set
    pub fn contains(&self, other: DeviceTypes) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for DeviceTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for DeviceTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::KEYBOARD) {
            names.push("keyboard");
        }
        if self.contains(Self::POINTER) {
            names.push("pointer");
        }
        if self.contains(Self::TOUCHSCREEN) {
            names.push("touchscreen");
        }
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

/// One capturable unit as enumerated by the backend
///
/// Produced fresh on each enumeration call; never cached across negotiation
/// steps, since sources can appear and disappear between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// What kind of source this is
    pub kind: SourceKind,
    /// Backend-specific identifier (e.g., "DP-2" or a window id)
    pub id: String,
    /// Human-readable label shown in the selection dialog
    pub label: String,
    /// Top-left corner in compositor coordinates; used for UI ordering only
    pub position: (i32, i32),
    /// Size in pixels
    pub size: (u32, u32),
}

impl SourceDescriptor {
    /// Create a monitor output descriptor
    pub fn output(
        id: impl Into<String>,
        label: impl Into<String>,
        position: (i32, i32),
        size: (u32, u32),
    ) -> Self {
        Self {
            kind: SourceKind::Output,
            id: id.into(),
            label: label.into(),
            position,
            size,
        }
    }

    /// Create an application window descriptor
    pub fn window(id: impl Into<String>, label: impl Into<String>, size: (u32, u32)) -> Self {
        Self {
            kind: SourceKind::Window,
            id: id.into(),
            label: label.into(),
            position: (0, 0),
            size,
        }
    }
}

impl std::fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}) - {} ({}x{})",
            self.kind, self.id, self.label, self.size.0, self.size.1
        )
    }
}

/// Live stream of one source
///
/// The node id is assigned by the backend and unique among concurrently
/// active streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamHandle {
    /// Backend-assigned stream node id
    pub node_id: u32,
    /// The source this stream captures
    pub source: SourceDescriptor,
}

/// Per-stream properties returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    /// Top-left corner in compositor coordinates
    pub position: (i32, i32),
    /// Size in pixels
    pub size: (u32, u32),
    /// Portal source-type bits (1 = monitor, 2 = window)
    pub source_type: u32,
}

/// One (id, metadata) row of a successful Start result
///
/// Rows are ordered by acceptance, never re-sorted: downstream consumers
/// rely on the first stream being the primary one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamResult {
    /// Backend-assigned stream node id
    pub node_id: u32,
    /// Stream properties
    pub metadata: StreamMetadata,
}

/// Identity of the connection that owns a session
///
/// Used for disconnect-triggered cleanup; the application id string is
/// carried separately and used only for labeling UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Wrap a raw connection id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw connection id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn{}", self.0)
    }
}
