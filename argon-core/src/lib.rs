//! Argon Core Library
//!
//! Capture-session brokering for sandboxed desktop applications.
//!
//! This library provides:
//! - A concurrency-safe session registry shared across untrusted callers
//! - The ordered CreateSession → SelectSources → Start negotiation protocol
//!   for the ScreenCast and RemoteDesktop portals
//! - Trait boundaries for the platform capture layer and the trusted
//!   source-selection dialog
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌────────────────┐    ┌─────────────────┐
//! │ IPC Server │───▶│ Portal Service │───▶│ Capture Backend │
//! │ (callers)  │    │ (sessions, UI) │    │ (live streams)  │
//! └────────────┘    └────────────────┘    └─────────────────┘
//! ```

pub mod apps;
pub mod backend;
pub mod config;
pub mod error;
pub mod ipc;
pub mod picker;
pub mod portal;
pub mod publisher;
pub mod registry;
pub mod session;
pub mod types;

pub use backend::{CaptureBackend, InputInjector, StaticBackend};
pub use error::{ArgonError, Result};
pub use picker::{PickerReply, PickerRequest, SourcePicker};
pub use portal::{PortalService, StartedSession};
pub use registry::SessionRegistry;
pub use session::{Session, SessionState, SourceSelection};
pub use types::{
    CursorMode, DeviceTypes, OwnerId, SessionHandle, SessionKind, SourceDescriptor, SourceKind,
    SourceTypes, StreamHandle, StreamResult,
};
