//! Capture backend boundary
//!
//! The platform layer (compositor integration) implements these traits;
//! the session layer only ever talks to the contract. `StaticBackend` is
//! the in-tree development implementation used by the daemon's dev mode
//! and by tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Result;
use crate::types::{CursorMode, SourceDescriptor, SourceTypes, StreamHandle};

/// Contract the platform capture layer exposes to the session layer
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Fail-fast probe; consulted at CreateSession time so that a missing
    /// capture transport short-circuits the whole negotiation
    fn is_available(&self) -> bool;

    /// Enumerate capturable sources matching the requested types
    ///
    /// May return fewer sources than physically exist if the live topology
    /// changed; an empty result is not an error.
    async fn enumerate_sources(&self, types: SourceTypes) -> Result<Vec<SourceDescriptor>>;

    /// Begin producing frames for one source
    ///
    /// The returned handle carries a node id unique among concurrently
    /// active streams.
    async fn start_stream(
        &self,
        source: &SourceDescriptor,
        cursor_mode: CursorMode,
    ) -> Result<StreamHandle>;

    /// Stop a stream; stopping an already-stopped handle is a no-op
    async fn stop_stream(&self, handle: &StreamHandle) -> Result<()>;
}

/// Remote-input sink for RemoteDesktop sessions
#[async_trait]
pub trait InputInjector: Send + Sync {
    /// Relative pointer motion
    async fn pointer_motion(&self, dx: f64, dy: f64) -> Result<()>;

    /// Pointer button press or release
    async fn pointer_button(&self, button: i32, pressed: bool) -> Result<()>;

    /// Pointer axis (scroll) motion
    async fn pointer_axis(&self, dx: f64, dy: f64) -> Result<()>;

    /// Keyboard key press or release
    async fn keyboard_keycode(&self, keycode: i32, pressed: bool) -> Result<()>;
}

/// Development backend over a fixed source table
///
/// Stream node ids increase monotonically and are never reused, so two
/// concurrent sessions always receive disjoint id sets.
pub struct StaticBackend {
    sources: Vec<SourceDescriptor>,
    next_node: AtomicU32,
    live: Mutex<HashSet<u32>>,
    available: bool,
}

impl StaticBackend {
    /// Create a backend serving the given sources
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self {
            sources,
            next_node: AtomicU32::new(1),
            live: Mutex::new(HashSet::new()),
            available: true,
        }
    }

    /// Create a backend whose availability probe fails
    pub fn unavailable() -> Self {
        Self {
            sources: Vec::new(),
            next_node: AtomicU32::new(1),
            live: Mutex::new(HashSet::new()),
            available: false,
        }
    }

    /// Number of streams currently live
    pub fn live_streams(&self) -> usize {
        self.live.lock().len()
    }
}

#[async_trait]
impl CaptureBackend for StaticBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn enumerate_sources(&self, types: SourceTypes) -> Result<Vec<SourceDescriptor>> {
        Ok(self
            .sources
            .iter()
            .filter(|source| types.accepts(source.kind))
            .cloned()
            .collect())
    }

    async fn start_stream(
        &self,
        source: &SourceDescriptor,
        cursor_mode: CursorMode,
    ) -> Result<StreamHandle> {
        let node_id = self.next_node.fetch_add(1, Ordering::SeqCst);
        self.live.lock().insert(node_id);
        debug!(node_id, source = %source.id, ?cursor_mode, "stream started");
        Ok(StreamHandle {
            node_id,
            source: source.clone(),
        })
    }

    async fn stop_stream(&self, handle: &StreamHandle) -> Result<()> {
        if self.live.lock().remove(&handle.node_id) {
            debug!(node_id = handle.node_id, "stream stopped");
        }
        Ok(())
    }
}

/// Input sink that discards events
///
/// Stands in where no compositor injection path is wired up.
pub struct NullInjector;

#[async_trait]
impl InputInjector for NullInjector {
    async fn pointer_motion(&self, dx: f64, dy: f64) -> Result<()> {
        trace!(dx, dy, "pointer motion discarded");
        Ok(())
    }

    async fn pointer_button(&self, button: i32, pressed: bool) -> Result<()> {
        trace!(button, pressed, "pointer button discarded");
        Ok(())
    }

    async fn pointer_axis(&self, dx: f64, dy: f64) -> Result<()> {
        trace!(dx, dy, "pointer axis discarded");
        Ok(())
    }

    async fn keyboard_keycode(&self, keycode: i32, pressed: bool) -> Result<()> {
        trace!(keycode, pressed, "keyboard keycode discarded");
        Ok(())
    }
}
