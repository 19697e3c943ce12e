//! Mock infrastructure for testing
//!
//! Provides a scripted consent picker and a capture backend with
//! controllable per-source failures.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use argon_core::backend::CaptureBackend;
use argon_core::error::{ArgonError, Result};
use argon_core::picker::{PickerReply, PickerRequest, SourcePicker};
use argon_core::types::{CursorMode, SourceDescriptor, SourceTypes, StreamHandle};

/// Create a monitor output descriptor
pub fn monitor(id: &str, label: &str) -> SourceDescriptor {
    SourceDescriptor::output(id, label, (0, 0), (1920, 1080))
}

/// Create an application window descriptor
pub fn window(id: &str, label: &str) -> SourceDescriptor {
    SourceDescriptor::window(id, label, (1280, 720))
}

/// Backend whose `start_stream` fails for the listed source ids
pub struct FlakyBackend {
    sources: Vec<SourceDescriptor>,
    fail_ids: Vec<String>,
    next_node: AtomicU32,
    started: Mutex<Vec<u32>>,
    stopped: Mutex<Vec<u32>>,
}

impl FlakyBackend {
    pub fn new(sources: Vec<SourceDescriptor>, fail_ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            sources,
            fail_ids: fail_ids.iter().map(|id| id.to_string()).collect(),
            next_node: AtomicU32::new(1),
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
        })
    }

    /// Node ids handed out so far, in order
    pub fn started(&self) -> Vec<u32> {
        self.started.lock().clone()
    }

    /// Node ids that have been stopped, in order
    pub fn stopped(&self) -> Vec<u32> {
        self.stopped.lock().clone()
    }
}

#[async_trait]
impl CaptureBackend for FlakyBackend {
    fn is_available(&self) -> bool {
        true
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
        _cursor_mode: CursorMode,
    ) -> Result<StreamHandle> {
        if self.fail_ids.contains(&source.id) {
            return Err(ArgonError::backend(format!(
                "induced failure for {}",
                source.id
            )));
        }
        let node_id = self.next_node.fetch_add(1, Ordering::SeqCst);
        self.started.lock().push(node_id);
        Ok(StreamHandle {
            node_id,
            source: source.clone(),
        })
    }

    async fn stop_stream(&self, handle: &StreamHandle) -> Result<()> {
        self.stopped.lock().push(handle.node_id);
        Ok(())
    }
}

/// Scripted consent dialog behavior
pub enum PickerScript {
    /// Accept every candidate, in enumeration order
    AcceptAll,
    /// Accept only the first candidate
    AcceptFirst,
    /// Accept the candidates with the listed ids, in the listed order
    AcceptIds(Vec<String>),
    /// Decline the request
    Cancel,
    /// Never resolve; exercises close-during-dialog
    Hang,
}

/// Picker driven by a fixed script
pub struct ScriptedPicker {
    script: PickerScript,
    invocations: AtomicUsize,
}

impl ScriptedPicker {
    pub fn new(script: PickerScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            invocations: AtomicUsize::new(0),
        })
    }

    pub fn accept_ids(ids: &[&str]) -> Arc<Self> {
        Self::new(PickerScript::AcceptIds(
            ids.iter().map(|id| id.to_string()).collect(),
        ))
    }

    /// How many times the dialog was shown
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourcePicker for ScriptedPicker {
    async fn pick(&self, request: PickerRequest) -> Result<PickerReply> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            PickerScript::AcceptAll => Ok(PickerReply::Selected {
                sources: request.candidates,
                devices: request.device_types,
            }),
            PickerScript::AcceptFirst => Ok(PickerReply::Selected {
                sources: request.candidates.into_iter().take(1).collect(),
                devices: request.device_types,
            }),
            PickerScript::AcceptIds(ids) => {
                let sources = ids
                    .iter()
                    .filter_map(|id| request.candidates.iter().find(|c| &c.id == id).cloned())
                    .collect();
                Ok(PickerReply::Selected {
                    sources,
                    devices: request.device_types,
                })
            }
            PickerScript::Cancel => Ok(PickerReply::Cancelled),
            PickerScript::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
