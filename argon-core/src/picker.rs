//! Source selection boundary
//!
//! The trusted consent dialog lives outside this crate; the session layer
//! hands it a request and waits for the user's decision. The call may
//! suspend indefinitely (the user can leave the dialog open), and the
//! service interrupts it when the owning session closes mid-dialog.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DeviceTypes, SourceDescriptor, SourceTypes};

/// Everything the consent dialog needs to render a picker
#[derive(Debug, Clone)]
pub struct PickerRequest {
    /// Display name of the requesting application
    pub app_label: String,
    /// Candidate sources, in enumeration order
    pub candidates: Vec<SourceDescriptor>,
    /// Whether more than one source may be accepted
    pub multiple: bool,
    /// The filter the candidates were enumerated with
    pub source_types: SourceTypes,
    /// Device grants requested alongside (RemoteDesktop sessions only)
    pub device_types: Option<DeviceTypes>,
    /// Opaque parent-window hint passed through from the caller
    pub parent_window: Option<String>,
}

/// Outcome of the consent dialog
#[derive(Debug, Clone)]
pub enum PickerReply {
    /// Accepted subset, in the order the user picked them
    Selected {
        sources: Vec<SourceDescriptor>,
        devices: Option<DeviceTypes>,
    },
    /// User declined
    Cancelled,
}

/// The dialog surface the service invokes during Start
#[async_trait]
pub trait SourcePicker: Send + Sync {
    /// Present the candidates and wait for the user's decision
    async fn pick(&self, request: PickerRequest) -> Result<PickerReply>;
}

/// Development picker: accepts the first candidate (all of them when
/// `multiple` is set) and grants every requested device
pub struct AcceptFirstPicker;

#[async_trait]
impl SourcePicker for AcceptFirstPicker {
    async fn pick(&self, request: PickerRequest) -> Result<PickerReply> {
        if request.candidates.is_empty() {
            return Ok(PickerReply::Cancelled);
        }
        let sources = if request.multiple {
            request.candidates
        } else {
            request.candidates.into_iter().take(1).collect()
        };
        Ok(PickerReply::Selected {
            sources,
            devices: request.device_types,
        })
    }
}
