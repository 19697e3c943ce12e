//! Stream result publishing
//!
//! Formats accepted backend streams into the payload handed back to the
//! caller at the end of a successful Start.

use crate::types::{StreamHandle, StreamMetadata, StreamResult};

/// Build the result rows for a set of started streams
///
/// Acceptance order is preserved verbatim: the first entry is the primary
/// stream and consumers rely on that.
pub fn publish_streams(streams: &[StreamHandle]) -> Vec<StreamResult> {
    streams
        .iter()
        .map(|stream| StreamResult {
            node_id: stream.node_id,
            metadata: StreamMetadata {
                position: stream.source.position,
                size: stream.source.size,
                source_type: stream.source.kind.source_type_bits(),
            },
        })
        .collect()
}
