use base64::{Engine as _, engine::general_purpose};

use crate::error::{FramedeckError, FramedeckResult};

/// Name given to merged documents.
pub const MERGED_DOCUMENT_NAME: &str = "myHistory";

/// One animation still: an embedded base64 PNG plus metadata.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    pub name: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Always `false` for frames this crate produces; preserved on read.
    pub soft: bool,
    /// `data:image/<fmt>;base64,<payload>` URI.
    pub image_data: String,
}

/// A frame-list document as found on disk. Producers differ: a direct
/// image conversion emits the bare array, a merge emits the named wrapper.
/// Both shapes are valid on read.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AnimationDocument {
    Named { name: String, data: Vec<Frame> },
    Frames(Vec<Frame>),
}

impl AnimationDocument {
    pub fn into_frames(self) -> Vec<Frame> {
        match self {
            AnimationDocument::Frames(frames) => frames,
            AnimationDocument::Named { data, .. } => data,
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            AnimationDocument::Frames(frames) => frames.len(),
            AnimationDocument::Named { data, .. } => data.len(),
        }
    }
}

/// Wrap PNG bytes as a `data:image/png;base64,…` URI.
pub fn encode_png_data_uri(png_bytes: &[u8]) -> String {
    let mut uri = String::from("data:image/png;base64,");
    general_purpose::STANDARD.encode_string(png_bytes, &mut uri);
    uri
}

/// Extract the raw image bytes from a data URI. The format tag before the
/// `base64,` marker is ignored; the embedded payload decides how it decodes.
pub fn decode_data_uri(uri: &str) -> FramedeckResult<Vec<u8>> {
    let payload = uri
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .ok_or_else(|| {
            FramedeckError::decode("image_data is not a base64 data URI".to_string())
        })?;
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| FramedeckError::decode(format!("invalid base64 payload: {e}")))
}
