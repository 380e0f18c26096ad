use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use wirelens_contracts::RelayError;

/// Transport encoding of one source image file: standard base64 of
/// the raw bytes plus the media type inferred from the extension.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub media_type: &'static str,
    pub data: String,
}

impl EncodedImage {
    /// Renders the `data:` URL form the inference service expects in
    /// an image message part.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Reads and encodes a reference image. A missing or unreadable file
/// surfaces as `AssetUnavailable` so a gallery fetch aborts without
/// caching a partial result.
pub fn encode_reference_image(path: &Path) -> Result<EncodedImage, RelayError> {
    encode_image_file(path).map_err(|err| RelayError::AssetUnavailable(err))
}

/// Reads and encodes the staged subject image. The staged copy is
/// local request state, so failure here is a storage fault.
pub fn encode_subject_image(path: &Path) -> Result<EncodedImage, RelayError> {
    encode_image_file(path).map_err(RelayError::Storage)
}

fn encode_image_file(path: &Path) -> Result<EncodedImage, String> {
    let bytes =
        fs::read(path).map_err(|err| format!("failed reading {}: {err}", path.display()))?;
    Ok(EncodedImage {
        media_type: mime_for_path(path),
        data: BASE64.encode(bytes),
    })
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}
