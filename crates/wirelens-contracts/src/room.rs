use serde::{Deserialize, Serialize};

/// Identifier of the inspection context (room) that owns a fixed set
/// of reference exemplars. Owned by the upstream metadata service.
pub type ContextId = i64;

/// Room detail body returned by the metadata service. Paths are
/// relative to the shared upload root (`/uploads/...`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRefs {
    #[serde(default)]
    pub normal_images: Vec<String>,
    #[serde(default)]
    pub abnormal_images: Vec<String>,
}

impl RoomRefs {
    /// A room is only usable for inspection when both exemplar sides
    /// are present.
    pub fn has_both_sides(&self) -> bool {
        !self.normal_images.is_empty() && !self.abnormal_images.is_empty()
    }
}
