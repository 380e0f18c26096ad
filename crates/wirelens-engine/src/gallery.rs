use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use wirelens_contracts::{ContextId, RelayError, RoomRefs};

use crate::codec::{encode_reference_image, EncodedImage};
use crate::truncate_text;

const UPSTREAM_BODY_MAX_CHARS: usize = 512;

/// Encoded exemplar sets for one inspection context. Both sides are
/// non-empty by construction; a gallery is only ever published whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceGallery {
    pub normal: Vec<EncodedImage>,
    pub abnormal: Vec<EncodedImage>,
}

/// Read access to the upstream room-metadata service.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn fetch_room(&self, context: ContextId, bearer: &str) -> Result<RoomRefs, RelayError>;
}

/// Production directory client: `GET {base}/room/{context}` with the
/// caller's bearer token forwarded.
pub struct HttpRoomDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRoomDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RelayError::UpstreamUnavailable(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RoomDirectory for HttpRoomDirectory {
    async fn fetch_room(&self, context: ContextId, bearer: &str) -> Result<RoomRefs, RelayError> {
        let url = format!("{}/room/{context}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|err| RelayError::UpstreamUnavailable(format!("{url}: {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RelayError::UpstreamUnavailable(format!("{url}: {err}")))?;
        if !status.is_success() {
            return Err(RelayError::UpstreamRejected {
                status: status.as_u16(),
                body: truncate_text(&body, UPSTREAM_BODY_MAX_CHARS),
            });
        }
        serde_json::from_str::<RoomRefs>(&body).map_err(|err| {
            RelayError::UpstreamUnavailable(format!("{url}: invalid room payload: {err}"))
        })
    }
}

/// Process-wide read-through cache of reference galleries, keyed by
/// inspection context. Misses for the same context are single-flighted
/// so the directory is called once and no reader ever observes a
/// half-populated gallery. Entries live until invalidated or process
/// restart.
pub struct GalleryCache {
    directory: Arc<dyn RoomDirectory>,
    uploads_root: PathBuf,
    galleries: RwLock<HashMap<ContextId, Arc<ReferenceGallery>>>,
    inflight: Mutex<HashMap<ContextId, Arc<Mutex<()>>>>,
}

impl GalleryCache {
    pub fn new(directory: Arc<dyn RoomDirectory>, uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            directory,
            uploads_root: uploads_root.into(),
            galleries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_fetch(
        &self,
        context: ContextId,
        bearer: &str,
    ) -> Result<Arc<ReferenceGallery>, RelayError> {
        if let Some(gallery) = self.galleries.read().await.get(&context) {
            return Ok(Arc::clone(gallery));
        }

        let _flight = self.acquire_flight(context).await;
        if let Some(gallery) = self.galleries.read().await.get(&context) {
            info!(context, "gallery cache hit after coalesced fetch");
            return Ok(Arc::clone(gallery));
        }

        info!(context, "gallery cache miss; fetching room metadata");
        let refs = self.directory.fetch_room(context, bearer).await?;
        if !refs.has_both_sides() {
            return Err(RelayError::bad_request(
                "room has no registered normal or abnormal reference images",
            ));
        }

        let normal = self.encode_side(&refs.normal_images)?;
        let abnormal = self.encode_side(&refs.abnormal_images)?;
        let gallery = Arc::new(ReferenceGallery { normal, abnormal });
        self.galleries
            .write()
            .await
            .insert(context, Arc::clone(&gallery));
        info!(
            context,
            normal = gallery.normal.len(),
            abnormal = gallery.abnormal.len(),
            "gallery cached"
        );
        Ok(gallery)
    }

    /// Drops the cached gallery for a context. Invalidating an absent
    /// context is a no-op. Serialized against an in-flight fetch for
    /// the same context through the flight lock.
    pub async fn invalidate(&self, context: ContextId) {
        let _flight = self.acquire_flight(context).await;
        let removed = self.galleries.write().await.remove(&context).is_some();
        info!(context, removed, "gallery invalidated");
    }

    async fn acquire_flight(&self, context: ContextId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(context)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    fn encode_side(&self, relative: &[String]) -> Result<Vec<EncodedImage>, RelayError> {
        relative
            .iter()
            .map(|rel| encode_reference_image(&self.resolve_upload_path(rel)))
            .collect()
    }

    /// Translates an upload-relative location (`/uploads/x.jpg`) into
    /// an absolute path under the configured uploads root.
    fn resolve_upload_path(&self, relative: &str) -> PathBuf {
        let trimmed = relative.trim_start_matches('/');
        let trimmed = trimmed.strip_prefix("uploads/").unwrap_or(trimmed);
        self.uploads_root.join(trimmed)
    }
}

impl std::fmt::Debug for GalleryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryCache")
            .field("uploads_root", &self.uploads_root)
            .finish_non_exhaustive()
    }
}
