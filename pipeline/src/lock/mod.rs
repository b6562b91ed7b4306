use std::io::Cursor;
use std::sync::Arc;
use std::time::SystemTime;

use anprobe_types::geometry::PixelBox;
use anprobe_types::identity::{FaceLockState, ImageHash, SessionId};
use image::{DynamicImage, ImageFormat};
use moka::future::Cache;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::facegeo::{heuristic, FaceGeometryProvider};

/// Upper-body crop width, as a multiple of the face-box width.
const UPPER_BODY_WIDTH_FACTOR: f32 = 2.2;
/// Upper-body crop height, as a multiple of the face-box height.
const UPPER_BODY_HEIGHT_FACTOR: f32 = 2.6;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LockKey {
    session: SessionId,
    hash: ImageHash,
}

/// Per-session cache of identity locks, keyed by (session id, content hash).
///
/// Concurrent reads are free; population races on the same key resolve as
/// first-writer-wins with every other caller reusing the winner's entry.
/// Entries expire by TTL or capacity eviction, and are explicitly
/// invalidated when a session's identity image changes or the session ends.
pub struct FaceLockStore {
    entries: Cache<LockKey, Arc<FaceLockState>>,
    provider: Arc<dyn FaceGeometryProvider>,
}

impl FaceLockStore {
    pub fn new(provider: Arc<dyn FaceGeometryProvider>, config: &PipelineConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.lock_store_capacity)
            .time_to_live(config.lock_entry_ttl)
            .support_invalidation_closures()
            .build();
        Self { entries, provider }
    }

    /// Returns the lock for this (session, image) pair, extracting it on
    /// first sight of the image hash and reusing the cached entry afterwards.
    #[tracing::instrument(skip(self, image_bytes), fields(session = %session))]
    pub async fn acquire(
        &self,
        session: &SessionId,
        image_bytes: &[u8],
    ) -> Result<Arc<FaceLockState>, PipelineError> {
        let hash = ImageHash::of(image_bytes);
        let key = LockKey {
            session: session.clone(),
            hash,
        };

        let provider = Arc::clone(&self.provider);
        let session = session.clone();
        let bytes = image_bytes.to_vec();

        self.entries
            .try_get_with(key, async move {
                tracing::debug!(%hash, "extracting new face lock");
                tokio::task::spawn_blocking(move || {
                    build_lock_state(provider.as_ref(), session, hash, &bytes)
                })
                .await
                .map_err(|e| PipelineError::FaceRegionExtraction(e.to_string()))?
                .map(Arc::new)
            })
            .await
            .map_err(|err: Arc<PipelineError>| (*err).clone())
    }

    /// Drops the lock for one specific identity image.
    pub async fn invalidate(&self, session: &SessionId, hash: ImageHash) {
        self.entries
            .invalidate(&LockKey {
                session: session.clone(),
                hash,
            })
            .await;
    }

    /// Drops every lock belonging to a session, e.g. on session end.
    pub fn invalidate_session(&self, session: &SessionId) {
        let target = session.clone();
        if let Err(err) = self
            .entries
            .invalidate_entries_if(move |key, _| key.session == target)
        {
            tracing::warn!(%session, error = %err, "session invalidation predicate rejected");
        }
    }

    /// Approximate number of live lock entries, for observability.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

fn build_lock_state(
    provider: &dyn FaceGeometryProvider,
    session: SessionId,
    hash: ImageHash,
    bytes: &[u8],
) -> Result<FaceLockState, PipelineError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PipelineError::InvalidInputImage(e.to_string()))?;
    let (width, height) = (img.width(), img.height());

    let bounds = match provider.detect(&img) {
        Some(geometry) => geometry.bounds,
        None => {
            log::debug!("geometry provider found no face, using aspect-ratio fallback");
            heuristic::estimate_bounds(width, height)
        }
    };

    let face_px = bounds.to_pixels(width, height);
    let face_crop = img.crop_imm(face_px.x, face_px.y, face_px.width, face_px.height);
    let body_px = upper_body_box(&face_px, width, height);
    let body_crop = img.crop_imm(body_px.x, body_px.y, body_px.width, body_px.height);

    Ok(FaceLockState {
        session_id: session,
        image_hash: hash,
        face_bounds: bounds,
        face_crop_png: encode_png(&face_crop)?,
        upper_body_crop_png: encode_png(&body_crop)?,
        created_at: SystemTime::now(),
        active: true,
    })
}

/// Face box widened and extended downward to cover the upper body, clamped
/// to the image.
fn upper_body_box(face: &PixelBox, image_width: u32, image_height: u32) -> PixelBox {
    let extra_w = (face.width as f32 * (UPPER_BODY_WIDTH_FACTOR - 1.0) / 2.0) as u32;
    let x = face.x.saturating_sub(extra_w);
    let right = (face.right() + extra_w).min(image_width);
    let bottom = (face.y + (face.height as f32 * UPPER_BODY_HEIGHT_FACTOR) as u32).min(image_height);
    PixelBox {
        x,
        y: face.y,
        width: (right - x).max(1),
        height: (bottom - face.y).max(1),
    }
}

pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| PipelineError::FaceRegionExtraction(e.to_string()))?;
    Ok(buf.into_inner())
}
