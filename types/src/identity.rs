use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedBox;

/// Opaque caller-supplied session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Blake3 content hash of an image, used as the lock-store key component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageHash([u8; 32]);

impl ImageHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short prefix is enough for log correlation
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// The extracted identity lock for one (session, identity image) pair.
///
/// Owned exclusively by the face lock store. The face crop covers the full
/// estimated face box; the upper-body crop extends below it for garment
/// continuity checks. Both are PNG-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceLockState {
    pub session_id: SessionId,
    pub image_hash: ImageHash,
    pub face_bounds: NormalizedBox,
    pub face_crop_png: Vec<u8>,
    pub upper_body_crop_png: Vec<u8>,
    pub created_at: SystemTime,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn image_hash_is_content_addressed() {
        let a = ImageHash::of(b"same bytes");
        let b = ImageHash::of(b"same bytes");
        let c = ImageHash::of(b"other bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn image_hash_display_is_short_hex() {
        let hash = ImageHash::of(b"anything");
        let shown = hash.to_string();
        assert_eq!(shown.len(), 16);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
