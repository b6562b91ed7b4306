pub mod mask;

use anprobe_types::attempt::DetectedFace;
use anprobe_types::geometry::PixelBox;
use anprobe_types::identity::FaceLockState;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::error::PipelineError;
use crate::facegeo::polygon::build_core_polygon;
use mask::rasterize_core_mask;

/// Result of compositing the locked face back over a generated image.
pub struct CompositeOutcome {
    pub image: RgbaImage,
    pub composited: bool,
    /// Feather-padded core-face region in the generated image's space, for
    /// downstream similarity comparison.
    pub core_bounds: PixelBox,
}

/// Overwrites the core face region of a generated image with pixels derived
/// from the original identity image.
///
/// The original core-face box is mapped into the generated image's selected
/// face box with independent horizontal/vertical scale factors; the locked
/// pixels are resized to the target size and overlaid through a small
/// feathered alpha edge. The face center remains 100% original pixels; only
/// the alpha transition is ever blurred.
pub struct FaceCompositor {
    feather_radius: u32,
}

impl FaceCompositor {
    pub fn new(feather_radius: u32) -> Self {
        Self { feather_radius }
    }

    #[tracing::instrument(skip_all, fields(subject = ?subject.bounds))]
    pub fn composite_face_back(
        &self,
        generated: &DynamicImage,
        lock: &FaceLockState,
        subject: &DetectedFace,
    ) -> Result<CompositeOutcome, PipelineError> {
        let crop = image::load_from_memory(&lock.face_crop_png)
            .map_err(|e| PipelineError::FaceRegionExtraction(e.to_string()))?;
        let (crop_w, crop_h) = (crop.width(), crop.height());
        let target = subject.bounds;

        // independent axis scales from original face space to generated face space
        let scale_x = target.width as f32 / crop_w as f32;
        let scale_y = target.height as f32 / crop_h as f32;

        let resized = if (crop_w, crop_h) == (target.width, target.height) {
            crop.to_rgba8()
        } else {
            crop.resize_exact(target.width, target.height, FilterType::CatmullRom)
                .to_rgba8()
        };

        let crop_box = PixelBox::new(0, 0, crop_w, crop_h)?;
        let target_polygon = build_core_polygon(&crop_box).scaled_and_translated(
            scale_x,
            scale_y,
            target.x as f32,
            target.y as f32,
        );

        let (alpha, core_bounds) = rasterize_core_mask(
            &target_polygon,
            self.feather_radius,
            generated.width(),
            generated.height(),
        )?;

        let mut output = generated.to_rgba8();
        let image_box = PixelBox::new(0, 0, output.width(), output.height())?;
        let Some(region) = core_bounds.intersect(&image_box) else {
            tracing::warn!("core face region fell outside the generated image");
            return Ok(CompositeOutcome {
                image: output,
                composited: false,
                core_bounds,
            });
        };

        for y in region.y..region.bottom() {
            for x in region.x..region.right() {
                let a = alpha.get_pixel(x - core_bounds.x, y - core_bounds.y).0[0] as u32;
                if a == 0 {
                    continue;
                }
                // source coordinate in the resized lock crop
                let Some(sx) = x.checked_sub(target.x) else { continue };
                let Some(sy) = y.checked_sub(target.y) else { continue };
                if sx >= resized.width() || sy >= resized.height() {
                    continue;
                }
                let src = resized.get_pixel(sx, sy);
                let dst = output.get_pixel_mut(x, y);
                for c in 0..3 {
                    let blended =
                        (src.0[c] as u32 * a + dst.0[c] as u32 * (255 - a) + 127) / 255;
                    dst.0[c] = blended as u8;
                }
                dst.0[3] = 255;
            }
        }

        Ok(CompositeOutcome {
            image: output,
            composited: true,
            core_bounds,
        })
    }
}
