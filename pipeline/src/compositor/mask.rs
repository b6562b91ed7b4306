use anprobe_types::geometry::{PixelBox, Polygon};
use image::{GrayImage, RgbaImage};
use rayon::prelude::*;

use crate::config::FEATHER_RADIUS_PX;
use crate::error::PipelineError;

/// Ephemeral core-face data for one compositing operation: the polygon, its
/// rasterized alpha mask, the feather-padded bounds the mask lives in, and
/// the masked source pixels. Never cached across operations.
pub struct CoreFaceData {
    pub polygon: Polygon,
    pub mask: GrayImage,
    pub padded_bounds: PixelBox,
    pub masked_pixels: RgbaImage,
}

/// Rasterizes the core-face polygon into an 8-bit alpha mask.
///
/// The mask is sized to the polygon's bounding box padded by the feather
/// radius and clamped to the image. Feathering blurs only the alpha
/// transition band; deep-interior pixels stay at full alpha so the face
/// center is never diluted. The radius is capped at [`FEATHER_RADIUS_PX`].
pub fn rasterize_core_mask(
    polygon: &Polygon,
    feather_radius: u32,
    image_width: u32,
    image_height: u32,
) -> Result<(GrayImage, PixelBox), PipelineError> {
    let feather = feather_radius.min(FEATHER_RADIUS_PX);
    let bounds = polygon.bounding_box();
    let padded = bounds.padded(feather, image_width, image_height);

    let width = padded.width as usize;
    let height = padded.height as usize;
    if width == 0 || height == 0 {
        return Err(PipelineError::FaceRegionExtraction(
            "core polygon collapsed to an empty mask".to_string(),
        ));
    }

    let mut buf = vec![0u8; width * height];
    let origin_x = padded.x as f32;
    let origin_y = padded.y as f32;
    buf.par_chunks_mut(width).enumerate().for_each(|(row, pixels)| {
        let y = origin_y + row as f32 + 0.5;
        for (col, value) in pixels.iter_mut().enumerate() {
            let x = origin_x + col as f32 + 0.5;
            if polygon.contains(x, y) {
                *value = 255;
            }
        }
    });

    if feather > 0 {
        box_blur(&mut buf, width, height, feather as usize);
    }

    let mask = GrayImage::from_raw(padded.width, padded.height, buf).ok_or_else(|| {
        PipelineError::FaceRegionExtraction("mask buffer size mismatch".to_string())
    })?;
    Ok((mask, padded))
}

/// Extracts the masked core-face pixels from a source region that shares the
/// mask's coordinate space.
pub fn extract_core_face(
    source: &RgbaImage,
    polygon: Polygon,
    feather_radius: u32,
) -> Result<CoreFaceData, PipelineError> {
    let (mask, padded_bounds) =
        rasterize_core_mask(&polygon, feather_radius, source.width(), source.height())?;

    let mut masked_pixels = RgbaImage::new(padded_bounds.width, padded_bounds.height);
    for (x, y, pixel) in masked_pixels.enumerate_pixels_mut() {
        let src_x = padded_bounds.x + x;
        let src_y = padded_bounds.y + y;
        if src_x < source.width() && src_y < source.height() {
            let src = source.get_pixel(src_x, src_y);
            let alpha = mask.get_pixel(x, y).0[0];
            *pixel = image::Rgba([src.0[0], src.0[1], src.0[2], alpha]);
        }
    }

    Ok(CoreFaceData {
        polygon,
        mask,
        padded_bounds,
        masked_pixels,
    })
}

/// Separable box blur over a single-channel buffer. Horizontal pass runs
/// rows in parallel; the vertical pass walks columns over a copy.
fn box_blur(buf: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = 2 * radius + 1;

    buf.par_chunks_mut(width).for_each(|row| {
        let source: Vec<u8> = row.to_vec();
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            let sum: u32 = source[lo..=hi].iter().map(|&v| v as u32).sum();
            // absent neighbors beyond the edge count as zero coverage
            row[x] = (sum / window as u32) as u8;
        }
    });

    let source = buf.to_vec();
    for x in 0..width {
        for y in 0..height {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            let mut sum = 0u32;
            for row in lo..=hi {
                sum += source[row * width + x] as u32;
            }
            buf[y * width + x] = (sum / window as u32) as u8;
        }
    }
}
