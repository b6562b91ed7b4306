use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error(
        "bounding box coordinates are not monotonic: left {left}, top {top}, right {right}, bottom {bottom}"
    )]
    NonMonotonicBox {
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
    },
    #[error("polygon requires at least three points, got {0}")]
    DegeneratePolygon(usize),
    #[error("pixel box with zero area: width {width}, height {height}")]
    EmptyPixelBox { width: u32, height: u32 },
}

/// A face bounding box normalized to [0, 1] image space.
///
/// Construction clamps every coordinate into [0, 1] and rejects boxes whose
/// coordinates are not strictly monotonic (left < right, top < bottom), so a
/// value of this type is always a usable region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl NormalizedBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Result<Self, GeometryError> {
        let left = left.clamp(0.0, 1.0);
        let top = top.clamp(0.0, 1.0);
        let right = right.clamp(0.0, 1.0);
        let bottom = bottom.clamp(0.0, 1.0);
        if left >= right || top >= bottom {
            return Err(GeometryError::NonMonotonicBox {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Projects into pixel space for an image of the given dimensions.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelBox {
        let x = ((self.left * image_width as f32).floor() as u32)
            .min(image_width.saturating_sub(1));
        let y = ((self.top * image_height as f32).floor() as u32)
            .min(image_height.saturating_sub(1));
        let w = ((self.width() * image_width as f32).ceil() as u32).max(1);
        let h = ((self.height() * image_height as f32).ceil() as u32).max(1);
        PixelBox {
            x,
            y,
            width: w.min(image_width - x),
            height: h.min(image_height - y),
        }
    }
}

/// An axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyPixelBox { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }

    pub fn center(&self) -> Point2 {
        Point2 {
            x: self.x as f32 + self.width as f32 / 2.0,
            y: self.y as f32 + self.height as f32 / 2.0,
        }
    }

    /// Grows the box by `pad` on every side, clamped to the image bounds.
    pub fn padded(&self, pad: u32, image_width: u32, image_height: u32) -> PixelBox {
        let x = self.x.saturating_sub(pad);
        let y = self.y.saturating_sub(pad);
        let right = (self.right() + pad).min(image_width);
        let bottom = (self.bottom() + pad).min(image_height);
        PixelBox {
            x,
            y,
            width: right.saturating_sub(x).max(1),
            height: bottom.saturating_sub(y).max(1),
        }
    }

    pub fn intersect(&self, other: &PixelBox) -> Option<PixelBox> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(PixelBox {
            x,
            y,
            width: right - x,
            height: bottom - y,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An ordered list of vertices in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point2>,
}

impl Polygon {
    pub fn new(points: Vec<Point2>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::DegeneratePolygon(points.len()));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn bounding_box(&self) -> PixelBox {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        PixelBox {
            x: min_x.max(0.0).floor() as u32,
            y: min_y.max(0.0).floor() as u32,
            width: ((max_x - min_x).ceil() as u32).max(1),
            height: ((max_y - min_y).ceil() as u32).max(1),
        }
    }

    /// Even-odd crossing test against the polygon edges.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let mut inside = false;
        let n = self.points.len();
        let mut j = n - 1;
        for i in 0..n {
            let pi = &self.points[i];
            let pj = &self.points[j];
            if ((pi.y > y) != (pj.y > y))
                && (x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Applies independent horizontal/vertical scale factors and a translation.
    pub fn scaled_and_translated(&self, scale_x: f32, scale_y: f32, dx: f32, dy: f32) -> Polygon {
        Polygon {
            points: self
                .points
                .iter()
                .map(|p| Point2 {
                    x: p.x * scale_x + dx,
                    y: p.y * scale_y + dy,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalized_box_clamps_and_rejects_non_monotonic() {
        let bbox = NormalizedBox::new(-0.2, 0.1, 0.8, 1.4).unwrap();
        assert_eq!(bbox.left(), 0.0);
        assert_eq!(bbox.bottom(), 1.0);

        assert!(NormalizedBox::new(0.9, 0.1, 0.2, 0.5).is_err());
        assert!(NormalizedBox::new(0.1, 0.7, 0.5, 0.7).is_err());
    }

    #[test]
    fn pixel_projection_stays_inside_image() {
        let bbox = NormalizedBox::new(0.25, 0.05, 0.75, 0.45).unwrap();
        let px = bbox.to_pixels(384, 512);
        assert!(px.right() <= 384);
        assert!(px.bottom() <= 512);
        assert!(px.area() > 0.0);
    }

    #[test]
    fn polygon_contains_centroid_of_triangle() {
        let poly = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(5.0, 10.0),
        ])
        .unwrap();
        assert!(poly.contains(5.0, 3.0));
        assert!(!poly.contains(0.0, 9.0));
    }

    #[test]
    fn polygon_scaling_maps_bounding_box() {
        let poly = Polygon::new(vec![
            Point2::new(10.0, 10.0),
            Point2::new(30.0, 10.0),
            Point2::new(20.0, 30.0),
        ])
        .unwrap();
        let mapped = poly.scaled_and_translated(2.0, 0.5, 100.0, 0.0);
        let bbox = mapped.bounding_box();
        assert_eq!(bbox.x, 120);
        assert_eq!(bbox.y, 5);
    }
}
