use anprobe_types::geometry::{PixelBox, Point2, Polygon};

/// Vertical position of the eye line within the face box.
const EYE_LINE_FRACTION: f32 = 0.32;
/// Vertical position of the widest (inner-cheek) line.
const CHEEK_LINE_FRACTION: f32 = 0.58;
/// Vertical position of the lower edge, above the chin.
const LOWER_EDGE_FRACTION: f32 = 0.86;
/// Horizontal inset of the inner-cheek points from the box edges.
const CHEEK_INSET_FRACTION: f32 = 0.18;
/// Half-width of the eye-level top edge, as a fraction of box width.
const EYE_EDGE_HALF_WIDTH: f32 = 0.22;
/// Half-width of the lower edge, as a fraction of box width.
const LOWER_EDGE_HALF_WIDTH: f32 = 0.20;

/// Builds the minimal core-face polygon from a full face bounding box.
///
/// The result is a diamond-like hexagon strictly inside the box: top edge at
/// eye level (forehead and hairline excluded), widest points along the
/// inner-cheek lines (ears excluded), lower edge above the chin (jaw
/// silhouette excluded). Only this region is ever pixel-copied; over-copying
/// hair, forehead, or jaw is what produces visible seams against hats,
/// hairstyle changes, and relit scenes.
pub fn build_core_polygon(face_box: &PixelBox) -> Polygon {
    let x = face_box.x as f32;
    let y = face_box.y as f32;
    let w = face_box.width as f32;
    let h = face_box.height as f32;
    let cx = x + w / 2.0;

    let eye_y = y + h * EYE_LINE_FRACTION;
    let cheek_y = y + h * CHEEK_LINE_FRACTION;
    let lower_y = y + h * LOWER_EDGE_FRACTION;

    let points = vec![
        Point2::new(cx - w * EYE_EDGE_HALF_WIDTH, eye_y),
        Point2::new(cx + w * EYE_EDGE_HALF_WIDTH, eye_y),
        Point2::new(x + w * (1.0 - CHEEK_INSET_FRACTION), cheek_y),
        Point2::new(cx + w * LOWER_EDGE_HALF_WIDTH, lower_y),
        Point2::new(cx - w * LOWER_EDGE_HALF_WIDTH, lower_y),
        Point2::new(x + w * CHEEK_INSET_FRACTION, cheek_y),
    ];

    Polygon::new(points).expect("core polygon always has six vertices")
}

/// Axis-aligned rectangle fully inscribed in the core polygon, inset so a
/// feathered mask is fully opaque across every pixel of it.
///
/// This is the region similarity scoring compares: identity-defining pixels
/// only, with no transition band and none of the bounding-box corners that
/// fall outside the polygon. An inset of twice the feather radius keeps the
/// whole blur window inside the polygon along its slanted edges.
pub fn core_interior_box(face_box: &PixelBox, inset: u32) -> PixelBox {
    let x = face_box.x as f32;
    let y = face_box.y as f32;
    let w = face_box.width as f32;
    let h = face_box.height as f32;
    let cx = x + w / 2.0;
    let inset = inset as f32;

    let half = w * LOWER_EDGE_HALF_WIDTH - inset;
    let top = y + h * EYE_LINE_FRACTION + inset;
    let bottom = y + h * LOWER_EDGE_FRACTION - inset;

    PixelBox {
        x: (cx - half).max(0.0).floor() as u32,
        y: top.max(0.0).floor() as u32,
        width: ((half * 2.0).max(1.0)) as u32,
        height: ((bottom - top).max(1.0)) as u32,
    }
}

/// Landmark-driven variant used when a real detector supplied the five
/// canonical points (left eye, right eye, nose tip, mouth corners).
pub fn core_polygon_from_landmarks(landmarks: &[Point2; 5]) -> Polygon {
    let eye_y = (landmarks[0].y + landmarks[1].y) / 2.0;
    let mouth_y = (landmarks[3].y + landmarks[4].y) / 2.0;
    let lower_y = mouth_y + (mouth_y - eye_y) * 0.35;
    let eye_span = (landmarks[1].x - landmarks[0].x).abs().max(1.0);
    let cx = (landmarks[0].x + landmarks[1].x) / 2.0;
    let cheek_half = eye_span * 0.85;
    let cheek_y = landmarks[2].y;

    let points = vec![
        Point2::new(landmarks[0].x, eye_y),
        Point2::new(landmarks[1].x, eye_y),
        Point2::new(cx + cheek_half, cheek_y),
        Point2::new(landmarks[4].x, lower_y),
        Point2::new(landmarks[3].x, lower_y),
        Point2::new(cx - cheek_half, cheek_y),
    ];

    Polygon::new(points).expect("landmark polygon always has six vertices")
}
