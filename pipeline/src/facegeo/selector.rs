use anprobe_types::attempt::DetectedFace;

use crate::config::{FACE_AREA_RATIO_MIN, MAX_SUBJECT_ROLL_DEGREES, MAX_SUBJECT_YAW_DEGREES};

/// Deterministically selects the subject face among all detections in a
/// generated image.
///
/// Mirrors, posters, and background people produce extra faces; exactly one
/// detection may ever be treated as the subject, and failing to find one is
/// a hard failure for the attempt. Faces are never averaged or blended.
#[tracing::instrument(skip(faces), fields(candidates = faces.len()))]
pub fn select_primary_face(
    faces: Vec<DetectedFace>,
    image_width: u32,
    image_height: u32,
) -> Option<DetectedFace> {
    if faces.is_empty() {
        return None;
    }
    if faces.len() == 1 {
        return faces.into_iter().next();
    }

    let max_area = faces.iter().map(|f| f.area).fold(0.0f32, f32::max);

    let survivors: Vec<DetectedFace> = faces
        .into_iter()
        .filter(|face| {
            // small faces are reflections or background people
            if face.area < max_area * FACE_AREA_RATIO_MIN {
                tracing::debug!(area = face.area, max_area, "rejected undersized face");
                return false;
            }
            if face.yaw_degrees.map(f32::abs).unwrap_or(0.0) > MAX_SUBJECT_YAW_DEGREES {
                tracing::debug!(yaw = ?face.yaw_degrees, "rejected oblique face");
                return false;
            }
            if face.roll_degrees.map(f32::abs).unwrap_or(0.0) > MAX_SUBJECT_ROLL_DEGREES {
                tracing::debug!(roll = ?face.roll_degrees, "rejected tilted face");
                return false;
            }
            true
        })
        .collect();

    survivors
        .into_iter()
        .map(|mut face| {
            face.score = face.area / (face.center_distance + 1.0);
            face
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anprobe_types::geometry::PixelBox;
    use pretty_assertions::assert_eq;

    fn face(x: u32, y: u32, side: u32, yaw: Option<f32>, roll: Option<f32>) -> DetectedFace {
        DetectedFace::from_bounds(
            PixelBox::new(x, y, side, side).unwrap(),
            yaw,
            roll,
            1000,
            1000,
        )
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert_eq!(select_primary_face(vec![], 1000, 1000), None);
    }

    #[test]
    fn single_face_is_returned_unchanged() {
        let only = face(100, 100, 200, Some(45.0), None);
        let selected = select_primary_face(vec![only.clone()], 1000, 1000).unwrap();
        // even an oblique face wins when it is the only candidate
        assert_eq!(selected, only);
    }

    #[test]
    fn undersized_reflections_are_dropped() {
        let subject = face(400, 300, 300, None, None);
        let mirror = face(20, 20, 80, None, None);
        let selected = select_primary_face(vec![mirror, subject.clone()], 1000, 1000).unwrap();
        assert_eq!(selected.bounds, subject.bounds);
    }

    #[test]
    fn oblique_and_tilted_faces_are_dropped() {
        let subject = face(380, 300, 280, Some(5.0), Some(2.0));
        let turned = face(100, 300, 300, Some(40.0), None);
        let tilted = face(650, 300, 300, None, Some(25.0));
        let selected =
            select_primary_face(vec![turned, subject.clone(), tilted], 1000, 1000).unwrap();
        assert_eq!(selected.bounds, subject.bounds);
    }

    #[test]
    fn centered_face_beats_equal_sized_corner_face() {
        let centered = face(400, 400, 200, None, None);
        let corner = face(0, 0, 200, None, None);
        let selected = select_primary_face(vec![corner, centered.clone()], 1000, 1000).unwrap();
        assert_eq!(selected.bounds, centered.bounds);
        assert!(selected.score > 0.0);
    }

    #[test]
    fn all_candidates_filtered_means_no_subject() {
        let a = face(100, 100, 300, Some(60.0), None);
        let b = face(600, 100, 290, Some(-45.0), None);
        assert_eq!(select_primary_face(vec![a, b], 1000, 1000), None);
    }
}
