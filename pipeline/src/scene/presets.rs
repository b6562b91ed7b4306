use anprobe_types::scene::ScenePreset;
use strum::IntoEnumIterator;

/// Person-agnostic description of the empty environment for each preset.
/// Location, light quality, and camera intent only — never a subject.
pub fn anchor_zone(preset: ScenePreset) -> &'static str {
    match preset {
        ScenePreset::StudioWhite => {
            "clean neutral studio backdrop with a seamless white paper sweep, soft even key light"
        }
        ScenePreset::UrbanStreet => {
            "quiet city sidewalk with blurred storefronts, late-afternoon directional light"
        }
        ScenePreset::CafeInterior => {
            "warm cafe interior with wooden tables and window light from the left"
        }
        ScenePreset::LoftDaylight => {
            "industrial loft with large factory windows, diffuse midday light on concrete floors"
        }
        ScenePreset::CoastalGoldenHour => {
            "open coastal path at golden hour, low warm sun and a soft haze over the water"
        }
        ScenePreset::GardenOvercast => {
            "lush garden walkway under an overcast sky, flat shadowless light"
        }
        ScenePreset::OfficeModern => {
            "modern office lounge with glass partitions and cool panel lighting"
        }
        ScenePreset::NightCityBokeh => {
            "night street with out-of-focus neon signage and shallow pools of lamplight"
        }
    }
}

/// Comma-separated preset id list for the reasoning-model mapping prompt.
pub fn preset_id_listing() -> String {
    ScenePreset::iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_has_a_person_free_anchor_zone() {
        for preset in ScenePreset::iter() {
            let zone = anchor_zone(preset);
            assert!(!zone.is_empty());
            for word in ["person", "woman", "man", "model", "subject"] {
                assert!(
                    !zone.contains(word),
                    "{preset} anchor zone mentions {word}"
                );
            }
        }
    }

    #[test]
    fn listing_contains_the_safe_preset() {
        assert!(preset_id_listing().contains("studio_white"));
    }
}
