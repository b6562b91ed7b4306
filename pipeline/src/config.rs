use std::time::Duration;

use anprobe_types::engine::Engine;

/// Feathered-edge radius for the core-face overlay. Kept deliberately small:
/// larger radii visibly bleed identity-defining detail into the generated
/// surroundings.
pub const FEATHER_RADIUS_PX: u32 = 4;

/// Compositing must measurably improve similarity, not merely be "fine".
pub const SIM_IMPROVEMENT_MIN: f32 = 0.05;
/// Absolute similarity floor after compositing.
pub const SIM_ABSOLUTE_FLOOR: f32 = 0.80;

/// Faces smaller than this fraction of the largest detected face are treated
/// as reflections or background people.
pub const FACE_AREA_RATIO_MIN: f32 = 0.60;
pub const MAX_SUBJECT_YAW_DEGREES: f32 = 30.0;
pub const MAX_SUBJECT_ROLL_DEGREES: f32 = 20.0;

/// Pairwise variant difference below this score (0-100) means the pair is
/// too similar and the caller should regenerate with stronger
/// differentiation instructions.
pub const VARIANT_DIFFERENCE_FLOOR: u8 = 30;

pub const EXTERNAL_CALL_TIMEOUT: Duration = Duration::from_secs(90);
/// Single bounded retry for transient transport failures only.
pub const TRANSIENT_RETRY_LIMIT: u32 = 1;

pub const LOCK_ENTRY_TTL: Duration = Duration::from_secs(30 * 60);
pub const LOCK_STORE_CAPACITY: u64 = 1024;

/// Fixed per-engine generation parameters. Temperature is never
/// request-tunable: temperature variance is a primary cause of identity
/// drift on the identity-critical engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub model_id: &'static str,
    pub temperature: f32,
}

pub fn engine_settings(engine: Engine) -> EngineSettings {
    match engine {
        Engine::IdentityFast => EngineSettings {
            model_id: "imagen-identity-fast-002",
            temperature: 0.06,
        },
        Engine::IdentityLockedHighFidelity => EngineSettings {
            model_id: "imagen-identity-locked-hf-001",
            temperature: 0.05,
        },
        Engine::CreativeFree => EngineSettings {
            model_id: "imagen-creative-003",
            temperature: 0.30,
        },
    }
}

/// Tunable pipeline knobs, injected rather than read from process-wide
/// state so tests can run with isolated configurations.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub feather_radius_px: u32,
    pub sim_improvement_min: f32,
    pub sim_absolute_floor: f32,
    pub face_area_ratio_min: f32,
    pub max_subject_yaw_degrees: f32,
    pub max_subject_roll_degrees: f32,
    pub variant_difference_floor: u8,
    pub external_call_timeout: Duration,
    pub lock_entry_ttl: Duration,
    pub lock_store_capacity: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feather_radius_px: FEATHER_RADIUS_PX,
            sim_improvement_min: SIM_IMPROVEMENT_MIN,
            sim_absolute_floor: SIM_ABSOLUTE_FLOOR,
            face_area_ratio_min: FACE_AREA_RATIO_MIN,
            max_subject_yaw_degrees: MAX_SUBJECT_YAW_DEGREES,
            max_subject_roll_degrees: MAX_SUBJECT_ROLL_DEGREES,
            variant_difference_floor: VARIANT_DIFFERENCE_FLOOR,
            external_call_timeout: EXTERNAL_CALL_TIMEOUT,
            lock_entry_ttl: LOCK_ENTRY_TTL,
            lock_store_capacity: LOCK_STORE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn set_external_call_timeout(mut self, timeout: Duration) -> Self {
        self.external_call_timeout = timeout;
        self
    }

    pub fn set_lock_entry_ttl(mut self, ttl: Duration) -> Self {
        self.lock_entry_ttl = ttl;
        self
    }

    pub fn set_lock_store_capacity(mut self, capacity: u64) -> Self {
        self.lock_store_capacity = capacity;
        self
    }
}
