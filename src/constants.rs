// Particle field presets and tuning constants.
//
// These constants express intended behavior (update cadences, motion
// coefficients, camera framing) and keep magic numbers out of the code.

/// Coarse device-capability classification driving quality/quantity
/// trade-offs. Detected once at mount; immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceTier {
    Low,
    Normal,
    High,
}

/// Per-tier quality knobs: frame-rate target, per-preset instance counts and
/// the per-frame probability that any given instance's transform is
/// recomputed (load shedding).
#[derive(Clone, Copy, Debug)]
pub struct PerformanceProfile {
    pub target_fps: f32,
    pub group_counts: [usize; 3],
    pub update_fraction: f32,
}

pub const fn profile_for(tier: PerformanceTier) -> PerformanceProfile {
    match tier {
        PerformanceTier::Low => PerformanceProfile {
            target_fps: 30.0,
            group_counts: [220, 120, 60],
            update_fraction: 0.5,
        },
        PerformanceTier::Normal => PerformanceProfile {
            target_fps: 45.0,
            group_counts: [420, 240, 120],
            update_fraction: 0.75,
        },
        PerformanceTier::High => PerformanceProfile {
            target_fps: 60.0,
            group_counts: [700, 400, 200],
            update_fraction: 1.0,
        },
    }
}

/// Whole-field "breathing" drift parameters; quieter on low-end devices.
/// Returns (amplitude, speed).
pub const fn global_motion_for(tier: PerformanceTier) -> (f32, f32) {
    match tier {
        PerformanceTier::Low => (0.3, 0.0001),
        _ => (0.5, 0.0002),
    }
}

/// Symbolic sprite identifier; decouples presets from asset paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Glow,
    Orb,
    Spark,
}

impl TextureKey {
    pub const ALL: [TextureKey; 3] = [TextureKey::Glow, TextureKey::Orb, TextureKey::Spark];

    pub fn url(self) -> &'static str {
        match self {
            TextureKey::Glow => "textures/particle-glow.png",
            TextureKey::Orb => "textures/particle-orb.png",
            TextureKey::Spark => "textures/particle-spark.png",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextureKey::Glow => "glow",
            TextureKey::Orb => "orb",
            TextureKey::Spark => "spark",
        }
    }
}

/// Static configuration for one visual layer of the field.
#[derive(Clone, Copy, Debug)]
pub struct ParticleGroupPreset {
    pub range: f32,
    pub size: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
    pub rotation_speed: f32,
    pub wave_speed: f32,
    pub wave_amplitude: f32,
    pub pulse_frequency: f32,
    pub pulse_amplitude: f32,
    pub texture_key: TextureKey,
}

/// Three motif layers: small sparks up close, medium orbs, large glows far
/// out. Counts come from the performance profile, not from here.
pub const PARTICLE_GROUP_PRESETS: [ParticleGroupPreset; 3] = [
    ParticleGroupPreset {
        range: 4.0,
        size: 0.06,
        min_opacity: 0.3,
        max_opacity: 0.8,
        rotation_speed: 0.05,
        wave_speed: 0.4,
        wave_amplitude: 0.15,
        pulse_frequency: 0.5,
        pulse_amplitude: 0.15,
        texture_key: TextureKey::Spark,
    },
    ParticleGroupPreset {
        range: 5.0,
        size: 0.14,
        min_opacity: 0.25,
        max_opacity: 0.7,
        rotation_speed: 0.03,
        wave_speed: 0.3,
        wave_amplitude: 0.2,
        pulse_frequency: 0.35,
        pulse_amplitude: 0.2,
        texture_key: TextureKey::Orb,
    },
    ParticleGroupPreset {
        range: 6.0,
        size: 0.3,
        min_opacity: 0.15,
        max_opacity: 0.5,
        rotation_speed: 0.02,
        wave_speed: 0.2,
        wave_amplitude: 0.3,
        pulse_frequency: 0.25,
        pulse_amplitude: 0.25,
        texture_key: TextureKey::Glow,
    },
];

// Focal-point attraction
pub const FOCAL_RETARGET_SECS: f32 = 10.0;
pub const FOCAL_EASE_FRACTION: f32 = 0.01; // per-frame fraction toward target
pub const FOCAL_ATTRACT_COEFF: f32 = 0.03;
pub const FOCAL_DIST_FALLOFF: f32 = 0.1;
// Fraction of frames that advance the focal point on low-tier devices
pub const FOCAL_LOW_TIER_CHANCE: f32 = 0.05;

// Palette drift
pub const COLOR_SHIFT_UPDATE_INTERVAL: f32 = 0.5; // seconds between recomputes
pub const COLOR_SHIFT_SPEED_SCALE: f32 = 0.1;

// Per-instance sparkle recolor (throttled)
pub const SPARKLE_FRAME_CHANCE: f32 = 0.3;
pub const SPARKLE_STRIDE: usize = 10;

// Low-tier group-update shedding
pub const GROUP_SKIP_CHANCE_LOW: f32 = 0.3;

// Whole-field breathing phase spacing between instances
pub const GLOBAL_PHASE_SPACING: f32 = 0.01;

// Camera framing
pub const CAMERA_Z: f32 = 5.0;
pub const CAMERA_FOV_DEG: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

// Resize debounce window
pub const RESIZE_DEBOUNCE_MS: i32 = 200;
