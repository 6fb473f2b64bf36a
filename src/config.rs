// Host-supplied configuration: particle density, motion intensity and an
// optional partial color-transition override. Parsed from data attributes on
// the mount canvas; every field has a sensible default.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Density {
    Low,
    Normal,
    High,
}

impl Density {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("low") => Density::Low,
            Some("normal") => Density::Normal,
            Some("high") => Density::High,
            _ => Density::High,
        }
    }

    /// Scales the per-tier instance counts.
    pub fn multiplier(self) -> f32 {
        match self {
            Density::High => 1.5,
            Density::Normal => 1.0,
            Density::Low => 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionIntensity {
    Low,
    Normal,
    High,
}

/// Multipliers applied to the preset motion parameters at build time.
#[derive(Clone, Copy, Debug)]
pub struct MotionParams {
    pub wave: f32,
    pub rotation: f32,
    pub pulse: f32,
}

impl MotionIntensity {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("low") => MotionIntensity::Low,
            Some("normal") => MotionIntensity::Normal,
            Some("high") => MotionIntensity::High,
            _ => MotionIntensity::High,
        }
    }

    pub fn params(self) -> MotionParams {
        match self {
            MotionIntensity::High => MotionParams {
                wave: 1.5,
                rotation: 1.4,
                pulse: 1.3,
            },
            MotionIntensity::Normal => MotionParams {
                wave: 1.0,
                rotation: 1.0,
                pulse: 1.0,
            },
            MotionIntensity::Low => MotionParams {
                wave: 0.6,
                rotation: 0.7,
                pulse: 0.8,
            },
        }
    }
}

/// Slow hue-wheel palette drift configuration. `base_hue` and `hue_range` are
/// fractions of the hue wheel in `[0, 1]`.
#[derive(Clone, Copy, Debug)]
pub struct ColorTransition {
    pub base_hue: f32,
    pub hue_range: f32,
    pub transition_speed: f32,
    pub color_stops: usize,
}

impl Default for ColorTransition {
    fn default() -> Self {
        Self {
            base_hue: 0.55,
            hue_range: 0.25,
            transition_speed: 1.0,
            color_stops: 3,
        }
    }
}

impl ColorTransition {
    /// Merge a partial override over the defaults. Absent fields keep their
    /// default values; `color_stops` is clamped to at least 1.
    pub fn with_overrides(
        base_hue: Option<f32>,
        hue_range: Option<f32>,
        transition_speed: Option<f32>,
        color_stops: Option<usize>,
    ) -> Self {
        let d = Self::default();
        Self {
            base_hue: base_hue.unwrap_or(d.base_hue).rem_euclid(1.0),
            hue_range: hue_range.unwrap_or(d.hue_range).clamp(0.0, 1.0),
            transition_speed: transition_speed.unwrap_or(d.transition_speed).max(0.0),
            color_stops: color_stops.unwrap_or(d.color_stops).max(1),
        }
    }
}

/// Everything the controller needs from the host, resolved.
#[derive(Clone, Copy, Debug)]
pub struct FieldOptions {
    pub density: Density,
    pub motion: MotionIntensity,
    pub colors: ColorTransition,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            density: Density::High,
            motion: MotionIntensity::High,
            colors: ColorTransition::default(),
        }
    }
}
